use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("malformed --port.{name} argument {value:?}: {reason}")]
    MalformedPortArg { name: String, value: String, reason: String },

    #[error("required port {0:?} not declared on the command line")]
    MissingPort(String),

    #[error("zmq error on port {port}: {source}")]
    Zmq { port: String, source: zmq::Error },

    #[error("readiness timed out after {0:?} waiting for a peer")]
    ReadinessTimeout(std::time::Duration),

    #[error(transparent)]
    Ip(#[from] conflux_ip::IpError),
}
