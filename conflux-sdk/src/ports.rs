//! Socket role helpers (spec §4.8 point 2): inbound data ports bind
//! (they are servers), outbound data ports connect (they are clients).
//! An array port becomes one socket per comma-separated address rather
//! than one socket fanning out, since each index is an independently
//! wired endpoint (spec §4.5's array-port compaction is a CLI-argument
//! concern, not a socket-sharing one).

use crate::error::SdkError;

/// One bound or connected socket for a single logical port index, paired
/// with the address it was given (used to label its monitor channel).
pub struct PortSocket {
    pub address: String,
    pub socket: zmq::Socket,
}

/// Bind a PULL socket for a scalar inbound port.
pub fn bind_inport(context: &zmq::Context, name: &str, address: &str) -> Result<PortSocket, SdkError> {
    let socket = context.socket(zmq::PULL).map_err(|source| SdkError::Zmq { port: name.to_string(), source })?;
    socket.bind(address).map_err(|source| SdkError::Zmq { port: name.to_string(), source })?;
    Ok(PortSocket { address: address.to_string(), socket })
}

/// Connect a PUSH socket for a scalar outbound port.
pub fn connect_outport(context: &zmq::Context, name: &str, address: &str) -> Result<PortSocket, SdkError> {
    let socket = context.socket(zmq::PUSH).map_err(|source| SdkError::Zmq { port: name.to_string(), source })?;
    socket.connect(address).map_err(|source| SdkError::Zmq { port: name.to_string(), source })?;
    Ok(PortSocket { address: address.to_string(), socket })
}

/// Bind one PULL socket per address for an array inbound port, in index order.
pub fn bind_array_inport(context: &zmq::Context, name: &str, addresses: &[String]) -> Result<Vec<PortSocket>, SdkError> {
    addresses.iter().map(|address| bind_inport(context, name, address)).collect()
}

/// Connect one PUSH socket per address for an array outbound port, in index order.
pub fn connect_array_outport(context: &zmq::Context, name: &str, addresses: &[String]) -> Result<Vec<PortSocket>, SdkError> {
    addresses.iter().map(|address| connect_outport(context, name, address)).collect()
}

/// Send one data IP on an outbound port.
pub fn send_packet(port: &PortSocket, payload: impl Into<Vec<u8>>) -> Result<(), SdkError> {
    let ip = conflux_ip::Ip::new_packet(payload);
    let [tag, data] = ip.to_frames();
    port.socket
        .send_multipart([tag, data], 0)
        .map_err(|source| SdkError::Zmq { port: port.address.clone(), source })
}

/// Receive one IP on an inbound port, blocking. Frames that fail to
/// decode as a valid IP are not surfaced here; callers should drop them
/// and keep receiving per the main-loop contract (spec §4.8 point 5).
pub fn recv_ip(port: &PortSocket) -> Result<Option<conflux_ip::Ip>, SdkError> {
    let frames = port
        .socket
        .recv_multipart(0)
        .map_err(|source| SdkError::Zmq { port: port.address.clone(), source })?;
    Ok(conflux_ip::Ip::from_frames(&frames).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_then_connect_then_roundtrip_a_packet() {
        let context = zmq::Context::new();
        let inbound = bind_inport(&context, "in", "tcp://127.0.0.1:0").unwrap();
        // zmq chooses an ephemeral port when bound to :0; query it back.
        let endpoint: String = inbound.socket.get_last_endpoint().unwrap().unwrap();

        let outbound = connect_outport(&context, "out", &endpoint).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(50));

        send_packet(&outbound, b"hello".to_vec()).unwrap();
        let received = recv_ip(&inbound).unwrap().expect("valid ip");
        assert_eq!(received.payload(), b"hello");
    }
}
