use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("component {0:?} referenced by process {1:?} is not in the library")]
    UnknownComponent(String, String),
    #[error("failed to spawn process {process:?} ({executable}): {source}")]
    Spawn {
        process: String,
        executable: String,
        #[source]
        source: std::io::Error,
    },
}
