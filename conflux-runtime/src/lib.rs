//! Process Supervisor, IIP Injector, and runtime lifecycle.

pub mod error;
pub mod iip;
pub mod lifecycle;
pub mod logsink;
pub mod supervisor;

pub use error::RuntimeError;
pub use lifecycle::{Runtime, RuntimeState};
pub use supervisor::Supervisor;
