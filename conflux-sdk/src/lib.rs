//! Helpers for writing component executables that honor the Conflux
//! SDK contract (spec §4.8): CLI flag parsing, bind/connect socket
//! roles, per-connection readiness, the configuration-port sequence,
//! and signal-driven drain.

pub mod cli;
pub mod error;
pub mod ports;
pub mod readiness;
pub mod shutdown;

pub use cli::ComponentArgs;
pub use error::SdkError;
pub use ports::PortSocket;
pub use readiness::{PeerEvent, PortReadiness, ReadinessState};
