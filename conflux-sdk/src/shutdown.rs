//! Signal handling and the configuration-port sequence (spec §4.8
//! points 4 and 7). Component main loops are plain blocking zmq loops,
//! so interrupt handling runs on a background thread with its own
//! tiny runtime and flips a flag the main loop polls between receives,
//! rather than requiring the whole component to be async.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::error::SdkError;
use crate::ports::PortSocket;

/// Time given to in-flight sends to complete after a signal is observed
/// (spec §4.8 point 7, "short drain").
pub const DRAIN_PERIOD: Duration = Duration::from_millis(200);

/// Spawn a background watcher for SIGINT/SIGTERM. The returned flag
/// flips to `true` `DRAIN_PERIOD` after the signal arrives; a main loop
/// should check it between receives and exit zero once set.
pub fn spawn_shutdown_watcher() -> Arc<AtomicBool> {
    let flag = Arc::new(AtomicBool::new(false));
    let watched = Arc::clone(&flag);
    std::thread::spawn(move || {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("failed to start signal-watcher runtime");
        runtime.block_on(async move {
            wait_for_interrupt().await;
            tokio::time::sleep(DRAIN_PERIOD).await;
            watched.store(true, Ordering::SeqCst);
        });
    });
    flag
}

pub fn should_shut_down(flag: &AtomicBool) -> bool {
    flag.load(Ordering::SeqCst)
}

#[cfg(unix)]
async fn wait_for_interrupt() {
    use tokio::signal::unix::{signal, SignalKind};
    let mut sigterm = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
    let mut sigint = signal(SignalKind::interrupt()).expect("failed to install SIGINT handler");
    tokio::select! {
        _ = sigterm.recv() => {}
        _ = sigint.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_interrupt() {
    let _ = tokio::signal::ctrl_c().await;
}

/// Read exactly one IP from a configuration port, then close it (spec
/// §4.8 point 4). Returns `None` if the port closed before delivering
/// anything, which a caller may treat as "use the default".
pub fn read_config_once(port: PortSocket) -> Result<Option<Vec<u8>>, SdkError> {
    let frames = port
        .socket
        .recv_multipart(0)
        .map_err(|source| SdkError::Zmq { port: port.address.clone(), source })?;
    let ip = conflux_ip::Ip::from_frames(&frames)?;
    // `port` (and its socket) is dropped here, closing the configuration
    // connection before steady state begins.
    Ok(if ip.is_packet() { Some(ip.into_payload()) } else { None })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shutdown_flag_starts_false() {
        let flag = Arc::new(AtomicBool::new(false));
        assert!(!should_shut_down(&flag));
        flag.store(true, Ordering::SeqCst);
        assert!(should_shut_down(&flag));
    }
}
