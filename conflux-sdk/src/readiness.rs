//! Per-connection readiness (spec §4.9 "Per-connection readiness
//! (component-side)"): `Unbound -> Bound -> PeerPresent -> Closing`.
//!
//! Peer presence is observed via the messaging library's socket-monitor
//! events rather than polled; `monitor()` opens the inproc channel a
//! bound or connected socket reports its peer transitions on, and
//! `recv_event` reduces the raw ZMQ event codes down to the two that
//! matter here.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use crate::error::SdkError;

/// Conservative readiness timeout before a component gives up and exits
/// nonzero (spec §4.8 point 3).
pub const READINESS_TIMEOUT: Duration = Duration::from_secs(30);

// Raw ZMQ_EVENT_* codes (stable across zmq versions; passed straight
// through to the C API rather than via a crate-specific enum).
const EVENT_CONNECTED: u16 = 0x0001;
const EVENT_ACCEPTED: u16 = 0x0020;
const EVENT_CLOSED: u16 = 0x0080;
const EVENT_DISCONNECTED: u16 = 0x0200;
const EVENT_ALL: i32 = 0xFFFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerEvent {
    Connected,
    Disconnected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadinessState {
    Unbound,
    Bound,
    PeerPresent,
    Closing,
}

/// Tracks one port's peer-presence state machine.
pub struct PortReadiness {
    state: ReadinessState,
    peer_count: i64,
}

impl PortReadiness {
    pub fn new() -> Self {
        PortReadiness {
            state: ReadinessState::Unbound,
            peer_count: 0,
        }
    }

    pub fn state(&self) -> ReadinessState {
        self.state
    }

    /// Call once the socket has bound or connected.
    pub fn bound(&mut self) {
        if self.state == ReadinessState::Unbound {
            self.state = ReadinessState::Bound;
        }
    }

    pub fn apply(&mut self, event: PeerEvent) {
        match event {
            PeerEvent::Connected => {
                self.peer_count += 1;
                if self.state == ReadinessState::Bound {
                    self.state = ReadinessState::PeerPresent;
                }
            }
            PeerEvent::Disconnected => {
                self.peer_count = (self.peer_count - 1).max(0);
                if self.peer_count == 0 && self.state != ReadinessState::Unbound {
                    self.state = ReadinessState::Closing;
                }
            }
        }
    }

    pub fn is_ready(&self) -> bool {
        self.state == ReadinessState::PeerPresent
    }

    /// `true` once the last peer has gone: the component should exit
    /// (spec §4.8 point 6).
    pub fn should_exit(&self) -> bool {
        self.state == ReadinessState::Closing
    }
}

impl Default for PortReadiness {
    fn default() -> Self {
        PortReadiness::new()
    }
}

static NEXT_MONITOR_ID: AtomicUsize = AtomicUsize::new(0);

/// Attach a monitor channel to `target` and return the PAIR socket its
/// events arrive on.
pub fn monitor(context: &zmq::Context, target: &zmq::Socket, label: &str) -> Result<zmq::Socket, SdkError> {
    let id = NEXT_MONITOR_ID.fetch_add(1, Ordering::Relaxed);
    let addr = format!("inproc://conflux-monitor-{label}-{id}");
    target.monitor(&addr, EVENT_ALL).map_err(|source| SdkError::Zmq { port: label.to_string(), source })?;
    let pair = context.socket(zmq::PAIR).map_err(|source| SdkError::Zmq { port: label.to_string(), source })?;
    pair.connect(&addr).map_err(|source| SdkError::Zmq { port: label.to_string(), source })?;
    Ok(pair)
}

/// Reduce one raw monitor message down to the two events readiness
/// cares about; `Ok(None)` for an event we ignore (e.g. `LISTENING`).
pub fn recv_event(monitor: &zmq::Socket) -> Result<Option<PeerEvent>, SdkError> {
    let frames = monitor
        .recv_multipart(0)
        .map_err(|source| SdkError::Zmq { port: "monitor".to_string(), source })?;
    let Some(event_frame) = frames.first() else { return Ok(None) };
    if event_frame.len() < 2 {
        return Ok(None);
    }
    let code = u16::from_ne_bytes([event_frame[0], event_frame[1]]);
    Ok(match code {
        EVENT_CONNECTED | EVENT_ACCEPTED => Some(PeerEvent::Connected),
        EVENT_CLOSED | EVENT_DISCONNECTED => Some(PeerEvent::Disconnected),
        _ => None,
    })
}

/// Block on `monitor` until readiness is reached or `READINESS_TIMEOUT`
/// elapses.
pub fn wait_for_peer(monitor: &zmq::Socket, readiness: &mut PortReadiness) -> Result<(), SdkError> {
    readiness.bound();
    let deadline = Instant::now() + READINESS_TIMEOUT;
    monitor
        .set_rcvtimeo(200)
        .map_err(|source| SdkError::Zmq { port: "monitor".to_string(), source })?;
    while !readiness.is_ready() {
        if Instant::now() >= deadline {
            return Err(SdkError::ReadinessTimeout(READINESS_TIMEOUT));
        }
        match recv_event(monitor) {
            Ok(Some(event)) => readiness.apply(event),
            Ok(None) => {}
            Err(SdkError::Zmq { source, .. }) if source == zmq::Error::EAGAIN => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unbound_to_bound_to_peer_present() {
        let mut r = PortReadiness::new();
        assert_eq!(r.state(), ReadinessState::Unbound);
        r.bound();
        assert_eq!(r.state(), ReadinessState::Bound);
        assert!(!r.is_ready());
        r.apply(PeerEvent::Connected);
        assert_eq!(r.state(), ReadinessState::PeerPresent);
        assert!(r.is_ready());
    }

    #[test]
    fn peer_count_returning_to_zero_transitions_to_closing() {
        let mut r = PortReadiness::new();
        r.bound();
        r.apply(PeerEvent::Connected);
        r.apply(PeerEvent::Connected);
        r.apply(PeerEvent::Disconnected);
        assert!(r.is_ready(), "one peer remains");
        r.apply(PeerEvent::Disconnected);
        assert!(r.should_exit());
        assert_eq!(r.state(), ReadinessState::Closing);
    }

    #[test]
    fn disconnect_count_never_goes_negative() {
        let mut r = PortReadiness::new();
        r.bound();
        r.apply(PeerEvent::Disconnected);
        r.apply(PeerEvent::Disconnected);
        assert_eq!(r.peer_count, 0);
    }
}
