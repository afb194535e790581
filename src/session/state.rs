//! Capture session phases and their transition table

use crate::errors::ErrorKind;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    Idle,
    /// Device open requested, waiting for the device callback
    Opening,
    /// Device open, capture session being built or stalled on its request
    Configuring,
    /// Repeating request accepted, frames flowing
    Previewing,
    /// Device lost or session could not be configured; only `stop` leaves it
    Faulted(ErrorKind),
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionPhase::Idle => write!(f, "idle"),
            SessionPhase::Opening => write!(f, "opening"),
            SessionPhase::Configuring => write!(f, "configuring"),
            SessionPhase::Previewing => write!(f, "previewing"),
            SessionPhase::Faulted(kind) => write!(f, "faulted({})", kind),
        }
    }
}

/// Everything that can move a session between phases
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    Start,
    DeviceOpened,
    DeviceDisconnected,
    DeviceError,
    SessionConfigured,
    SessionConfigureFailed,
    RepeatingRequestSubmitted,
    RepeatingRequestFailed,
    Stop,
}

/// Phase after `event`, or `None` when the event does not apply to `phase`
/// and must be ignored.
pub fn next_phase(phase: SessionPhase, event: SessionEvent) -> Option<SessionPhase> {
    use SessionEvent as E;
    use SessionPhase as P;

    match (phase, event) {
        (_, E::Stop) => Some(P::Idle),
        (P::Idle, E::Start) => Some(P::Opening),
        (P::Opening, E::DeviceOpened) => Some(P::Configuring),
        (P::Opening | P::Configuring | P::Previewing, E::DeviceDisconnected | E::DeviceError) => {
            Some(P::Faulted(ErrorKind::Device))
        }
        (P::Configuring, E::SessionConfigured) => Some(P::Configuring),
        (P::Configuring, E::SessionConfigureFailed) => Some(P::Faulted(ErrorKind::Session)),
        (P::Configuring, E::RepeatingRequestSubmitted) => Some(P::Previewing),
        // A rejected request leaves the session stalled until stop.
        (P::Configuring, E::RepeatingRequestFailed) => Some(P::Configuring),
        _ => None,
    }
}
