//! Events emitted by the call-session controller
//!
//! The controller publishes every change on a broadcast channel. UIs usually
//! only need [`SessionEvent::StateChanged`] / [`SessionEvent::SessionUpdated`]
//! (or the latest snapshot from the watch channel); [`ResourceEvent`]s expose
//! the acquire/release order of the audio route and the timer.

use serde::{Deserialize, Serialize};

use crate::error::UserNotice;
use crate::session::{SessionSnapshot, SessionState};

/// Acquisition and release of controller-owned resources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceEvent {
    AudioRouteEnabled,
    AudioRouteDisabled,
    TimerStarted,
    TimerStopped,
}

/// Event published by the controller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionEvent {
    /// The session moved to a new state
    StateChanged {
        previous: SessionState,
        snapshot: SessionSnapshot,
    },
    /// Same state, new values (timer tick, toggle, dialer visibility)
    SessionUpdated(SessionSnapshot),
    /// Something the user has to be told about
    Notice(UserNotice),
    Resource(ResourceEvent),
}

impl SessionEvent {
    /// The snapshot carried by this event, if any
    pub fn snapshot(&self) -> Option<&SessionSnapshot> {
        match self {
            SessionEvent::StateChanged { snapshot, .. } => Some(snapshot),
            SessionEvent::SessionUpdated(snapshot) => Some(snapshot),
            _ => None,
        }
    }
}
