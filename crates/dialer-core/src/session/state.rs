//! Session data model
//!
//! [`CallSession`] is the controller's private record of the current call;
//! [`SessionSnapshot`] is the read-only copy handed to the presentation layer.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier of one call session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of a call session
///
/// ```text
/// Idle ──start_call──► AwaitingPermission ──granted──► Dialing ──ack──► InCall
///  ▲                         │ denied                    │               │ end_call
///  │◄────────────────────────┘                           │               ▼
///  │◄──────────────── end_call (best effort) ────────────┘             Ended
///  └─────────────────────────── automatic ◄──────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SessionState {
    #[default]
    Idle,
    AwaitingPermission,
    Dialing,
    InCall,
    Ended,
}

impl SessionState {
    /// Whether a session currently occupies the controller
    pub fn is_active(&self) -> bool {
        !matches!(self, SessionState::Idle)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Idle => "idle",
            SessionState::AwaitingPermission => "awaiting-permission",
            SessionState::Dialing => "dialing",
            SessionState::InCall => "in-call",
            SessionState::Ended => "ended",
        };
        f.write_str(name)
    }
}

/// Which screen the presentation layer should show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Screen {
    /// Entry screen with the dial shortcuts and the call-log link
    Home,
    /// Number entry
    Dialpad,
    /// Active call with timer and audio controls
    CallWindow,
}

impl Screen {
    /// Derive the visible screen from the session state and the dialer flag
    ///
    /// A call being placed or connected always wins over the dialer flag.
    pub fn select(state: SessionState, dialer_visible: bool) -> Self {
        match state {
            SessionState::Dialing | SessionState::InCall => Screen::CallWindow,
            _ if dialer_visible => Screen::Dialpad,
            _ => Screen::Home,
        }
    }
}

/// Format a duration as `M:SS`
pub fn format_duration(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// The controller's record of the current call
#[derive(Debug, Clone)]
pub(crate) struct CallSession {
    pub id: SessionId,
    pub dialed_number: String,
    pub state: SessionState,
    pub started_at: Option<DateTime<Utc>>,
    pub elapsed_seconds: u64,
    pub muted: bool,
    pub speaker_on: bool,
}

impl CallSession {
    pub fn idle() -> Self {
        Self {
            id: SessionId::new(),
            dialed_number: String::new(),
            state: SessionState::Idle,
            started_at: None,
            elapsed_seconds: 0,
            muted: false,
            speaker_on: false,
        }
    }

    pub fn snapshot(&self, dialer_visible: bool) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.id,
            state: self.state,
            dialed_number: self.dialed_number.clone(),
            elapsed_seconds: self.elapsed_seconds,
            muted: self.muted,
            speaker_on: self.speaker_on,
            started_at: self.started_at,
            dialer_visible,
            screen: Screen::select(self.state, dialer_visible),
        }
    }
}

/// What the presentation layer renders
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub session_id: SessionId,
    pub state: SessionState,
    pub dialed_number: String,
    pub elapsed_seconds: u64,
    pub muted: bool,
    pub speaker_on: bool,
    pub started_at: Option<DateTime<Utc>>,
    pub dialer_visible: bool,
    pub screen: Screen,
}

impl SessionSnapshot {
    /// Elapsed call time as `M:SS`
    pub fn formatted_duration(&self) -> String {
        format_duration(self.elapsed_seconds)
    }

    /// Label for the mute button
    pub fn mute_label(&self) -> &'static str {
        if self.muted {
            "Unmute"
        } else {
            "Mute"
        }
    }

    /// Label for the speaker button
    pub fn speaker_label(&self) -> &'static str {
        if self.speaker_on {
            "Speaker Off"
        } else {
            "Speaker On"
        }
    }

    /// Header line of the call window
    pub fn caller_line(&self) -> String {
        format!("Calling {}", self.dialed_number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "0:00");
        assert_eq!(format_duration(9), "0:09");
        assert_eq!(format_duration(65), "1:05");
        assert_eq!(format_duration(600), "10:00");
    }

    #[test]
    fn test_screen_selection() {
        assert_eq!(Screen::select(SessionState::Idle, false), Screen::Home);
        assert_eq!(Screen::select(SessionState::Idle, true), Screen::Dialpad);
        assert_eq!(Screen::select(SessionState::AwaitingPermission, true), Screen::Dialpad);
        assert_eq!(Screen::select(SessionState::Dialing, false), Screen::CallWindow);
        assert_eq!(Screen::select(SessionState::InCall, true), Screen::CallWindow);
    }

    #[test]
    fn test_labels_follow_toggles() {
        let mut session = CallSession::idle();
        session.dialed_number = "9119515866".to_string();
        let snapshot = session.snapshot(true);
        assert_eq!(snapshot.mute_label(), "Mute");
        assert_eq!(snapshot.speaker_label(), "Speaker On");
        assert_eq!(snapshot.caller_line(), "Calling 9119515866");

        session.muted = true;
        session.speaker_on = true;
        let snapshot = session.snapshot(true);
        assert_eq!(snapshot.mute_label(), "Unmute");
        assert_eq!(snapshot.speaker_label(), "Speaker Off");
    }

    #[test]
    fn test_fresh_sessions_get_new_ids() {
        assert_ne!(CallSession::idle().id, CallSession::idle().id);
    }
}
