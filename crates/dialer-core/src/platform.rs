//! Platform service contracts
//!
//! The controller never talks to the operating system directly. Everything it
//! needs from the device goes through the four traits below, which thin
//! adapters implement on top of the real permission prompt, dial intent,
//! in-call audio manager and call-log provider. Tests and the CLI use the
//! scripted implementations in [`crate::sim`].
//!
//! ```text
//! ┌──────────────────────────┐
//! │  CallSessionController   │
//! └──┬─────────┬─────────┬───┘
//!    │         │         │
//! ┌──▼───┐ ┌───▼──┐ ┌────▼─────┐   ┌──────────┐
//! │Permis│ │ Dial │ │  Audio   │   │ Call log │ ◄── CallLogViewer only
//! │ sion │ │      │ │ session  │   │          │
//! └──────┘ └──────┘ └──────────┘   └──────────┘
//! ```

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::call_log::CallLogEntry;
use crate::config::PermissionRationale;
use crate::error::PlatformResult;

/// Permissions the dialer asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionKind {
    /// Place phone calls directly
    CallPhone,
    /// Read the device call history
    ReadCallLog,
}

impl fmt::Display for PermissionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PermissionKind::CallPhone => write!(f, "call-phone"),
            PermissionKind::ReadCallLog => write!(f, "read-call-log"),
        }
    }
}

/// Outcome of a permission prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PermissionDecision {
    Granted,
    Denied,
    /// Nothing decided yet, or the user postponed ("Ask Me Later")
    #[default]
    Unknown,
}

impl PermissionDecision {
    pub fn is_granted(&self) -> bool {
        matches!(self, PermissionDecision::Granted)
    }
}

/// Media mode requested when the in-call audio session starts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AudioMode {
    #[default]
    Audio,
    Video,
}

/// Acknowledgement returned once the platform accepted a dial request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialAck {
    /// Number as handed to the platform
    pub number: String,
    /// Whether the platform's own call UI was shown
    pub used_system_ui: bool,
}

/// Runtime permission prompts
#[async_trait]
pub trait PermissionService: Send + Sync {
    /// Ask for `kind`, showing `rationale` if the platform prompts the user
    ///
    /// Suspends until the user answers the dialog (or the platform answers
    /// from its own cache).
    async fn request(
        &self,
        kind: PermissionKind,
        rationale: &PermissionRationale,
    ) -> PlatformResult<PermissionDecision>;
}

/// Outgoing call placement
#[async_trait]
pub trait DialService: Send + Sync {
    /// Hand `number` to the telephony stack
    ///
    /// `use_system_ui` selects between a direct call and opening the
    /// platform's native call screen.
    async fn place_call(&self, number: &str, use_system_ui: bool) -> PlatformResult<DialAck>;
}

/// In-call audio session
#[async_trait]
pub trait AudioSessionService: Send + Sync {
    async fn enable(&self, mode: AudioMode) -> PlatformResult<()>;
    async fn disable(&self) -> PlatformResult<()>;
    async fn set_mic_muted(&self, muted: bool) -> PlatformResult<()>;
    async fn set_speaker(&self, on: bool) -> PlatformResult<()>;
    async fn set_keep_screen_on(&self, on: bool) -> PlatformResult<()>;
}

/// Device call history
#[async_trait]
pub trait CallLogService: Send + Sync {
    /// Load at most `limit` recent calls, newest first
    async fn load_recent_calls(&self, limit: usize) -> PlatformResult<Vec<CallLogEntry>>;
}
