//! Error types for the dialer core
//!
//! Platform adapters report failures as [`PlatformError`]. The controller never
//! lets those escape raw: every failure is folded into a [`DialerError`], and
//! the user-visible ones carry a [`UserNotice`] for the presentation layer.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::platform::PermissionKind;
use crate::session::SessionState;

/// Result type for dialer operations
pub type DialerResult<T> = Result<T, DialerError>;

/// Result type returned by platform adapters
pub type PlatformResult<T> = Result<T, PlatformError>;

/// Failure reported by a platform service adapter
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{service} service failed during {operation}: {reason}")]
pub struct PlatformError {
    /// Which platform service failed ("dial", "audio", "permission", "call-log")
    pub service: String,
    /// The operation that was being performed
    pub operation: String,
    /// Adapter-provided description
    pub reason: String,
}

impl PlatformError {
    /// Create a new platform error
    pub fn new(
        service: impl Into<String>,
        operation: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            service: service.into(),
            operation: operation.into(),
            reason: reason.into(),
        }
    }
}

/// Errors surfaced by the dialer core
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DialerError {
    /// No number was supplied to `start_call`
    #[error("Missing phone number")]
    MissingNumber,

    /// A call session is already active
    #[error("Call already in progress (state: {state})")]
    CallInProgress { state: SessionState },

    /// The user (or the platform) refused a permission
    #[error("Permission denied: {kind}")]
    PermissionDenied { kind: PermissionKind },

    /// A platform service failed; the session has been torn down
    #[error("Platform failure: {0}")]
    Platform(#[from] PlatformError),

    /// Configuration error
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// The controller task is no longer running
    #[error("Call session controller has shut down")]
    ControllerClosed,
}

/// Coarse classification of a [`DialerError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Bad user input, nothing changed
    Input,
    /// Permission was not granted
    PermissionDenied,
    /// A platform service failed
    Platform,
    /// The operation was redundant for the current state
    Redundant,
    /// The controller is gone
    Closed,
}

impl DialerError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an already-in-progress error for the given state
    pub fn in_progress(state: SessionState) -> Self {
        Self::CallInProgress { state }
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            DialerError::MissingNumber | DialerError::Configuration { .. } => ErrorKind::Input,
            DialerError::CallInProgress { .. } => ErrorKind::Redundant,
            DialerError::PermissionDenied { .. } => ErrorKind::PermissionDenied,
            DialerError::Platform(_) => ErrorKind::Platform,
            DialerError::ControllerClosed => ErrorKind::Closed,
        }
    }

    /// The notice shown to the user for this error, if it is user-visible
    ///
    /// Only input errors and permission denials reach the user; everything
    /// else is logged.
    pub fn user_notice(&self) -> Option<UserNotice> {
        match self {
            DialerError::MissingNumber => Some(UserNotice::missing_number()),
            DialerError::PermissionDenied { kind } => Some(UserNotice::permission_denied(*kind)),
            _ => None,
        }
    }
}

/// A single user-visible notice (an alert with a title and a message)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserNotice {
    pub title: String,
    pub message: String,
}

impl UserNotice {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
        }
    }

    /// Shown when dialing with an empty number
    pub fn missing_number() -> Self {
        Self::new(
            "Enter a phone number",
            "Please enter a phone number before dialing.",
        )
    }

    /// Shown when a permission request resolves as anything but granted
    pub fn permission_denied(kind: PermissionKind) -> Self {
        match kind {
            PermissionKind::CallPhone => Self::new(
                "Permission Denied",
                "Phone call permission is required to make calls.",
            ),
            PermissionKind::ReadCallLog => Self::new(
                "Permission Denied",
                "You need to grant call log permission to view logs.",
            ),
        }
    }
}

impl std::fmt::Display for UserNotice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.title, self.message)
    }
}
