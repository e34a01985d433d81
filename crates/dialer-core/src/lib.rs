//! # Dialer Core
//!
//! Call-session lifecycle control for a phone dialer front-end.
//!
//! The dialer itself is a thin layer over platform services: a permission
//! prompt, a dial intent, an in-call audio manager and the call history. What
//! this crate owns is the ordering between them:
//!
//! ```text
//! start_call ─► permission ─► dial ─► audio route on ─► timer ─► (mute / speaker)
//!                                                                   │
//! end_call ─────────────────────────► timer stop ─► audio route off ◄┘
//! ```
//!
//! - [`CallSessionController`] - the state machine, driven through an async handle
//! - [`PermissionGate`](permission::PermissionGate) - per-attempt permission prompts
//! - [`AudioRouteController`](audio::AudioRouteController) - idempotent audio session + wake-lock
//! - [`CallTimer`](timer::CallTimer) - start/stop tick source
//! - [`DialpadInputModel`] - the number being composed
//! - [`CallLogViewer`] - permission-gated call history
//!
//! Platform access goes through the traits in [`platform`]; [`sim`] provides
//! an in-memory implementation for tests and demos.

pub mod audio;
pub mod call_log;
pub mod config;
pub mod dialpad;
pub mod error;
pub mod events;
pub mod permission;
pub mod platform;
pub mod session;
pub mod sim;
pub mod timer;

pub use call_log::{CallLogEntry, CallLogViewer, CallType};
pub use config::{DialerConfig, PermissionRationale};
pub use dialpad::DialpadInputModel;
pub use error::{DialerError, DialerResult, ErrorKind, PlatformError, UserNotice};
pub use events::{ResourceEvent, SessionEvent};
pub use platform::{AudioMode, PermissionDecision, PermissionKind};
pub use session::{
    format_duration, CallSessionController, PlatformServices, Screen, SessionId, SessionSnapshot,
    SessionState,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
