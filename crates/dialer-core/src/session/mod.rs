//! Call-session lifecycle
//!
//! The state machine that sequences permission, dialing, audio routing, the
//! call timer and teardown. [`CallSessionController`] is the public handle;
//! the state machine itself runs in a private task.

mod controller;
mod driver;
mod state;

pub use controller::{CallSessionController, PlatformServices};
pub use state::{format_duration, Screen, SessionId, SessionSnapshot, SessionState};
