//! Call session controller handle
//!
//! [`CallSessionController`] is the front-end's handle on the call-session
//! state machine. Each method sends a command to the controller task and
//! waits for its answer; state flows back only through snapshots and events.
//!
//! # Usage Examples
//!
//! ```rust,no_run
//! use dialer_core::{CallSessionController, DialerConfig, PlatformServices, SessionState};
//! use dialer_core::sim::SimulatedPlatform;
//!
//! async fn place_call() -> Result<(), Box<dyn std::error::Error>> {
//!     let platform = SimulatedPlatform::new();
//!     let controller = CallSessionController::new(
//!         DialerConfig::default(),
//!         PlatformServices::from_platform(platform),
//!     )?;
//!
//!     controller.start_call("+91 9119515866").await?;
//!
//!     let mut snapshots = controller.watch();
//!     snapshots.wait_for(|s| s.state == SessionState::InCall).await?;
//!
//!     controller.toggle_speaker().await;
//!     controller.end_call().await;
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tracing::debug;

use crate::audio::AudioRouteController;
use crate::config::DialerConfig;
use crate::error::{DialerError, DialerResult};
use crate::events::SessionEvent;
use crate::permission::PermissionGate;
use crate::platform::{AudioSessionService, DialService, PermissionKind, PermissionService};
use crate::timer::CallTimer;

use super::driver::{Command, SessionDriver};
use super::state::{CallSession, SessionId, SessionSnapshot};

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// The platform services the controller depends on
#[derive(Clone)]
pub struct PlatformServices {
    pub permission: Arc<dyn PermissionService>,
    pub dial: Arc<dyn DialService>,
    pub audio: Arc<dyn AudioSessionService>,
}

impl PlatformServices {
    /// Use one object for all three services
    pub fn from_platform<P>(platform: Arc<P>) -> Self
    where
        P: PermissionService + DialService + AudioSessionService + 'static,
    {
        Self {
            permission: platform.clone(),
            dial: platform.clone(),
            audio: platform,
        }
    }
}

/// Handle on a running call-session controller
///
/// Cloning is cheap. When the last clone is dropped the controller task
/// ends any live session (same teardown as [`end_call`](Self::end_call)) and
/// exits.
#[derive(Clone)]
pub struct CallSessionController {
    command_tx: mpsc::UnboundedSender<Command>,
    event_tx: broadcast::Sender<SessionEvent>,
    snapshot_rx: watch::Receiver<SessionSnapshot>,
}

impl CallSessionController {
    /// Validate `config` and spawn the controller task
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(config: DialerConfig, services: PlatformServices) -> DialerResult<Self> {
        config.validate()?;

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();
        let (tick_tx, tick_rx) = mpsc::unbounded_channel();
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        let permission = Arc::new(PermissionGate::new(
            services.permission,
            PermissionKind::CallPhone,
            config.call_permission.clone(),
        ));
        let audio = AudioRouteController::new(services.audio, config.audio_mode);
        let timer = CallTimer::new(config.tick_interval(), tick_tx);

        let session = CallSession::idle();
        let (snapshot_tx, snapshot_rx) = watch::channel(session.snapshot(false));

        let driver = SessionDriver::new(
            session,
            config.use_system_ui,
            permission,
            services.dial,
            audio,
            timer,
            completion_tx,
            event_tx.clone(),
            snapshot_tx,
        );

        tokio::spawn(driver.run(command_rx, completion_rx, tick_rx));

        Ok(Self {
            command_tx,
            event_tx,
            snapshot_rx,
        })
    }

    /// Begin a call to `number`
    ///
    /// Returns once the permission prompt has been requested; the rest of the
    /// call setup is reported through events.
    ///
    /// # Errors
    ///
    /// * `DialerError::MissingNumber` - `number` is empty (a notice is also emitted)
    /// * `DialerError::CallInProgress` - a session is already active
    pub async fn start_call(&self, number: impl Into<String>) -> DialerResult<SessionId> {
        let number = number.into();
        self.request(|reply| Command::StartCall { number, reply })
            .await?
    }

    /// Hang up; a no-op when no session is active
    pub async fn end_call(&self) {
        if self.request(|reply| Command::EndCall { reply }).await.is_err() {
            debug!("end_call after controller shutdown");
        }
    }

    /// Flip the microphone mute
    ///
    /// Returns the new mute state, or `None` if no call is connected.
    pub async fn toggle_mute(&self) -> Option<bool> {
        self.request(|reply| Command::ToggleMute { reply })
            .await
            .ok()
            .flatten()
    }

    /// Flip the speakerphone
    ///
    /// Returns the new speaker state, or `None` if no call is connected.
    pub async fn toggle_speaker(&self) -> Option<bool> {
        self.request(|reply| Command::ToggleSpeaker { reply })
            .await
            .ok()
            .flatten()
    }

    /// Show the dial pad
    pub async fn open_dialer(&self) -> DialerResult<()> {
        self.request(|reply| Command::SetDialerVisible { visible: true, reply })
            .await
    }

    /// Go back to the home screen
    pub async fn close_dialer(&self) -> DialerResult<()> {
        self.request(|reply| Command::SetDialerVisible { visible: false, reply })
            .await
    }

    /// Tear down any live session and stop the controller task
    pub async fn shutdown(&self) {
        if self.request(|reply| Command::Shutdown { reply }).await.is_err() {
            debug!("Controller already stopped");
        }
    }

    /// Latest published state
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    /// Receiver that always holds the latest snapshot
    pub fn watch(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot_rx.clone()
    }

    /// Every event published from now on
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.event_tx.subscribe()
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> DialerResult<T> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.command_tx
            .send(command(reply_tx))
            .map_err(|_| DialerError::ControllerClosed)?;
        reply_rx.await.map_err(|_| DialerError::ControllerClosed)
    }
}
