//! The controller task
//!
//! One `SessionDriver` runs per controller. It owns the session, the audio
//! route and the timer, and handles exactly one input at a time: a command
//! from a [`CallSessionController`](super::CallSessionController) handle, a
//! completed permission prompt or dial request, or a timer tick. Permission
//! prompts and dial requests run in their own tasks and report back through
//! the completion channel, tagged with the session they belong to, so a
//! result that arrives after the session ended is dropped.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tracing::{debug, error, info, warn};

use crate::audio::AudioRouteController;
use crate::error::{DialerError, DialerResult, PlatformError, PlatformResult, UserNotice};
use crate::events::{ResourceEvent, SessionEvent};
use crate::permission::PermissionGate;
use crate::platform::{DialAck, DialService, PermissionDecision, PermissionKind};
use crate::timer::{CallTimer, TimerTick};

use super::state::{CallSession, SessionId, SessionSnapshot, SessionState};

/// Requests sent by controller handles
pub(crate) enum Command {
    StartCall {
        number: String,
        reply: oneshot::Sender<DialerResult<SessionId>>,
    },
    EndCall {
        reply: oneshot::Sender<()>,
    },
    ToggleMute {
        reply: oneshot::Sender<Option<bool>>,
    },
    ToggleSpeaker {
        reply: oneshot::Sender<Option<bool>>,
    },
    SetDialerVisible {
        visible: bool,
        reply: oneshot::Sender<()>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

/// Results of work the driver handed off to other tasks
pub(crate) enum Completion {
    Permission {
        session: SessionId,
        decision: PermissionDecision,
    },
    Dial {
        session: SessionId,
        result: PlatformResult<DialAck>,
    },
}

/// Which audio toggle a command refers to
#[derive(Debug, Clone, Copy)]
enum AudioToggle {
    Mute,
    Speaker,
}

pub(crate) struct SessionDriver {
    session: CallSession,
    dialer_visible: bool,
    use_system_ui: bool,
    permission: Arc<PermissionGate>,
    dial: Arc<dyn DialService>,
    audio: AudioRouteController,
    timer: CallTimer,
    completion_tx: mpsc::UnboundedSender<Completion>,
    event_tx: broadcast::Sender<SessionEvent>,
    snapshot_tx: watch::Sender<SessionSnapshot>,
}

impl SessionDriver {
    pub(crate) fn new(
        session: CallSession,
        use_system_ui: bool,
        permission: Arc<PermissionGate>,
        dial: Arc<dyn DialService>,
        audio: AudioRouteController,
        timer: CallTimer,
        completion_tx: mpsc::UnboundedSender<Completion>,
        event_tx: broadcast::Sender<SessionEvent>,
        snapshot_tx: watch::Sender<SessionSnapshot>,
    ) -> Self {
        Self {
            session,
            dialer_visible: false,
            use_system_ui,
            permission,
            dial,
            audio,
            timer,
            completion_tx,
            event_tx,
            snapshot_tx,
        }
    }

    pub(crate) fn snapshot(&self) -> SessionSnapshot {
        self.session.snapshot(self.dialer_visible)
    }

    /// Process inputs until shutdown or until every handle is gone
    ///
    /// Both exits go through `end_call`, so a session that is still live
    /// when the front-end disappears releases its audio route and timer.
    pub(crate) async fn run(
        mut self,
        mut command_rx: mpsc::UnboundedReceiver<Command>,
        mut completion_rx: mpsc::UnboundedReceiver<Completion>,
        mut tick_rx: mpsc::UnboundedReceiver<TimerTick>,
    ) {
        info!("Call session controller started");
        loop {
            tokio::select! {
                command = command_rx.recv() => match command {
                    Some(command) => {
                        if !self.handle_command(command).await {
                            break;
                        }
                    }
                    None => {
                        info!("All controller handles dropped, tearing down session");
                        self.end_call().await;
                        break;
                    }
                },
                Some(completion) = completion_rx.recv() => self.handle_completion(completion).await,
                Some(tick) = tick_rx.recv() => self.handle_tick(tick),
            }
        }
        info!("Call session controller stopped");
    }

    /// Returns false once the driver should stop
    async fn handle_command(&mut self, command: Command) -> bool {
        match command {
            Command::StartCall { number, reply } => {
                let _ = reply.send(self.start_call(number));
            }
            Command::EndCall { reply } => {
                self.end_call().await;
                let _ = reply.send(());
            }
            Command::ToggleMute { reply } => {
                let _ = reply.send(self.toggle(AudioToggle::Mute).await);
            }
            Command::ToggleSpeaker { reply } => {
                let _ = reply.send(self.toggle(AudioToggle::Speaker).await);
            }
            Command::SetDialerVisible { visible, reply } => {
                if self.dialer_visible != visible {
                    self.dialer_visible = visible;
                    debug!("Dialer visible: {}", visible);
                    self.publish_update();
                }
                let _ = reply.send(());
            }
            Command::Shutdown { reply } => {
                info!("Call session controller shutting down");
                self.end_call().await;
                let _ = reply.send(());
                return false;
            }
        }
        true
    }

    // ===== Call setup =====

    fn start_call(&mut self, number: String) -> DialerResult<SessionId> {
        if number.trim().is_empty() {
            info!("Rejecting call: no number entered");
            let err = DialerError::MissingNumber;
            if let Some(notice) = err.user_notice() {
                self.notify(notice);
            }
            return Err(err);
        }

        if self.session.state.is_active() {
            warn!(
                "Rejecting call to {}: session {} already {}",
                number, self.session.id, self.session.state
            );
            return Err(DialerError::in_progress(self.session.state));
        }

        self.session = CallSession::idle();
        self.session.dialed_number = number;
        let session = self.session.id;
        info!("Starting call session {} to {}", session, self.session.dialed_number);
        self.transition(SessionState::AwaitingPermission);

        let gate = self.permission.clone();
        let completion_tx = self.completion_tx.clone();
        tokio::spawn(async move {
            let decision = gate.request().await;
            let _ = completion_tx.send(Completion::Permission { session, decision });
        });

        Ok(session)
    }

    async fn handle_completion(&mut self, completion: Completion) {
        match completion {
            Completion::Permission { session, decision } => {
                if !self.is_current(session, SessionState::AwaitingPermission) {
                    debug!("Discarding permission result for stale session {}", session);
                    return;
                }
                if decision.is_granted() {
                    self.dial();
                } else {
                    info!("Call permission not granted ({:?})", decision);
                    self.notify(UserNotice::permission_denied(PermissionKind::CallPhone));
                    self.reset_to_idle();
                }
            }
            Completion::Dial { session, result } => {
                if !self.is_current(session, SessionState::Dialing) {
                    // The OS may still place this call; nothing here tracks it
                    warn!("Dial result for stale session {} ignored", session);
                    return;
                }
                match result {
                    Ok(ack) => self.connect(ack).await,
                    Err(e) => self.fail(e).await,
                }
            }
        }
    }

    fn dial(&mut self) {
        self.transition(SessionState::Dialing);

        let session = self.session.id;
        let number = self.session.dialed_number.clone();
        let use_system_ui = self.use_system_ui;
        let dial = self.dial.clone();
        let completion_tx = self.completion_tx.clone();
        tokio::spawn(async move {
            let result = dial.place_call(&number, use_system_ui).await;
            let _ = completion_tx.send(Completion::Dial { session, result });
        });
    }

    /// Dial acknowledged: audio route first, then the timer
    async fn connect(&mut self, ack: DialAck) {
        debug!("Dial acknowledged for {} (system UI: {})", ack.number, ack.used_system_ui);

        if let Err(e) = self.audio.enable().await {
            self.fail(e).await;
            return;
        }
        self.emit(SessionEvent::Resource(ResourceEvent::AudioRouteEnabled));

        self.timer.start();
        self.emit(SessionEvent::Resource(ResourceEvent::TimerStarted));

        self.session.started_at = Some(Utc::now());
        self.transition(SessionState::InCall);
    }

    // ===== In-call controls =====

    async fn toggle(&mut self, toggle: AudioToggle) -> Option<bool> {
        if self.session.state != SessionState::InCall {
            debug!("Ignoring {:?} toggle while {}", toggle, self.session.state);
            return None;
        }

        let (target, result) = match toggle {
            AudioToggle::Mute => {
                let target = !self.session.muted;
                (target, self.audio.set_mic_muted(target).await)
            }
            AudioToggle::Speaker => {
                let target = !self.session.speaker_on;
                (target, self.audio.set_speaker(target).await)
            }
        };

        if let Err(e) = result {
            self.fail(e).await;
            return None;
        }

        match toggle {
            AudioToggle::Mute => self.session.muted = target,
            AudioToggle::Speaker => self.session.speaker_on = target,
        }
        info!("{:?} toggled to {}", toggle, target);
        self.publish_update();
        Some(target)
    }

    fn handle_tick(&mut self, tick: TimerTick) {
        if self.session.state != SessionState::InCall {
            return;
        }
        if let Some(elapsed) = self.timer.accept(tick) {
            self.session.elapsed_seconds = self.session.elapsed_seconds.max(elapsed);
            self.publish_update();
        }
    }

    // ===== Teardown =====

    /// Hang up: the single teardown path
    ///
    /// From `InCall` this stops the timer, disables the audio route, passes
    /// through `Ended` and lands in `Idle`. From a setup state it releases
    /// whatever was acquired and returns to `Idle`. From `Idle` it does nothing.
    async fn end_call(&mut self) {
        match self.session.state {
            SessionState::Idle => {
                debug!("end_call with no active session");
            }
            SessionState::InCall => {
                info!(
                    "Ending call session {} after {}s",
                    self.session.id, self.session.elapsed_seconds
                );
                self.release_resources().await;
                self.transition(SessionState::Ended);
                self.reset_to_idle();
            }
            state => {
                info!("Abandoning call session {} while {}", self.session.id, state);
                self.release_resources().await;
                self.reset_to_idle();
            }
        }
    }

    /// Stop the timer, then disable the audio route
    async fn release_resources(&mut self) {
        if self.timer.is_running() {
            self.timer.stop();
            self.emit(SessionEvent::Resource(ResourceEvent::TimerStopped));
        }
        if self.audio.is_enabled() {
            self.audio.disable().await;
            self.emit(SessionEvent::Resource(ResourceEvent::AudioRouteDisabled));
        }
    }

    /// A platform service failed mid-session
    async fn fail(&mut self, e: PlatformError) {
        error!("Call session {} failed: {}", self.session.id, e);
        self.end_call().await;
    }

    // ===== State publication =====

    fn is_current(&self, session: SessionId, state: SessionState) -> bool {
        self.session.id == session && self.session.state == state
    }

    fn transition(&mut self, to: SessionState) {
        let previous = self.session.state;
        self.session.state = to;
        info!("Session {}: {} -> {}", self.session.id, previous, to);

        let snapshot = self.snapshot();
        self.snapshot_tx.send_replace(snapshot.clone());
        self.emit(SessionEvent::StateChanged { previous, snapshot });
    }

    /// Replace the session with a fresh idle one
    fn reset_to_idle(&mut self) {
        let previous = self.session.state;
        self.session = CallSession::idle();
        info!("Session reset: {} -> {}", previous, SessionState::Idle);

        let snapshot = self.snapshot();
        self.snapshot_tx.send_replace(snapshot.clone());
        self.emit(SessionEvent::StateChanged { previous, snapshot });
    }

    fn publish_update(&self) {
        let snapshot = self.snapshot();
        self.snapshot_tx.send_replace(snapshot.clone());
        self.emit(SessionEvent::SessionUpdated(snapshot));
    }

    fn notify(&self, notice: UserNotice) {
        info!("Notice: {}", notice);
        self.emit(SessionEvent::Notice(notice));
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine; the watch channel still has the latest state
        let _ = self.event_tx.send(event);
    }
}
