//! Scripted platform for tests and the command-line front-end
//!
//! [`SimulatedPlatform`] implements every platform trait in memory. It
//! records each successful service call so tests can assert on ordering and
//! pairing, and it can be scripted to answer permission prompts, hold them
//! open, or fail individual operations once.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::debug;

use crate::call_log::{CallLogEntry, CallType};
use crate::config::PermissionRationale;
use crate::error::{PlatformError, PlatformResult};
use crate::platform::{
    AudioMode, AudioSessionService, CallLogService, DialAck, DialService, PermissionDecision,
    PermissionKind, PermissionService,
};

/// A recorded audio-service call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioCall {
    Enable(AudioMode),
    Disable,
    MicMuted(bool),
    Speaker(bool),
    KeepScreenOn(bool),
}

/// A recorded dial request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialRequest {
    pub number: String,
    pub use_system_ui: bool,
}

#[derive(Default)]
struct SimState {
    default_decision: PermissionDecision,
    permission_script: VecDeque<PermissionDecision>,
    permission_failure: Option<String>,
    hold_permissions: bool,
    pending_permissions: VecDeque<oneshot::Sender<PermissionDecision>>,
    permission_requests: Vec<(PermissionKind, PermissionRationale)>,

    dial_failure: Option<String>,
    dials: Vec<DialRequest>,

    audio_enable_failure: Option<String>,
    mic_failure: Option<String>,
    speaker_failure: Option<String>,
    audio_calls: Vec<AudioCall>,

    call_log: Vec<CallLogEntry>,
    call_log_failure: Option<String>,
}

pub struct SimulatedPlatform {
    state: Mutex<SimState>,
    latency: Duration,
}

impl SimulatedPlatform {
    /// A platform that grants every permission and accepts every call
    pub fn new() -> Arc<Self> {
        Self::with_latency(Duration::ZERO)
    }

    /// Like [`SimulatedPlatform::new`], but permission prompts and dial
    /// requests take `latency` to answer
    pub fn with_latency(latency: Duration) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(SimState {
                default_decision: PermissionDecision::Granted,
                ..Default::default()
            }),
            latency,
        })
    }

    // ===== Scripting =====

    /// Answer every unscripted prompt with `decision`
    pub fn set_default_permission(&self, decision: PermissionDecision) {
        self.state.lock().default_decision = decision;
    }

    /// Answer the next prompts with `decisions`, in order
    pub fn script_permissions(&self, decisions: impl IntoIterator<Item = PermissionDecision>) {
        self.state.lock().permission_script.extend(decisions);
    }

    /// Fail the next permission prompt
    pub fn fail_next_permission(&self, reason: impl Into<String>) {
        self.state.lock().permission_failure = Some(reason.into());
    }

    /// Keep prompts open until [`SimulatedPlatform::resolve_permission`] answers them
    pub fn hold_permissions(&self) {
        self.state.lock().hold_permissions = true;
    }

    /// Answer the oldest held prompt; returns false if none is waiting
    pub fn resolve_permission(&self, decision: PermissionDecision) -> bool {
        let pending = self.state.lock().pending_permissions.pop_front();
        match pending {
            Some(tx) => tx.send(decision).is_ok(),
            None => false,
        }
    }

    pub fn pending_permission_count(&self) -> usize {
        self.state.lock().pending_permissions.len()
    }

    /// Fail the next dial request
    pub fn fail_dial(&self, reason: impl Into<String>) {
        self.state.lock().dial_failure = Some(reason.into());
    }

    /// Fail the next audio-session start
    pub fn fail_audio_enable(&self, reason: impl Into<String>) {
        self.state.lock().audio_enable_failure = Some(reason.into());
    }

    /// Fail the next microphone mute change
    pub fn fail_mic_mute(&self, reason: impl Into<String>) {
        self.state.lock().mic_failure = Some(reason.into());
    }

    /// Fail the next speakerphone change
    pub fn fail_speaker(&self, reason: impl Into<String>) {
        self.state.lock().speaker_failure = Some(reason.into());
    }

    pub fn set_call_log(&self, entries: Vec<CallLogEntry>) {
        self.state.lock().call_log = entries;
    }

    /// Fail the next call-log load
    pub fn fail_call_log(&self, reason: impl Into<String>) {
        self.state.lock().call_log_failure = Some(reason.into());
    }

    /// Fill the call log with a few plausible recent calls
    pub fn load_sample_call_log(&self) {
        let now = Utc::now().timestamp_millis();
        let minute = 60_000;
        self.set_call_log(vec![
            CallLogEntry {
                phone_number: "+91 9119515866".to_string(),
                call_type: CallType::Outgoing,
                timestamp_millis: now - 5 * minute,
                duration_seconds: 184,
            },
            CallLogEntry {
                phone_number: "9119515866".to_string(),
                call_type: CallType::Incoming,
                timestamp_millis: now - 95 * minute,
                duration_seconds: 42,
            },
            CallLogEntry {
                phone_number: "+1 555 0100".to_string(),
                call_type: CallType::Missed,
                timestamp_millis: now - 26 * 60 * minute,
                duration_seconds: 0,
            },
        ]);
    }

    // ===== Inspection =====

    pub fn permission_requests(&self) -> Vec<PermissionKind> {
        self.state
            .lock()
            .permission_requests
            .iter()
            .map(|(kind, _)| *kind)
            .collect()
    }

    /// Rationale shown with the most recent prompt
    pub fn last_rationale(&self) -> Option<PermissionRationale> {
        self.state
            .lock()
            .permission_requests
            .last()
            .map(|(_, rationale)| rationale.clone())
    }

    pub fn dials(&self) -> Vec<DialRequest> {
        self.state.lock().dials.clone()
    }

    pub fn audio_calls(&self) -> Vec<AudioCall> {
        self.state.lock().audio_calls.clone()
    }

    pub fn audio_enable_count(&self) -> usize {
        self.count_audio(|call| matches!(call, AudioCall::Enable(_)))
    }

    pub fn audio_disable_count(&self) -> usize {
        self.count_audio(|call| matches!(call, AudioCall::Disable))
    }

    /// Whether the wake-lock is currently held
    pub fn keep_screen_on(&self) -> bool {
        self.state
            .lock()
            .audio_calls
            .iter()
            .rev()
            .find_map(|call| match call {
                AudioCall::KeepScreenOn(on) => Some(*on),
                _ => None,
            })
            .unwrap_or(false)
    }

    fn count_audio(&self, predicate: impl Fn(&AudioCall) -> bool) -> usize {
        self.state
            .lock()
            .audio_calls
            .iter()
            .filter(|call| predicate(call))
            .count()
    }

    fn record_audio(&self, call: AudioCall) {
        debug!("Simulated audio: {:?}", call);
        self.state.lock().audio_calls.push(call);
    }

    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

#[async_trait]
impl PermissionService for SimulatedPlatform {
    async fn request(
        &self,
        kind: PermissionKind,
        rationale: &PermissionRationale,
    ) -> PlatformResult<PermissionDecision> {
        let held = {
            let mut state = self.state.lock();
            state.permission_requests.push((kind, rationale.clone()));

            if let Some(reason) = state.permission_failure.take() {
                return Err(PlatformError::new("permission", "request", reason));
            }

            if state.hold_permissions {
                let (tx, rx) = oneshot::channel();
                state.pending_permissions.push_back(tx);
                Some(rx)
            } else {
                None
            }
        };

        if let Some(rx) = held {
            debug!("Simulated {} prompt waiting for an answer", kind);
            // A dropped sender behaves like the user dismissing the dialog
            return Ok(rx.await.unwrap_or(PermissionDecision::Denied));
        }

        self.simulate_latency().await;
        let mut state = self.state.lock();
        let decision = state
            .permission_script
            .pop_front()
            .unwrap_or(state.default_decision);
        debug!("Simulated {} prompt answered: {:?}", kind, decision);
        Ok(decision)
    }
}

#[async_trait]
impl DialService for SimulatedPlatform {
    async fn place_call(&self, number: &str, use_system_ui: bool) -> PlatformResult<DialAck> {
        self.simulate_latency().await;
        let mut state = self.state.lock();
        if let Some(reason) = state.dial_failure.take() {
            return Err(PlatformError::new("dial", "place_call", reason));
        }
        state.dials.push(DialRequest {
            number: number.to_string(),
            use_system_ui,
        });
        debug!("Simulated dial to {} (system UI: {})", number, use_system_ui);
        Ok(DialAck {
            number: number.to_string(),
            used_system_ui: use_system_ui,
        })
    }
}

#[async_trait]
impl AudioSessionService for SimulatedPlatform {
    async fn enable(&self, mode: AudioMode) -> PlatformResult<()> {
        if let Some(reason) = self.state.lock().audio_enable_failure.take() {
            return Err(PlatformError::new("audio", "enable", reason));
        }
        self.record_audio(AudioCall::Enable(mode));
        Ok(())
    }

    async fn disable(&self) -> PlatformResult<()> {
        self.record_audio(AudioCall::Disable);
        Ok(())
    }

    async fn set_mic_muted(&self, muted: bool) -> PlatformResult<()> {
        if let Some(reason) = self.state.lock().mic_failure.take() {
            return Err(PlatformError::new("audio", "set_mic_muted", reason));
        }
        self.record_audio(AudioCall::MicMuted(muted));
        Ok(())
    }

    async fn set_speaker(&self, on: bool) -> PlatformResult<()> {
        if let Some(reason) = self.state.lock().speaker_failure.take() {
            return Err(PlatformError::new("audio", "set_speaker", reason));
        }
        self.record_audio(AudioCall::Speaker(on));
        Ok(())
    }

    async fn set_keep_screen_on(&self, on: bool) -> PlatformResult<()> {
        self.record_audio(AudioCall::KeepScreenOn(on));
        Ok(())
    }
}

#[async_trait]
impl CallLogService for SimulatedPlatform {
    async fn load_recent_calls(&self, limit: usize) -> PlatformResult<Vec<CallLogEntry>> {
        let mut state = self.state.lock();
        if let Some(reason) = state.call_log_failure.take() {
            return Err(PlatformError::new("call-log", "load", reason));
        }
        Ok(state.call_log.iter().take(limit).cloned().collect())
    }
}
