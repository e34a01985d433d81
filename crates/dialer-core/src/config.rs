//! Dialer configuration
//!
//! [`DialerConfig`] collects everything the controller and the call-log
//! viewer need that is not a platform service: the dial mode, the audio
//! session mode, the timer period, the copy shown in permission prompts and
//! the call-log page size.
//!
//! # Usage Examples
//!
//! ```rust
//! use dialer_core::config::{DialerConfig, PermissionRationale};
//! use dialer_core::platform::AudioMode;
//!
//! let config = DialerConfig::new()
//!     .with_system_ui(false)
//!     .with_audio_mode(AudioMode::Audio)
//!     .with_prefill_number("+91 9119515866")
//!     .with_call_log_limit(50);
//!
//! assert!(!config.use_system_ui);
//! assert_eq!(config.call_log_limit, 50);
//! assert!(config.validate().is_ok());
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{DialerError, DialerResult};
use crate::platform::{AudioMode, PermissionKind};

/// Copy shown by the platform when it prompts for a permission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionRationale {
    pub title: String,
    pub message: String,
    pub button_positive: String,
    pub button_negative: String,
    /// Optional "decide later" button; answering with it resolves as `Unknown`
    #[serde(default)]
    pub button_neutral: Option<String>,
}

impl PermissionRationale {
    /// Default prompt for the call-placement permission
    pub fn call_phone() -> Self {
        Self {
            title: "App Needs Permission".to_string(),
            message: "MyApp needs phone call permission to dial directly".to_string(),
            button_positive: "Agree".to_string(),
            button_negative: "Disagree".to_string(),
            button_neutral: None,
        }
    }

    /// Default prompt for the call-history permission
    pub fn read_call_log() -> Self {
        Self {
            title: "Call Log Permission".to_string(),
            message: "This app needs access to your call logs to display recent calls".to_string(),
            button_positive: "OK".to_string(),
            button_negative: "Cancel".to_string(),
            button_neutral: Some("Ask Me Later".to_string()),
        }
    }

    /// Default prompt for `kind`
    pub fn for_kind(kind: PermissionKind) -> Self {
        match kind {
            PermissionKind::CallPhone => Self::call_phone(),
            PermissionKind::ReadCallLog => Self::read_call_log(),
        }
    }
}

/// Configuration for the call-session controller and the call-log viewer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DialerConfig {
    /// Show the platform's native call UI when dialing
    pub use_system_ui: bool,
    /// Media mode for the in-call audio session
    pub audio_mode: AudioMode,
    /// Call timer period in milliseconds
    pub tick_interval_ms: u64,
    /// Prompt shown when asking to place calls
    pub call_permission: PermissionRationale,
    /// Prompt shown when asking to read the call history
    pub call_log_permission: PermissionRationale,
    /// Maximum number of call-log entries loaded at once
    pub call_log_limit: usize,
    /// Number put into the dial pad by the "prefilled" entry point
    pub prefill_number: Option<String>,
}

impl Default for DialerConfig {
    fn default() -> Self {
        Self {
            use_system_ui: true,
            audio_mode: AudioMode::Audio,
            tick_interval_ms: 1000,
            call_permission: PermissionRationale::call_phone(),
            call_log_permission: PermissionRationale::read_call_log(),
            call_log_limit: 100,
            prefill_number: None,
        }
    }
}

impl DialerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_system_ui(mut self, use_system_ui: bool) -> Self {
        self.use_system_ui = use_system_ui;
        self
    }

    pub fn with_audio_mode(mut self, mode: AudioMode) -> Self {
        self.audio_mode = mode;
        self
    }

    /// Set the timer period, stored in whole milliseconds
    ///
    /// Sub-millisecond periods round down to zero, which `validate()`
    /// rejects. Periods too long for `u64` milliseconds saturate.
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn with_call_permission(mut self, rationale: PermissionRationale) -> Self {
        self.call_permission = rationale;
        self
    }

    pub fn with_call_log_permission(mut self, rationale: PermissionRationale) -> Self {
        self.call_log_permission = rationale;
        self
    }

    pub fn with_call_log_limit(mut self, limit: usize) -> Self {
        self.call_log_limit = limit;
        self
    }

    pub fn with_prefill_number(mut self, number: impl Into<String>) -> Self {
        self.prefill_number = Some(number.into());
        self
    }

    /// Timer period as a `Duration`
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Check the configuration for values the controller cannot run with
    pub fn validate(&self) -> DialerResult<()> {
        if self.tick_interval_ms == 0 {
            return Err(DialerError::config("tick_interval_ms must be greater than zero"));
        }
        if self.call_log_limit == 0 {
            return Err(DialerError::config("call_log_limit must be greater than zero"));
        }
        if let Some(number) = &self.prefill_number {
            if number.trim().is_empty() {
                return Err(DialerError::config("prefill_number must not be blank"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_direct_dialing() {
        let config = DialerConfig::default();
        assert!(config.use_system_ui);
        assert_eq!(config.audio_mode, AudioMode::Audio);
        assert_eq!(config.tick_interval(), Duration::from_secs(1));
        assert_eq!(config.call_permission.button_positive, "Agree");
        assert_eq!(config.call_log_permission.button_neutral.as_deref(), Some("Ask Me Later"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let config = DialerConfig::new().with_tick_interval(Duration::ZERO);
        assert!(matches!(config.validate(), Err(DialerError::Configuration { .. })));

        let config = DialerConfig::new().with_prefill_number("   ");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_tick_interval_conversion() {
        let config = DialerConfig::new().with_tick_interval(Duration::from_millis(250));
        assert_eq!(config.tick_interval_ms, 250);

        let config = DialerConfig::new().with_tick_interval(Duration::MAX);
        assert_eq!(config.tick_interval_ms, u64::MAX);
        assert!(config.validate().is_ok());

        let config = DialerConfig::new().with_tick_interval(Duration::from_micros(500));
        assert_eq!(config.tick_interval_ms, 0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: DialerConfig =
            serde_json::from_str(r#"{ "use_system_ui": false, "call_log_limit": 10 }"#).unwrap();
        assert!(!config.use_system_ui);
        assert_eq!(config.call_log_limit, 10);
        assert_eq!(config.tick_interval_ms, 1000);
        assert_eq!(config.call_permission, PermissionRationale::call_phone());
    }
}
