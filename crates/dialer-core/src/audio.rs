//! Audio route controller
//!
//! Owns the enabled/disabled state of the in-call audio session on top of an
//! [`AudioSessionService`]. The screen wake-lock follows the audio session:
//! it is asserted right after a successful enable and released on disable.
//!
//! `enable()` and `disable()` are idempotent, so the controller can call
//! `disable()` on every teardown path without tracking whether the route was
//! ever brought up.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::PlatformResult;
use crate::platform::{AudioMode, AudioSessionService};

pub struct AudioRouteController {
    service: Arc<dyn AudioSessionService>,
    mode: AudioMode,
    enabled: bool,
}

impl AudioRouteController {
    pub fn new(service: Arc<dyn AudioSessionService>, mode: AudioMode) -> Self {
        Self {
            service,
            mode,
            enabled: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Start the audio session and keep the screen on
    ///
    /// If the platform refuses to start the session the route stays disabled
    /// and the error is returned. A wake-lock failure is logged only; the
    /// route still counts as enabled and will be disabled later.
    pub async fn enable(&mut self) -> PlatformResult<()> {
        if self.enabled {
            debug!("Audio route already enabled");
            return Ok(());
        }

        self.service.enable(self.mode).await?;
        self.enabled = true;
        info!("Audio route enabled ({:?})", self.mode);

        if let Err(e) = self.service.set_keep_screen_on(true).await {
            warn!("Failed to acquire screen wake-lock: {}", e);
        }
        Ok(())
    }

    /// Release the wake-lock and stop the audio session
    ///
    /// Never fails: platform errors are logged and the route is considered
    /// disabled afterwards regardless.
    pub async fn disable(&mut self) {
        if !self.enabled {
            debug!("Audio route already disabled");
            return;
        }
        self.enabled = false;

        if let Err(e) = self.service.set_keep_screen_on(false).await {
            warn!("Failed to release screen wake-lock: {}", e);
        }
        if let Err(e) = self.service.disable().await {
            warn!("Failed to stop audio session: {}", e);
        }
        info!("Audio route disabled");
    }

    pub async fn set_mic_muted(&self, muted: bool) -> PlatformResult<()> {
        if !self.enabled {
            debug!("Ignoring mic mute={} while audio route is disabled", muted);
            return Ok(());
        }
        self.service.set_mic_muted(muted).await
    }

    pub async fn set_speaker(&self, on: bool) -> PlatformResult<()> {
        if !self.enabled {
            debug!("Ignoring speaker on={} while audio route is disabled", on);
            return Ok(());
        }
        self.service.set_speaker(on).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{AudioCall, SimulatedPlatform};

    #[tokio::test]
    async fn test_enable_disable_are_idempotent() {
        let platform = SimulatedPlatform::new();
        let mut route = AudioRouteController::new(platform.clone(), AudioMode::Audio);

        route.enable().await.unwrap();
        route.enable().await.unwrap();
        assert!(route.is_enabled());

        route.disable().await;
        route.disable().await;
        assert!(!route.is_enabled());

        assert_eq!(
            platform.audio_calls(),
            vec![
                AudioCall::Enable(AudioMode::Audio),
                AudioCall::KeepScreenOn(true),
                AudioCall::KeepScreenOn(false),
                AudioCall::Disable,
            ]
        );
    }

    #[tokio::test]
    async fn test_toggles_ignored_while_disabled() {
        let platform = SimulatedPlatform::new();
        let route = AudioRouteController::new(platform.clone(), AudioMode::Audio);

        route.set_mic_muted(true).await.unwrap();
        route.set_speaker(true).await.unwrap();
        assert!(platform.audio_calls().is_empty());
    }

    #[tokio::test]
    async fn test_failed_enable_leaves_route_disabled() {
        let platform = SimulatedPlatform::new();
        platform.fail_audio_enable("route busy");
        let mut route = AudioRouteController::new(platform.clone(), AudioMode::Audio);

        assert!(route.enable().await.is_err());
        assert!(!route.is_enabled());

        route.disable().await;
        assert_eq!(platform.audio_disable_count(), 0);
    }
}
