//! Permission gate
//!
//! Wraps a [`PermissionService`] for a single permission kind. Every call to
//! [`PermissionGate::request`] goes back to the platform; the last answer is
//! remembered only for inspection, never trusted for the next attempt.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::config::PermissionRationale;
use crate::platform::{PermissionDecision, PermissionKind, PermissionService};

pub struct PermissionGate {
    service: Arc<dyn PermissionService>,
    kind: PermissionKind,
    rationale: PermissionRationale,
    last_decision: Mutex<PermissionDecision>,
}

impl PermissionGate {
    pub fn new(
        service: Arc<dyn PermissionService>,
        kind: PermissionKind,
        rationale: PermissionRationale,
    ) -> Self {
        Self {
            service,
            kind,
            rationale,
            last_decision: Mutex::new(PermissionDecision::Unknown),
        }
    }

    pub fn kind(&self) -> PermissionKind {
        self.kind
    }

    /// The most recent decision, `Unknown` before the first request
    pub fn last_decision(&self) -> PermissionDecision {
        *self.last_decision.lock()
    }

    /// Ask the platform for the permission
    ///
    /// A platform failure while prompting counts as `Denied`.
    pub async fn request(&self) -> PermissionDecision {
        debug!("Requesting {} permission", self.kind);

        let decision = match self.service.request(self.kind, &self.rationale).await {
            Ok(decision) => decision,
            Err(e) => {
                warn!("Error with {} permission: {}", self.kind, e);
                PermissionDecision::Denied
            }
        };

        *self.last_decision.lock() = decision;
        info!("{} permission resolved: {:?}", self.kind, decision);
        decision
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimulatedPlatform;
    use tracing_test::traced_test;

    #[tokio::test]
    async fn test_request_asks_every_time() {
        let platform = SimulatedPlatform::new();
        platform.script_permissions([PermissionDecision::Denied, PermissionDecision::Granted]);

        let gate = PermissionGate::new(
            platform.clone(),
            PermissionKind::CallPhone,
            PermissionRationale::call_phone(),
        );
        assert_eq!(gate.last_decision(), PermissionDecision::Unknown);

        assert_eq!(gate.request().await, PermissionDecision::Denied);
        assert_eq!(gate.request().await, PermissionDecision::Granted);
        assert_eq!(gate.last_decision(), PermissionDecision::Granted);
        assert_eq!(platform.permission_requests().len(), 2);
    }

    #[tokio::test]
    #[traced_test]
    async fn test_platform_error_counts_as_denied() {
        let platform = SimulatedPlatform::new();
        platform.fail_next_permission("dialog crashed");

        let gate = PermissionGate::new(
            platform.clone(),
            PermissionKind::CallPhone,
            PermissionRationale::call_phone(),
        );
        assert_eq!(gate.request().await, PermissionDecision::Denied);
        assert_eq!(gate.last_decision(), PermissionDecision::Denied);
        assert!(logs_contain("Error with call-phone permission"));
    }
}
