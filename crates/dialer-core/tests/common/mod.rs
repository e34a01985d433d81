//! Shared helpers for the controller integration tests

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use dialer_core::sim::SimulatedPlatform;
use dialer_core::{
    CallSessionController, DialerConfig, PlatformServices, ResourceEvent, SessionEvent,
    SessionSnapshot, SessionState,
};
use tokio::sync::broadcast;

pub const WAIT: Duration = Duration::from_secs(5);

/// A controller over a fresh simulated platform
pub fn controller() -> (CallSessionController, Arc<SimulatedPlatform>) {
    controller_with(DialerConfig::default())
}

pub fn controller_with(config: DialerConfig) -> (CallSessionController, Arc<SimulatedPlatform>) {
    let platform = SimulatedPlatform::new();
    let controller =
        CallSessionController::new(config, PlatformServices::from_platform(platform.clone()))
            .expect("valid config");
    (controller, platform)
}

/// Collect events up to and including the transition into `state`
pub async fn events_until_state(
    events: &mut broadcast::Receiver<SessionEvent>,
    state: SessionState,
) -> Vec<SessionEvent> {
    let mut seen = Vec::new();
    let result = tokio::time::timeout(WAIT, async {
        loop {
            let event = events.recv().await.expect("event stream open");
            let done = matches!(
                &event,
                SessionEvent::StateChanged { snapshot, .. } if snapshot.state == state
            );
            seen.push(event);
            if done {
                break;
            }
        }
    })
    .await;
    if result.is_err() {
        panic!("timed out waiting for {state}, saw {seen:?}");
    }
    seen
}

/// Wait until the latest snapshot is in `state`
pub async fn wait_for_state(controller: &CallSessionController, state: SessionState) -> SessionSnapshot {
    let mut rx = controller.watch();
    let snapshot = tokio::time::timeout(WAIT, rx.wait_for(|s| s.state == state))
        .await
        .unwrap_or_else(|_| panic!("timed out waiting for {state}"))
        .expect("controller running")
        .clone();
    snapshot
}

/// Start a call and wait until it is connected
pub async fn connect(controller: &CallSessionController, number: &str) -> SessionSnapshot {
    controller.start_call(number).await.expect("call accepted");
    wait_for_state(controller, SessionState::InCall).await
}

/// Wait until the simulated platform has a held permission prompt
pub async fn wait_for_pending_permission(platform: &SimulatedPlatform) {
    tokio::time::timeout(WAIT, async {
        while platform.pending_permission_count() == 0 {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("permission prompt shown");
}

/// Let the controller task drain whatever is queued
pub async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}

pub fn resource_events(events: &[SessionEvent]) -> Vec<ResourceEvent> {
    events
        .iter()
        .filter_map(|event| match event {
            SessionEvent::Resource(resource) => Some(*resource),
            _ => None,
        })
        .collect()
}

pub fn notices(events: &[SessionEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|event| match event {
            SessionEvent::Notice(notice) => Some(notice.title.clone()),
            _ => None,
        })
        .collect()
}

pub fn states(events: &[SessionEvent]) -> Vec<SessionState> {
    events
        .iter()
        .filter_map(|event| match event {
            SessionEvent::StateChanged { snapshot, .. } => Some(snapshot.state),
            _ => None,
        })
        .collect()
}
