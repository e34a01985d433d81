//! Teardown and failure paths of the call-session controller
//!
//! Every path out of a session has to leave the audio route disabled and the
//! timer silent, with exactly one disable per enable.

mod common;

use std::time::Duration;

use common::*;
use dialer_core::sim::SimulatedPlatform;
use dialer_core::{
    CallSessionController, DialerConfig, DialerError, PermissionDecision, PlatformServices,
    ResourceEvent, SessionEvent, SessionState,
};

#[tokio::test(start_paused = true)]
async fn test_end_call_from_in_call_releases_everything() {
    let (controller, platform) = controller();
    connect(&controller, "+91 9119515866").await;

    tokio::time::sleep(Duration::from_secs(2)).await;
    settle().await;
    assert_eq!(controller.snapshot().elapsed_seconds, 2);

    let mut events = controller.subscribe();
    controller.end_call().await;
    let seen = events_until_state(&mut events, SessionState::Idle).await;

    assert_eq!(states(&seen), vec![SessionState::Ended, SessionState::Idle]);
    assert_eq!(
        resource_events(&seen),
        vec![ResourceEvent::TimerStopped, ResourceEvent::AudioRouteDisabled]
    );

    let snapshot = controller.snapshot();
    assert_eq!(snapshot.state, SessionState::Idle);
    assert_eq!(snapshot.elapsed_seconds, 0);
    assert!(snapshot.started_at.is_none());
    assert_eq!(platform.audio_enable_count(), 1);
    assert_eq!(platform.audio_disable_count(), 1);
    assert!(!platform.keep_screen_on());

    // No tick survives the hang-up
    tokio::time::sleep(Duration::from_secs(5)).await;
    settle().await;
    while let Ok(event) = events.try_recv() {
        assert!(
            !matches!(event, SessionEvent::SessionUpdated(_)),
            "unexpected update after hang-up: {event:?}"
        );
    }
    assert_eq!(controller.snapshot().elapsed_seconds, 0);
}

#[tokio::test]
async fn test_end_call_twice_disables_once() {
    let (controller, platform) = controller();
    connect(&controller, "9119515866").await;

    controller.end_call().await;
    let mut events = controller.subscribe();
    controller.end_call().await;
    settle().await;

    assert!(events.try_recv().is_err(), "second end_call must not emit anything");
    assert_eq!(platform.audio_disable_count(), 1);
    assert_eq!(controller.snapshot().state, SessionState::Idle);
}

#[tokio::test]
async fn test_end_call_from_idle_is_noop() {
    let (controller, platform) = controller();
    let mut events = controller.subscribe();

    controller.end_call().await;
    settle().await;

    assert!(events.try_recv().is_err());
    assert!(platform.audio_calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_elapsed_restarts_on_next_call() {
    let (controller, _platform) = controller();
    connect(&controller, "9119515866").await;

    tokio::time::sleep(Duration::from_secs(3)).await;
    settle().await;
    assert_eq!(controller.snapshot().elapsed_seconds, 3);
    controller.end_call().await;

    let first = controller.snapshot().session_id;
    let snapshot = connect(&controller, "9119515866").await;
    assert_eq!(snapshot.elapsed_seconds, 0);
    assert_ne!(snapshot.session_id, first);

    tokio::time::sleep(Duration::from_secs(1)).await;
    settle().await;
    assert_eq!(controller.snapshot().elapsed_seconds, 1);
}

#[tokio::test]
async fn test_end_call_while_awaiting_permission_discards_late_grant() {
    let (controller, platform) = controller();
    platform.hold_permissions();

    controller.start_call("9119515866").await.unwrap();
    wait_for_pending_permission(&platform).await;

    controller.end_call().await;
    assert_eq!(controller.snapshot().state, SessionState::Idle);

    assert!(platform.resolve_permission(PermissionDecision::Granted));
    settle().await;

    assert_eq!(controller.snapshot().state, SessionState::Idle);
    assert!(platform.dials().is_empty());
    assert_eq!(platform.audio_enable_count(), 0);

    // A new session can start right away
    controller.start_call("5550100").await.unwrap();
    assert_eq!(controller.snapshot().state, SessionState::AwaitingPermission);
}

#[tokio::test(start_paused = true)]
async fn test_end_call_while_dialing_drops_late_ack() {
    let latency = Duration::from_millis(300);
    let platform = SimulatedPlatform::with_latency(latency);
    let controller = CallSessionController::new(
        DialerConfig::default(),
        PlatformServices::from_platform(platform.clone()),
    )
    .unwrap();

    controller.start_call("9119515866").await.unwrap();
    let dialing = wait_for_state(&controller, SessionState::Dialing).await;

    controller.end_call().await;
    assert_eq!(controller.snapshot().state, SessionState::Idle);

    // The platform still acknowledges the dial after the hang-up
    tokio::time::sleep(latency * 2).await;
    settle().await;
    assert_eq!(platform.dials().len(), 1);

    let snapshot = controller.snapshot();
    assert_eq!(snapshot.state, SessionState::Idle);
    assert_ne!(snapshot.session_id, dialing.session_id);
    assert_eq!(platform.audio_enable_count(), 0);
    assert_eq!(platform.audio_disable_count(), 0);
    assert!(!platform.keep_screen_on());
}

#[tokio::test]
async fn test_dial_failure_tears_down_without_notice() {
    let (controller, platform) = controller();
    platform.fail_dial("no service");
    let mut events = controller.subscribe();

    controller.start_call("9119515866").await.unwrap();
    let seen = events_until_state(&mut events, SessionState::Idle).await;

    assert_eq!(
        states(&seen),
        vec![SessionState::AwaitingPermission, SessionState::Dialing, SessionState::Idle]
    );
    assert!(notices(&seen).is_empty());
    assert_eq!(platform.audio_enable_count(), 0);
}

#[tokio::test]
async fn test_audio_failure_tears_down_before_timer() {
    let (controller, platform) = controller();
    platform.fail_audio_enable("audio focus denied");
    let mut events = controller.subscribe();

    controller.start_call("9119515866").await.unwrap();
    let seen = events_until_state(&mut events, SessionState::Idle).await;

    assert!(!states(&seen).contains(&SessionState::InCall));
    assert!(resource_events(&seen).is_empty());
    assert_eq!(platform.audio_enable_count(), 0);
    assert_eq!(platform.audio_disable_count(), 0);
}

#[tokio::test]
async fn test_mute_failure_ends_the_call() {
    let (controller, platform) = controller();
    connect(&controller, "9119515866").await;
    platform.fail_mic_mute("mic busy");

    assert_eq!(controller.toggle_mute().await, None);

    let snapshot = controller.snapshot();
    assert_eq!(snapshot.state, SessionState::Idle);
    assert!(!snapshot.muted);
    assert_eq!(platform.audio_enable_count(), 1);
    assert_eq!(platform.audio_disable_count(), 1);
}

#[tokio::test]
async fn test_speaker_failure_ends_the_call() {
    let (controller, platform) = controller();
    connect(&controller, "9119515866").await;
    platform.fail_speaker("route unavailable");

    assert_eq!(controller.toggle_speaker().await, None);

    let snapshot = controller.snapshot();
    assert_eq!(snapshot.state, SessionState::Idle);
    assert!(!snapshot.speaker_on);
    assert_eq!(platform.audio_enable_count(), 1);
    assert_eq!(platform.audio_disable_count(), 1);
    assert!(!platform.keep_screen_on());
}

#[tokio::test]
async fn test_dropping_every_handle_tears_down() {
    let (controller, platform) = controller();
    let second_handle = controller.clone();
    connect(&controller, "9119515866").await;

    drop(controller);
    settle().await;
    assert_eq!(platform.audio_disable_count(), 0, "a live handle keeps the call up");

    drop(second_handle);
    tokio::time::timeout(WAIT, async {
        while platform.audio_disable_count() == 0 {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("teardown after the last handle is dropped");

    assert_eq!(platform.audio_enable_count(), 1);
    assert_eq!(platform.audio_disable_count(), 1);
    assert!(!platform.keep_screen_on());
}

#[tokio::test]
async fn test_shutdown_tears_down_and_closes() {
    let (controller, platform) = controller();
    connect(&controller, "9119515866").await;

    controller.shutdown().await;
    assert_eq!(platform.audio_disable_count(), 1);
    assert_eq!(controller.snapshot().state, SessionState::Idle);

    let result = controller.start_call("9119515866").await;
    assert_eq!(result, Err(DialerError::ControllerClosed));

    // Still safe to call after shutdown
    controller.end_call().await;
    controller.shutdown().await;
    assert_eq!(controller.toggle_mute().await, None);
    assert_eq!(platform.audio_disable_count(), 1);
}
