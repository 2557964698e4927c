//! Integration tests for the session engine, run against the mock
//! peripheral with tokio's paused test clock so every timer fires
//! deterministically.

use std::time::Duration;

use tempfile::TempDir;
use tokio::sync::mpsc::UnboundedReceiver;

use edemaflex_engine::{
    CharacteristicKey, EngineEvent, GloveEngine, SettingsStore,
};

/// Engine backed by a throwaway settings file.
fn engine_in(temp: &TempDir) -> (GloveEngine, UnboundedReceiver<EngineEvent>) {
    GloveEngine::new(SettingsStore::new(temp.path().join("settings.toml")))
}

/// Drain everything currently queued on the event stream.
fn drain_events(events: &mut UnboundedReceiver<EngineEvent>) -> Vec<EngineEvent> {
    let mut drained = Vec::new();
    while let Ok(event) = events.try_recv() {
        drained.push(event);
    }
    drained
}

/// Past the mock connect stages plus the reconciler settle delay.
async fn connect_and_settle(engine: &GloveEngine) {
    engine.mock_connect().await.unwrap();
    tokio::time::sleep(Duration::from_millis(700)).await;
}

// ---------------------------------------------------------------------------
// Connection lifecycle
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn mock_connect_reaches_connected_state() {
    let temp = TempDir::new().unwrap();
    let (engine, mut events) = engine_in(&temp);

    engine.mock_connect().await.unwrap();

    assert!(engine.is_connected());
    assert!(!engine.is_running());
    assert!(engine.is_mock_mode());
    assert_eq!(engine.error_message(), None);
    assert_eq!(engine.connection_status(), "Connected. Ready to start.");

    // The staged connect messages surfaced, in order, before the final one.
    let statuses: Vec<String> = drain_events(&mut events)
        .into_iter()
        .filter_map(|event| match event {
            EngineEvent::StatusChanged(status) => Some(status),
            _ => None,
        })
        .collect();
    assert_eq!(
        statuses,
        vec![
            "Requesting Bluetooth device...",
            "Connecting to GATT server...",
            "Getting service...",
            "Getting characteristics...",
            "Connected. Ready to start.",
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn connecting_twice_is_benign() {
    let temp = TempDir::new().unwrap();
    let (engine, _events) = engine_in(&temp);

    connect_and_settle(&engine).await;
    engine.mock_connect().await.unwrap();

    assert!(engine.is_connected());
    assert_eq!(engine.error_message().as_deref(), Some("Already connected"));
}

#[tokio::test(start_paused = true)]
async fn disconnect_resets_session_fields() {
    let temp = TempDir::new().unwrap();
    let (engine, _events) = engine_in(&temp);

    connect_and_settle(&engine).await;
    let finals = engine.disconnect().await;

    assert!(finals.is_some());
    assert!(!engine.is_connected());
    assert!(!engine.is_mock_mode());
    assert_eq!(engine.connection_status(), "Disconnected");

    // Disconnecting again is a no-op.
    assert_eq!(engine.disconnect().await, None);
}

// ---------------------------------------------------------------------------
// Persisted configuration
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn set_pwm_level_persists_while_disconnected() {
    let temp = TempDir::new().unwrap();
    let store_path = temp.path().join("settings.toml");
    let (engine, _events) = engine_in(&temp);

    for level in 0..=5 {
        assert!(engine.set_pwm_level(CharacteristicKey::Index, level).await);
        assert_eq!(
            engine.pwm_levels()[&CharacteristicKey::Index],
            level,
            "level {level} should be accepted"
        );
    }

    // A fresh engine over the same store sees the last value.
    let (reloaded, _events) = GloveEngine::new(SettingsStore::new(store_path));
    assert_eq!(reloaded.pwm_levels()[&CharacteristicKey::Index], 5);
}

#[tokio::test(start_paused = true)]
async fn out_of_range_level_is_rejected_without_mutation() {
    let temp = TempDir::new().unwrap();
    let (engine, _events) = engine_in(&temp);

    for level in [6, 7, 99, 255] {
        assert!(!engine.set_pwm_level(CharacteristicKey::Thumb, level).await);
        assert_eq!(
            engine.pwm_levels()[&CharacteristicKey::Thumb],
            3,
            "rejected level {level} must not touch stored state"
        );
    }
    assert_eq!(
        engine.error_message().as_deref(),
        Some("PWM level must be between 0 and 5")
    );

    // A later successful operation clears the error.
    assert!(engine.set_pwm_level(CharacteristicKey::Thumb, 2).await);
    assert_eq!(engine.error_message(), None);
}

#[tokio::test(start_paused = true)]
async fn out_of_range_mode_is_rejected() {
    let temp = TempDir::new().unwrap();
    let (engine, _events) = engine_in(&temp);

    assert!(!engine.change_activation_mode(3).await);
    assert_eq!(engine.activation_mode().code(), 0);
    assert_eq!(
        engine.error_message().as_deref(),
        Some("Activation mode must be between 0 and 2")
    );
}

#[tokio::test(start_paused = true)]
async fn reconciler_replays_pattern_after_connect() {
    let temp = TempDir::new().unwrap();
    let (engine, _events) = engine_in(&temp);

    // Configured while disconnected; the update is accepted and persisted.
    assert!(engine.change_activation_mode(2).await);
    assert_eq!(engine.activation_mode().code(), 2);

    engine.mock_connect().await.unwrap();
    // Before the settle delay the board still has its default pattern.
    assert_eq!(
        engine.read_characteristic(CharacteristicKey::Led).await,
        Some("0".to_string())
    );

    tokio::time::sleep(Duration::from_millis(700)).await;
    assert_eq!(
        engine.read_characteristic(CharacteristicKey::Led).await,
        Some("2".to_string())
    );
}

#[tokio::test(start_paused = true)]
async fn live_level_change_writes_through_while_connected() {
    let temp = TempDir::new().unwrap();
    let (engine, _events) = engine_in(&temp);
    connect_and_settle(&engine).await;

    assert!(engine.set_pwm_level(CharacteristicKey::Pinky, 4).await);
    assert_eq!(engine.pwm_levels()[&CharacteristicKey::Pinky], 4);
    assert_eq!(
        engine.connection_status(),
        "Pinky PWM level set to 4"
    );
}

// ---------------------------------------------------------------------------
// Session control
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn full_session_scenario() {
    let temp = TempDir::new().unwrap();
    let (engine, _events) = engine_in(&temp);

    connect_and_settle(&engine).await;
    assert!(engine.set_pwm_level(CharacteristicKey::Thumb, 5).await);

    engine.start_board().await.unwrap();
    assert!(engine.is_running());
    assert_eq!(engine.pwm_levels()[&CharacteristicKey::Thumb], 5);
    assert_eq!(
        engine.read_characteristic(CharacteristicKey::Start).await,
        Some("1".to_string())
    );

    // Let the poll loop gather some telemetry.
    tokio::time::sleep(Duration::from_secs(1)).await;

    let finals = engine.stop_board().await.unwrap().expect("final readings");
    assert!(!engine.is_running());
    assert!(engine.is_connected());

    // All six segments, bit-strings of the right length, '0'/'1' only.
    assert_eq!(finals.len(), 6);
    for key in CharacteristicKey::SEGMENTS {
        let value = finals.get(&key).expect("segment present");
        assert_eq!(value.len(), key.telemetry_len().unwrap());
        assert!(value.chars().all(|c| c == '0' || c == '1'));
    }
}

#[tokio::test(start_paused = true)]
async fn telemetry_follows_the_mock_cycle() {
    let temp = TempDir::new().unwrap();
    let (engine, _events) = engine_in(&temp);
    connect_and_settle(&engine).await;
    engine.start_board().await.unwrap();

    // Step 0: first finger position firing on every finger, palm idle.
    tokio::time::sleep(Duration::from_secs(1)).await;
    let telemetry = engine.telemetry();
    assert_eq!(telemetry[&CharacteristicKey::Thumb], "100000");
    assert_eq!(telemetry[&CharacteristicKey::Pinky], "100000");
    assert_eq!(telemetry[&CharacteristicKey::Palm], "0000000");

    engine.disconnect().await;
}

#[tokio::test(start_paused = true)]
async fn stop_board_twice_is_idempotent() {
    let temp = TempDir::new().unwrap();
    let (engine, _events) = engine_in(&temp);
    connect_and_settle(&engine).await;

    engine.start_board().await.unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;

    let first = engine.stop_board().await.unwrap();
    assert!(first.is_some());
    assert!(engine.status().started_at.is_none());

    let second = engine.stop_board().await.unwrap();
    assert_eq!(second, None);
    assert!(engine.status().started_at.is_none());
    assert!(engine.is_connected());
}

#[tokio::test(start_paused = true)]
async fn starting_twice_reports_benign_error() {
    let temp = TempDir::new().unwrap();
    let (engine, _events) = engine_in(&temp);
    connect_and_settle(&engine).await;

    engine.start_board().await.unwrap();
    engine.start_board().await.unwrap();
    assert!(engine.is_running());
    assert_eq!(
        engine.error_message().as_deref(),
        Some("Board already started")
    );

    engine.disconnect().await;
}

#[tokio::test(start_paused = true)]
async fn disconnect_after_start_returns_stopped_snapshot() {
    let temp = TempDir::new().unwrap();
    let (engine, _events) = engine_in(&temp);
    connect_and_settle(&engine).await;

    engine.start_board().await.unwrap();
    tokio::time::sleep(Duration::from_secs(4)).await;

    let finals = engine.disconnect().await.expect("final readings");

    // Stop precedes the snapshot, so the board reports every segment
    // idle: exactly what a manual full read would produce at that
    // instant.
    for key in CharacteristicKey::SEGMENTS {
        assert_eq!(finals[&key], key.idle_value());
    }
    assert!(!engine.is_connected());
}

// ---------------------------------------------------------------------------
// Queue suppression
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn stop_clears_pending_reads_immediately() {
    let temp = TempDir::new().unwrap();
    let (engine, _events) = engine_in(&temp);
    connect_and_settle(&engine).await;

    engine.start_board().await.unwrap();
    // Polling outpaces the 50ms-per-read drain, so a backlog builds.
    tokio::time::sleep(Duration::from_millis(950)).await;
    assert!(engine.pending_reads() > 0);

    engine.stop_board().await.unwrap();
    assert_eq!(engine.pending_reads(), 0);

    // Nothing re-enqueues after the session left the running state.
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(engine.pending_reads(), 0);
}

// ---------------------------------------------------------------------------
// Auto-stop
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn auto_stop_fires_exactly_once() {
    let temp = TempDir::new().unwrap();
    let (engine, mut events) = engine_in(&temp);

    engine.set_session_duration(Duration::from_secs(60));
    connect_and_settle(&engine).await;
    engine.start_board().await.unwrap();
    assert!(engine.is_running());

    // Run well past the configured minute; the watchdog polls every 5s.
    tokio::time::sleep(Duration::from_secs(75)).await;

    assert!(!engine.is_running());
    assert!(!engine.is_connected());
    assert_eq!(engine.connection_status(), "Session complete");

    let ended = drain_events(&mut events)
        .into_iter()
        .filter(|event| *event == EngineEvent::SessionEnded)
        .count();
    assert_eq!(ended, 1, "exactly one session-ended notification");
}

#[tokio::test(start_paused = true)]
async fn manual_stop_before_deadline_prevents_auto_stop() {
    let temp = TempDir::new().unwrap();
    let (engine, mut events) = engine_in(&temp);

    engine.set_session_duration(Duration::from_secs(60));
    connect_and_settle(&engine).await;
    engine.start_board().await.unwrap();

    tokio::time::sleep(Duration::from_secs(30)).await;
    engine.stop_board().await.unwrap();

    // Well past where the watchdog would have fired.
    tokio::time::sleep(Duration::from_secs(60)).await;

    assert!(engine.is_connected(), "no auto-disconnect after manual stop");
    let ended = drain_events(&mut events)
        .into_iter()
        .filter(|event| *event == EngineEvent::SessionEnded)
        .count();
    assert_eq!(ended, 0);
}

// ---------------------------------------------------------------------------
// Countdown
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn countdown_tracks_elapsed_time() {
    let temp = TempDir::new().unwrap();
    let (engine, _events) = engine_in(&temp);

    engine.set_session_duration(Duration::from_secs(120));
    assert_eq!(engine.remaining_time(), "02:00");

    connect_and_settle(&engine).await;
    engine.start_board().await.unwrap();

    tokio::time::sleep(Duration::from_millis(30_500)).await;
    assert_eq!(engine.remaining_time(), "01:30");

    engine.stop_board().await.unwrap();
    assert_eq!(engine.remaining_time(), "02:00");

    engine.disconnect().await;
}
