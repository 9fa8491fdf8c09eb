use super::*;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::sleep;

use crate::adapter::outbound::websocket::decode_frame;
use crate::application::telemetry::state::{SharedState, TelemetrySnapshot};
use crate::testkit;
use crate::testkit::config::{ALERT, CALM, RETRY_DELAY};
use crate::testkit::domain::{alert_reading, frame, patient, reading, values};
use crate::testkit::stream::{
    channel_stream, clean_close, refused, server_error, ChannelStreamHandle, ScriptedStream,
};

// -- Helpers --------------------------------------------------------------

struct Running {
    shared: Arc<SharedState>,
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<SessionExit>,
}

impl Running {
    fn snapshot(&self) -> TelemetrySnapshot {
        self.shared.snapshot()
    }

    async fn stop(self) -> SessionExit {
        let _ = self.shutdown.send(());
        self.handle.await.unwrap()
    }
}

/// Spawn a session for patient 1 on `stream`.
fn spawn_session(stream: impl TelemetryStream + 'static, config: TelemetryConfig) -> Running {
    let shared = SharedState::new(config.retention, config.flush.cadence(AlertMode::Calm));
    let epoch = shared.supersede(Some(patient(1)));
    let session = Session::new(patient(1), Box::new(stream), &config, shared.writer(epoch));
    let (shutdown, rx) = oneshot::channel();
    Running {
        shared,
        shutdown,
        handle: tokio::spawn(session.run(rx)),
    }
}

fn spawn_channel(config: TelemetryConfig) -> (Running, ChannelStreamHandle) {
    let (stream, handle) = channel_stream();
    (spawn_session(stream, config), handle)
}

fn margin() -> Duration {
    Duration::from_millis(50)
}

// -- Ingest & flush -------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn test_samples_reach_state_only_on_flush() {
    let (running, handle) = spawn_channel(testkit::config::telemetry());
    handle.send_sample(reading(patient(1), 1.0));

    sleep(CALM / 2).await;
    let before = running.snapshot();
    assert_eq!(before.status, ConnectionStatus::Connected);
    assert!(before.samples.is_empty());

    sleep(CALM / 2 + margin()).await;
    let after = running.snapshot();
    assert_eq!(values(&after.samples), vec![1.0]);
    assert_eq!(after.flushes, 1);
    assert_eq!(after.counters.received, 1);
    assert_eq!(after.counters.flushed, 1);

    running.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_malformed_message_between_valid_ones() {
    let stream = ScriptedStream::new().with_events(vec![
        decode_frame(&frame(&reading(patient(1), 1.0))),
        decode_frame("{\"patient_id\": 1, \"timestamp\": "),
        decode_frame(&frame(&reading(patient(1), 2.0))),
    ]);
    let running = spawn_session(stream, testkit::config::telemetry());

    sleep(CALM + margin()).await;

    let snapshot = running.snapshot();
    assert_eq!(values(&snapshot.samples), vec![1.0, 2.0]);
    assert_eq!(snapshot.status, ConnectionStatus::Connected);
    assert!(snapshot.last_error.is_none());
    assert_eq!(snapshot.counters.malformed, 1);
    assert_eq!(snapshot.counters.received, 2);

    running.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_mismatched_patient_is_dropped() {
    let (running, handle) = spawn_channel(testkit::config::telemetry());
    handle.send_sample(reading(patient(2), 9.0));
    handle.send_sample(reading(patient(1), 1.0));

    sleep(CALM + margin()).await;

    let snapshot = running.snapshot();
    assert_eq!(values(&snapshot.samples), vec![1.0]);
    assert_eq!(snapshot.counters.mismatched, 1);

    running.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_flush_drains_bounded_batches() {
    let (running, handle) = spawn_channel(testkit::config::telemetry());
    for sample in testkit::domain::readings(patient(1), 40) {
        handle.send_sample(sample);
    }

    sleep(CALM + margin()).await;
    assert_eq!(running.snapshot().samples.len(), 16);

    sleep(CALM).await;
    assert_eq!(running.snapshot().samples.len(), 32);

    sleep(CALM).await;
    let snapshot = running.snapshot();
    let expected: Vec<f64> = (1..=40).map(f64::from).collect();
    assert_eq!(values(&snapshot.samples), expected);
    assert_eq!(snapshot.counters.flushed, 40);

    running.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_buffer_overflow_keeps_most_recent() {
    let config = testkit::config::telemetry();
    let capacity = config.buffer_capacity;
    let (running, handle) = spawn_channel(config);
    for sample in testkit::domain::readings(patient(1), capacity + 5) {
        handle.send_sample(sample);
    }

    // Four calm batches of 16 drain the full buffer.
    sleep(CALM * 4 + margin()).await;

    let snapshot = running.snapshot();
    let expected: Vec<f64> = (6..=capacity + 5).map(|i| i as f64).collect();
    assert_eq!(values(&snapshot.samples), expected);
    assert_eq!(snapshot.counters.evicted, 5);

    running.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_visible_window_respects_count_cap() {
    let mut config = testkit::config::telemetry();
    config.retention.max_samples = 10;
    let (running, handle) = spawn_channel(config);
    sleep(margin()).await;

    for round in 0..5 {
        for i in 0..8 {
            handle.send_sample(reading(patient(1), f64::from(round * 8 + i)));
        }
        sleep(CALM).await;
        assert!(running.snapshot().samples.len() <= 10);
    }

    let snapshot = running.snapshot();
    let expected: Vec<f64> = (30..40).map(f64::from).collect();
    assert_eq!(values(&snapshot.samples), expected);

    running.stop().await;
}

// -- Adaptive cadence -----------------------------------------------------

#[tokio::test(start_paused = true)]
async fn test_cadence_switch_loses_and_duplicates_nothing() {
    let (running, handle) = spawn_channel(testkit::config::telemetry());
    for i in 1..=5 {
        handle.send_sample(reading(patient(1), f64::from(i)));
    }

    sleep(CALM + margin()).await;
    let calm = running.snapshot();
    assert_eq!(calm.cadence, CALM);
    assert!(!calm.alert);

    handle.send_sample(alert_reading(patient(1), 6.0));
    handle.send_sample(alert_reading(patient(1), 7.0));
    sleep(CALM).await;

    let alert = running.snapshot();
    assert_eq!(alert.cadence, ALERT);
    assert!(alert.alert);
    assert_eq!(values(&alert.samples), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);

    handle.send_sample(alert_reading(patient(1), 8.0));
    handle.send_sample(alert_reading(patient(1), 9.0));
    sleep(ALERT).await;

    let after = running.snapshot();
    let expected: Vec<f64> = (1..=9).map(f64::from).collect();
    assert_eq!(values(&after.samples), expected);
    assert_eq!(after.flushes, 3);
    assert_eq!(after.counters.flushed, 9);

    running.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_cadence_returns_to_calm() {
    let (running, handle) = spawn_channel(testkit::config::telemetry());
    handle.send_sample(alert_reading(patient(1), 1.0));

    sleep(CALM + margin()).await;
    assert_eq!(running.snapshot().cadence, ALERT);

    handle.send_sample(reading(patient(1), 2.0));
    sleep(ALERT).await;

    let snapshot = running.snapshot();
    assert_eq!(snapshot.cadence, CALM);
    assert!(!snapshot.alert);
    assert_eq!(values(&snapshot.samples), vec![1.0, 2.0]);

    running.stop().await;
}

// -- Connection lifecycle -------------------------------------------------

#[tokio::test(start_paused = true)]
async fn test_retry_budget_exhaustion() {
    let stream =
        ScriptedStream::new().with_connect_results(vec![Err(refused()), Err(refused()), Err(refused())]);
    let probe = stream.probe();
    let running = spawn_session(stream, testkit::config::telemetry());

    let exit = running.handle.await.unwrap();
    assert_eq!(exit.reason, ExitReason::Failed);
    assert_eq!(probe.connect_count(), 3);

    sleep(RETRY_DELAY * 10).await;
    assert_eq!(probe.connect_count(), 3);

    let snapshot = running.shared.snapshot();
    assert_eq!(snapshot.status, ConnectionStatus::Failed);
    assert_eq!(snapshot.reconnect_attempts, 3);
    assert!(snapshot
        .last_error
        .unwrap()
        .starts_with("failed to connect after 3 attempts"));
}

#[tokio::test(start_paused = true)]
async fn test_retry_counter_resets_on_success() {
    // fail, succeed, then a full budget of failures: close + two refusals.
    let stream = ScriptedStream::new()
        .with_connect_results(vec![Err(refused()), Ok(()), Err(refused()), Err(refused())])
        .with_events(vec![server_error()]);
    let probe = stream.probe();
    let running = spawn_session(stream, testkit::config::telemetry());

    let exit = running.handle.await.unwrap();

    assert_eq!(exit.reason, ExitReason::Failed);
    assert_eq!(probe.connect_count(), 4);
    assert_eq!(running.shared.snapshot().status, ConnectionStatus::Failed);
}

#[tokio::test(start_paused = true)]
async fn test_reconnect_status_is_informational() {
    let stream = ScriptedStream::new().with_connect_results(vec![Err(refused())]);
    let probe = stream.probe();
    let running = spawn_session(stream, testkit::config::telemetry());

    sleep(RETRY_DELAY / 2).await;
    let waiting = running.snapshot();
    assert_eq!(waiting.status, ConnectionStatus::Disconnected);
    assert_eq!(
        waiting.last_error.as_deref(),
        Some("reconnecting (attempt 1/3)")
    );
    assert_eq!(waiting.reconnect_attempts, 1);

    sleep(RETRY_DELAY).await;
    let connected = running.snapshot();
    assert_eq!(probe.connect_count(), 2);
    assert_eq!(connected.status, ConnectionStatus::Connected);
    assert!(connected.last_error.is_none());
    assert_eq!(connected.reconnect_attempts, 0);

    running.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_flush_continues_while_handshake_hangs() {
    let stream = ScriptedStream::new()
        .with_connect_results(vec![Ok(())])
        .with_stalled_handshakes()
        .with_events(vec![
            StreamEvent::Sample(reading(patient(1), 1.0)),
            StreamEvent::Sample(reading(patient(1), 2.0)),
            server_error(),
        ]);
    let probe = stream.probe();
    let running = spawn_session(stream, testkit::config::telemetry());

    sleep(RETRY_DELAY + margin()).await;
    assert_eq!(running.snapshot().status, ConnectionStatus::Connecting);
    assert!(running.snapshot().samples.is_empty());

    sleep(CALM * 3).await;
    let snapshot = running.snapshot();
    assert_eq!(snapshot.status, ConnectionStatus::Connecting);
    assert_eq!(values(&snapshot.samples), vec![1.0, 2.0]);
    assert!(snapshot.flushes >= 1);
    assert_eq!(probe.connect_count(), 2);

    let exit = running.stop().await;
    assert_eq!(exit.reason, ExitReason::Shutdown);
    assert!(probe.close_reasons().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_counters_published_on_connection_loss() {
    let stream = ScriptedStream::new()
        .with_connect_results(vec![Ok(())])
        .with_stalled_handshakes()
        .with_events(vec![
            StreamEvent::Sample(reading(patient(1), 1.0)),
            StreamEvent::Malformed {
                reason: "bad json".to_string(),
            },
            StreamEvent::Sample(reading(patient(1), 2.0)),
            server_error(),
        ]);
    let running = spawn_session(stream, testkit::config::telemetry());

    sleep(margin()).await;
    let snapshot = running.snapshot();
    assert_eq!(snapshot.status, ConnectionStatus::Disconnected);
    assert_eq!(snapshot.flushes, 0);
    assert_eq!(snapshot.counters.received, 2);
    assert_eq!(snapshot.counters.malformed, 1);
    assert_eq!(snapshot.counters.flushed, 0);

    running.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_abnormal_close_reconnects_same_patient() {
    let (running, handle) = spawn_channel(testkit::config::telemetry());
    sleep(margin()).await;

    handle.drop_connection(crate::port::CLOSE_ABNORMAL);
    sleep(margin()).await;
    assert_eq!(running.snapshot().status, ConnectionStatus::Disconnected);

    sleep(RETRY_DELAY).await;
    assert_eq!(running.snapshot().status, ConnectionStatus::Connected);
    assert_eq!(
        handle.probe().connected_patients(),
        vec![patient(1), patient(1)]
    );

    running.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_clean_close_is_terminal_without_error() {
    let stream =
        ScriptedStream::new().with_events(vec![StreamEvent::Sample(reading(patient(1), 1.0)), clean_close()]);
    let probe = stream.probe();
    let running = spawn_session(stream, testkit::config::telemetry());

    let exit = running.handle.await.unwrap();

    assert_eq!(exit.reason, ExitReason::ClosedClean);
    assert_eq!(probe.connect_count(), 1);
    let snapshot = running.shared.snapshot();
    assert_eq!(snapshot.status, ConnectionStatus::Disconnected);
    assert!(snapshot.last_error.is_none());
    // Buffered samples are flushed before the session ends.
    assert_eq!(values(&snapshot.samples), vec![1.0]);
}

// -- Teardown -------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn test_teardown_during_pending_reconnect() {
    let (running, handle) = spawn_channel(testkit::config::telemetry());
    for sample in testkit::domain::readings(patient(1), 3) {
        handle.send_sample(sample);
    }
    handle.drop_connection(1011);
    sleep(RETRY_DELAY / 2).await;
    assert_eq!(running.snapshot().status, ConnectionStatus::Disconnected);

    let exit = running.stop().await;

    assert_eq!(exit.reason, ExitReason::Shutdown);
    assert_eq!(exit.buffered, 0);
    assert_eq!(exit.counters.received, 3);
    sleep(RETRY_DELAY * 10).await;
    assert_eq!(handle.probe().connect_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_teardown_closes_with_normal_reason() {
    let (running, handle) = spawn_channel(testkit::config::telemetry());
    sleep(margin()).await;

    let exit = running.stop().await;

    assert_eq!(exit.reason, ExitReason::Shutdown);
    assert_eq!(handle.probe().close_reasons(), vec![TEARDOWN_REASON]);
}

#[tokio::test(start_paused = true)]
async fn test_superseded_session_stops_writing() {
    let (running, handle) = spawn_channel(testkit::config::telemetry());
    handle.send_sample(reading(patient(1), 1.0));
    running.shared.supersede(Some(patient(2)));

    let exit = running.handle.await.unwrap();

    assert_eq!(exit.reason, ExitReason::Superseded);
    assert_eq!(exit.buffered, 0);
    let snapshot = running.shared.snapshot();
    assert_eq!(snapshot.patient, Some(patient(2)));
    assert_eq!(snapshot.status, ConnectionStatus::Connecting);
    assert!(snapshot.samples.is_empty());
}
