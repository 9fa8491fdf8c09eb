//! Handler for the `watch` command.

use std::time::Duration;

use chrono::Local;
use serde::Serialize;
use serde_json::json;
use tokio::signal;
use tokio::time::sleep;
use tracing::info;

use crate::adapter::inbound::cli::command::WatchArgs;
use crate::adapter::inbound::cli::output;
use crate::application::telemetry::{IngestCounters, TelemetryClient, TelemetrySnapshot};
use crate::domain::{ConnectionStatus, RiskLevel, WindowStats};
use crate::error::{Error, Result};
use crate::infrastructure::config::settings::Config;
use crate::infrastructure::factory::stream::build_stream_factory;

/// Execute the watch command.
pub async fn execute(args: &WatchArgs) -> Result<()> {
    let config = Config::load_or_default(&args.config)?;
    config.logging.init_with_verbosity(output::verbosity());

    let telemetry = config.telemetry_config();
    let factory = build_stream_factory(&config.endpoint)?;
    let mut client = TelemetryClient::new(telemetry, factory)?;

    output::header(env!("CARGO_PKG_VERSION"));
    output::field("Patient", output::highlight(args.patient));
    output::field("Stream", &config.endpoint.ws_url);
    output::field(
        "Cadence",
        format!(
            "{}ms calm / {}ms alert",
            telemetry.flush.calm_interval.as_millis(),
            telemetry.flush.alert_interval.as_millis()
        ),
    );
    output::field("Window", format!("{}s", telemetry.retention.window.as_secs()));
    if let Some(secs) = args.duration {
        output::field("Duration", format!("{secs}s"));
    }
    output::section("Live");

    let mut changes = client.changes();
    client.update(Some(args.patient), true).await;

    let ctrl_c = signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let deadline = async {
        match args.duration {
            Some(secs) => sleep(Duration::from_secs(secs)).await,
            None => std::future::pending().await,
        }
    };
    tokio::pin!(deadline);

    let mut view = LiveView::default();
    let outcome = loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                info!("Shutdown signal received");
                break Ok(());
            }
            () = &mut deadline => break Ok(()),
            changed = changes.changed() => {
                if changed.is_err() {
                    break Ok(());
                }
                let snapshot = client.snapshot();
                match view.render(&snapshot) {
                    ViewOutcome::Continue => {}
                    ViewOutcome::Ended => break Ok(()),
                    ViewOutcome::Failed(message) => break Err(Error::Connection(message)),
                }
            }
        }
    };

    let counters = client.snapshot().counters;
    client.dispose().await;
    print_totals(&counters);
    outcome
}

fn print_totals(counters: &IngestCounters) {
    output::section("Totals");
    output::field("Received", counters.received);
    output::field("Flushed", counters.flushed);
    if counters.malformed > 0 || output::verbosity() > 0 {
        output::field("Malformed", counters.malformed);
    }
    if counters.mismatched > 0 || output::verbosity() > 0 {
        output::field("Mismatched", counters.mismatched);
    }
    if counters.evicted > 0 {
        output::warning(&format!(
            "{} samples dropped from a full ingest buffer",
            counters.evicted
        ));
    }
}

#[derive(Debug, PartialEq, Eq)]
enum ViewOutcome {
    Continue,
    /// The server closed the stream cleanly.
    Ended,
    Failed(String),
}

/// Renders snapshots as they change, one line per status change or flush.
#[derive(Debug, Default)]
struct LiveView {
    status: Option<(ConnectionStatus, Option<String>)>,
    flushes: u64,
    connected_once: bool,
}

impl LiveView {
    fn render(&mut self, snapshot: &TelemetrySnapshot) -> ViewOutcome {
        let now = Local::now().format("%H:%M:%S").to_string();

        let status = (snapshot.status, snapshot.last_error.clone());
        if self.status.as_ref() != Some(&status) {
            output::status(&now, snapshot.status, snapshot.last_error.as_deref());
            self.status = Some(status);
        }

        if snapshot.flushes > self.flushes {
            self.flushes = snapshot.flushes;
            let summary = FlushSummary::from_snapshot(snapshot);
            output::flush(&now, summary.risk, &summary.message(), summary.payload());
        }

        match snapshot.status {
            ConnectionStatus::Connected => {
                self.connected_once = true;
                ViewOutcome::Continue
            }
            ConnectionStatus::Failed => ViewOutcome::Failed(
                snapshot
                    .last_error
                    .clone()
                    .unwrap_or_else(|| "stream failed".to_string()),
            ),
            ConnectionStatus::Disconnected
                if self.connected_once && snapshot.last_error.is_none() =>
            {
                ViewOutcome::Ended
            }
            _ => ViewOutcome::Continue,
        }
    }
}

/// What one flush looks like to the operator.
#[derive(Debug, Clone, Serialize)]
struct FlushSummary {
    samples: usize,
    stats: WindowStats,
    risk: RiskLevel,
    alert: bool,
    cadence_ms: u64,
    flushes: u64,
    counters: IngestCounters,
}

impl FlushSummary {
    fn from_snapshot(snapshot: &TelemetrySnapshot) -> Self {
        let stats = WindowStats::from_samples(&snapshot.samples);
        Self {
            samples: snapshot.samples.len(),
            stats,
            risk: RiskLevel::assess(snapshot.alert, &stats),
            alert: snapshot.alert,
            cadence_ms: snapshot.cadence.as_millis() as u64,
            flushes: snapshot.flushes,
            counters: snapshot.counters,
        }
    }

    fn message(&self) -> String {
        format!(
            "{:>5} samples  mean {:>8.2}  std {:>7.2}  range [{:.1}, {:.1}]  {}",
            self.samples,
            self.stats.mean,
            self.stats.std_dev,
            self.stats.min,
            self.stats.max,
            output::muted(format!("{}ms", self.cadence_ms)),
        )
    }

    fn payload(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_else(|_| json!({ "samples": self.samples }))
    }
}
