use std::path::Path;

use crate::adapter::inbound::cli::output;
use crate::error::Result;
use crate::infrastructure::config::settings::Config;

/// Validate the configuration file without connecting.
pub fn execute_config<P: AsRef<Path>>(config_path: P) -> Result<()> {
    let path = config_path.as_ref();
    let config = Config::load(path)?;
    let telemetry = config.telemetry_config();

    output::section("Configuration Check");
    output::field("Config", path.display());
    output::success("Configuration file is valid");

    output::section("Summary");
    output::field("Stream", &config.endpoint.ws_url);
    output::field("API", &config.endpoint.api_url);
    output::field(
        "Reconnect",
        format!(
            "{} attempts, {}ms apart",
            telemetry.retry.max_attempts,
            telemetry.retry.delay.as_millis()
        ),
    );
    output::field("Buffer", format!("{} samples", telemetry.buffer_capacity));
    output::field(
        "Retention",
        format!(
            "{}s, at most {} samples",
            telemetry.retention.window.as_secs(),
            telemetry.retention.max_samples
        ),
    );

    if telemetry.flush.calm_interval == telemetry.flush.alert_interval {
        output::note("Calm and alert cadence are equal; flushing at a fixed rate");
    }
    if telemetry.flush.alert_batch_size < telemetry.flush.calm_batch_size {
        output::warning("alert_batch_size is smaller than calm_batch_size");
    }

    output::success("Configuration check complete");

    Ok(())
}
