use std::time::Duration;

use tokio::time::timeout;

use crate::adapter::inbound::cli::command::ConnectionArgs;
use crate::adapter::inbound::cli::output;
use crate::adapter::outbound::websocket::{patient_endpoint, WebSocketTelemetryStream};
use crate::domain::PatientId;
use crate::error::{Error, Result};
use crate::infrastructure::config::settings::Config;
use crate::port::TelemetryStream;

/// Test REST and stream connectivity to the server.
pub async fn execute_connection(args: &ConnectionArgs) -> Result<()> {
    let config = Config::load_or_default(&args.config)?;
    let api_url = config.endpoint.api_url()?;
    let stream_url = config.endpoint.stream_url()?;
    let limit = Duration::from_secs(args.timeout.max(1));

    output::section("Connection Check");
    output::field("API", &api_url);
    output::field("Stream", patient_endpoint(&stream_url, args.patient)?);
    output::field("Timeout", format!("{}s", limit.as_secs()));

    let pb = output::spinner("Checking REST API...");
    match verify_rest(api_url.as_str(), limit).await {
        Ok(()) => output::spinner_success(&pb, "REST API reachable"),
        Err(e) => {
            output::spinner_fail(&pb, "REST API unreachable");
            return Err(e);
        }
    }

    let pb = output::spinner("Checking live stream...");
    match verify_stream(WebSocketTelemetryStream::new(stream_url), args.patient, limit).await {
        Ok(()) => output::spinner_success(&pb, "Live stream handshake succeeded"),
        Err(e) => {
            output::spinner_fail(&pb, "Live stream handshake failed");
            return Err(e);
        }
    }

    output::success("Connection checks passed");

    Ok(())
}

async fn verify_rest(api_url: &str, limit: Duration) -> Result<()> {
    let client = reqwest::Client::builder().timeout(limit).build()?;
    let response = client
        .get(api_url)
        .send()
        .await
        .map_err(|error| Error::Connection(error.to_string()))?;

    if response.status().is_success() {
        Ok(())
    } else {
        Err(Error::Connection(format!(
            "REST API returned non-success status: {}",
            response.status()
        )))
    }
}

async fn verify_stream(
    mut stream: impl TelemetryStream,
    patient: PatientId,
    limit: Duration,
) -> Result<()> {
    timeout(limit, stream.connect(patient))
        .await
        .map_err(|_| Error::Connection(format!("handshake timed out after {}s", limit.as_secs())))??;
    stream.close("connection check").await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::domain::patient;
    use crate::testkit::stream::{refused, ScriptedStream};

    #[tokio::test]
    async fn test_stream_probe_connects_and_closes() {
        let stream = ScriptedStream::new();
        let probe = stream.probe();

        verify_stream(stream, patient(4), Duration::from_secs(1))
            .await
            .unwrap();

        assert_eq!(probe.connected_patients(), vec![patient(4)]);
        assert_eq!(probe.close_reasons(), vec!["connection check"]);
    }

    #[tokio::test]
    async fn test_stream_probe_reports_refusal() {
        let stream = ScriptedStream::new().with_connect_results(vec![Err(refused())]);

        let result = verify_stream(stream, patient(4), Duration::from_secs(1)).await;

        assert!(matches!(result, Err(Error::Connection(_))));
    }
}
