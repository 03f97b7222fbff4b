use crate::config::GatewayConfig;
use common::TelemetryGuard;

const SERVICE_NAME: &str = "landmark-gateway";

/// Install OTLP export when a collector is configured, plain logging
/// otherwise. Keep the returned guard alive for the life of the process.
pub fn setup_logging(config: &GatewayConfig) -> anyhow::Result<Option<TelemetryGuard>> {
    match &config.otel_endpoint {
        Some(endpoint) => {
            let guard = TelemetryGuard::init(SERVICE_NAME, endpoint, config.environment)?;
            tracing::info!(endpoint = %endpoint, "OpenTelemetry export enabled");
            Ok(Some(guard))
        }
        None => {
            common::setup_logging(config.environment);
            Ok(None)
        }
    }
}
