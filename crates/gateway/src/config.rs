use common::{env_optional, env_or};
use inference::InferenceConfig;

pub use common::Environment;

/// 10 MiB, enough for a full-resolution phone photo.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub environment: Environment,
    pub addr: String,
    pub max_upload_bytes: usize,
    pub otel_endpoint: Option<String>,
    pub inference: InferenceConfig,
}

impl GatewayConfig {
    /// Load configuration from environment variables with sensible defaults
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            environment: Environment::from_env(),
            addr: env_or("GATEWAY_ADDR", "0.0.0.0:5001".to_string()),
            max_upload_bytes: env_or("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES),
            otel_endpoint: env_optional("OTEL_EXPORTER_OTLP_ENDPOINT"),
            inference: InferenceConfig::from_env()?,
        })
    }
}
