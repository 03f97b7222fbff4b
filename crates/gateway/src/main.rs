use gateway::{config::GatewayConfig, logging::setup_logging, routes::run_server, state::AppState};
use inference::LocatorService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = GatewayConfig::from_env()?;
    let _telemetry = setup_logging(&config)?;

    tracing::info!(
        environment = config.environment.as_str(),
        addr = %config.addr,
        "Landmark gateway starting"
    );

    // Model loading is blocking file IO plus graph optimisation
    let inference_config = config.inference.clone();
    let service =
        tokio::task::spawn_blocking(move || LocatorService::from_config(&inference_config))
            .await??;

    run_server(&config, AppState::new(service)).await
}
