use clap::Parser;
use gpt_server::{run_server, AppState, EngineRegistry, ServerConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ServerConfig::parse();
    let registry = EngineRegistry::from_config(&config);
    if registry.is_empty() {
        tracing::warn!(
            model_path = %config.model_path.display(),
            "no models loaded; completion requests will fail"
        );
    } else {
        tracing::info!(engines = ?registry.ids().collect::<Vec<_>>(), "engines ready");
    }

    let state = AppState::new(registry, config.limits());
    run_server(state, config.addr()).await?;
    Ok(())
}
