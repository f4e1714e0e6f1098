//! mockery-api: serve canned JSON responses from a route config file.

use mockery_api::server::{self, AppState};
use mockery_api::{DispatchEngine, MockConfig};

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let config_path = args
        .iter()
        .position(|a| a == "--config")
        .and_then(|i| args.get(i + 1).cloned())
        .or_else(|| args.get(1).filter(|a| !a.starts_with('-')).cloned())
        .or_else(|| std::env::var("MOCKERY_CONFIG").ok())
        .unwrap_or_else(|| "config.json".to_string());

    // Config errors are fatal before anything else starts
    let config = MockConfig::load(&config_path)?;

    // Build the runtime first; the tonic OTLP exporter needs a reactor context
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        let tracing_guard = mockery_tracing::init_tracing(&config.tracing);

        tracing::info!(
            config_path = %config_path,
            port = config.port(),
            routes = config.routes.len(),
            otlp_export = tracing_guard.is_exporting(),
            "Starting mockery-api"
        );

        run(config).await
    })
}

async fn run(config: MockConfig) -> anyhow::Result<()> {
    let listen_addr = config.listen_address();

    // The route table is frozen here and shared read-only by every request
    let state = AppState::new(DispatchEngine::new(config.routes));

    server::run(&listen_addr, state).await
}
