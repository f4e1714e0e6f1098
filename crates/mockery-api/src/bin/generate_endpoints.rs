//! Write markdown documentation for every endpoint in a mock config.

use mockery_api::endpoints::render_endpoints;
use mockery_api::MockConfig;

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let flag = |name: &str| {
        args.iter()
            .position(|a| a == name)
            .and_then(|i| args.get(i + 1).cloned())
    };
    let config_path = flag("--config").unwrap_or_else(|| "config.json".to_string());
    let output_path = flag("--output").unwrap_or_else(|| "ENDPOINTS.md".to_string());

    let config = MockConfig::load(&config_path)?;
    let _tracing_guard = mockery_tracing::init_tracing(&config.tracing);

    let document = render_endpoints(&config, &config_path)?;
    std::fs::write(&output_path, document)?;

    tracing::info!(output = %output_path, "Endpoint documentation written");
    println!(
        "Generated documentation for {} endpoints in {}",
        config.routes.len() + 1,
        output_path
    );
    Ok(())
}
