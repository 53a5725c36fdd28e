use tracing_subscriber::{EnvFilter, fmt};
use tracing::info;

use aedes_planner::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Init logging
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))?;
    fmt().with_env_filter(filter).init();

    let rust_log = std::env::var("RUST_LOG").unwrap_or_else(|_| "<unset>".to_string());
    let config = Config::from_env();
    info!(
        target: "aedes",
        "Aedes planner starting: RUST_LOG='{}', http_port={}, auth={:?}",
        rust_log, config.http_port, config.auth_backend
    );

    aedes_planner::server::run_with_config(config).await
}
