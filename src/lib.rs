pub mod api;
pub mod config;
pub mod error;
pub mod fetch;
pub mod page;
pub mod record;
pub mod state;
pub mod telemetry;

use std::sync::Arc;

use config::Config;
use state::AppState;

pub async fn run() {
    telemetry::init_logging();
    telemetry::init(Arc::new(telemetry::TracingSink));

    let config = Config::from_env().unwrap_or_else(|e| {
        tracing::error!(%e, "failed to load config");
        std::process::exit(1);
    });

    let app = AppState::new(&config).unwrap_or_else(|e| {
        tracing::error!(%e, "failed to build http client");
        std::process::exit(1);
    });

    tracing::info!(
        base_url = %config.api_base_url,
        pages = config.pages.len(),
        "serving detail pages"
    );

    api::run_server(app, &config.listen_addr).await
}
