//! Title Odds — league table tracker and champion probability estimator.
//!
//! Entry point. Loads configuration, initialises structured logging,
//! opens the configured club store and serves the dashboard until Ctrl+C.

use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use title_odds::config::AppConfig;
use title_odds::dashboard::{self, DashboardState};
use title_odds::store;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let cfg = AppConfig::load_default()?;

    init_logging();

    info!(
        backend = ?cfg.storage.backend,
        host = %cfg.server.host,
        port = cfg.server.port,
        "Title Odds starting up"
    );

    let store = store::open_store(&cfg.storage).await?;
    info!(store = store.name(), "Club store ready");

    let addr = cfg.server.bind_addr()?;
    dashboard::serve(Arc::new(DashboardState::new(store)), addr).await
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("title_odds=info,tower_http=debug"));

    let json_logging = std::env::var("TITLE_ODDS_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
