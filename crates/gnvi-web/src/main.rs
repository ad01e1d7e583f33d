//! GNVI Web Server
//!
//! Run with: cargo run -p gnvi-web

use tracing::info;
use tracing_subscriber::EnvFilter;

use gnvi_common::Config;
use gnvi_web::{router::build_router, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting Neural WWW Discovery server...");

    let config = Config::load()?;
    let addr = config.bind_addr();

    let state = AppState::from_config(&config);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("🚀 Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
