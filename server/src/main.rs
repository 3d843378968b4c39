//! Palengke marketplace server binary.
//!
//! Parses CLI/env configuration, opens the SQLite store (running
//! migrations on startup), and serves the REST API.

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use palengke_server::config::Cli;
use palengke_server::{router, AppState, Store};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("palengke_server=info,tower_http=warn")),
        )
        .init();

    let cli = Cli::parse();
    if cli.jwt_secret == "palengke-dev-secret" {
        tracing::warn!("running with the default JWT secret; set JWT_SECRET in production");
    }

    let store = Store::connect(&cli.database)
        .await
        .with_context(|| format!("opening database at {}", cli.database))?;
    let state = AppState::new(store, &cli.jwt_secret, cli.bcrypt_cost);
    let app = router(state);

    let addr = format!("{}:{}", cli.host, cli.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!(%addr, database = %cli.database, "palengke server listening");
    axum::serve(listener, app).await.context("server failed")?;
    Ok(())
}
