use anyhow::Context;
use db::DBService;
use server::AppState;
use services::services::{claude_api::ClaudeApiClient, storage::FileStorage};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3400);
    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:data/atelier.db".to_string());
    let asset_dir = std::env::var("ASSET_DIR").unwrap_or_else(|_| "data/assets".to_string());

    if let Some(dir) = std::path::Path::new(database_url.trim_start_matches("sqlite:")).parent() {
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(dir).context("Failed to create database directory")?;
        }
    }

    let db = DBService::new(&database_url)
        .await
        .context("Failed to initialize database")?;

    let claude = ClaudeApiClient::from_env()?;
    if claude.is_none() {
        info!("ANTHROPIC_API_KEY not set; AI generation will return fallback text");
    }

    let state = AppState::new(db, FileStorage::new(&asset_dir), claude);
    let app = server::router(state);

    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install ctrl-c handler");
}
