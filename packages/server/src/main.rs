use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use common::storage::filesystem::FilesystemImageStore;
use tracing::{Level, info};

use blog_server::config::AppConfig;
use blog_server::database::init_db;
use blog_server::state::AppState;
use blog_server::utils::revocation::RevocationList;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let db = init_db(&config.database.url)
        .await
        .context("Failed to initialize database")?;

    let images = FilesystemImageStore::new(
        config.storage.static_dir.clone(),
        config.storage.max_upload_size,
    )
    .await
    .context("Failed to initialize image storage")?;

    let revoked = Arc::new(RevocationList::new());
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;

    let state = AppState {
        db,
        config,
        images: Arc::new(images),
        revoked: revoked.clone(),
    };
    let app = blog_server::build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server running at http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    revoked.clear();
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
