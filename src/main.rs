mod application;
mod domain;
mod infrastructure;
mod presentation;

use tokio::sync::watch;

use crate::infrastructure::{AppConfig, AppContainer};
use crate::presentation::http::HttpServer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::from_env()?;
    tracing::info!("Starting knowledge service: {}", config.summary());

    let container = AppContainer::new(config).await?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let reaper = container.upload_reaper.clone();
    let reaper_task = tokio::spawn(async move { reaper.run(shutdown_rx).await });

    let result = HttpServer::new(&container).run(shutdown_signal()).await;

    let _ = shutdown_tx.send(true);
    if let Err(e) = reaper_task.await {
        tracing::error!("Upload reaper task failed: {}", e);
    }

    result
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, draining requests");
}
