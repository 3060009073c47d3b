use anyhow::Context;
use rollcall::{
    utils::{config::Config, logging::init_tracing},
    Application,
};
use tokio::signal;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let config = Config::new().context("Failed to load configuration")?;
    let _log_guard = init_tracing(&config.node).context("Failed to initialize logging")?;

    info!("Starting rollcall v{} ({})", env!("CARGO_PKG_VERSION"), config.node.id);

    let app = Application::new(config).await.map_err(|e| {
        error!("Failed to initialize application: {}", e);
        e
    })?;

    app.start().await.map_err(|e| {
        error!("Failed to start application: {}", e);
        e
    })?;

    // Handle shutdown signals
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

    tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                info!("Received shutdown signal");
                let _ = shutdown_tx.send(());
            }
            Err(err) => {
                error!("Failed to listen for shutdown signal: {}", err);
            }
        }
    });

    let _ = shutdown_rx.await;

    if let Err(e) = app.shutdown().await {
        error!("Error during shutdown: {}", e);
    }

    Ok(())
}
