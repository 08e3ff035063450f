use anyhow::Context;
use hearthd::bridge::Bridge;
use hearthd::config::Config;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.logging.filter))
        .init();

    let bridge = Bridge::assemble(&config).context("failed to assemble platforms")?;
    bridge
        .registry
        .startup_all()
        .await
        .context("platform startup failed")?;

    let loaded = bridge.load_accessories(&config.accessories).await;
    tracing::info!(loaded, configured = config.accessories.len(), "accessories loaded");

    bridge.registry.background_all().await;
    if let Some(addr) = bridge.local_addr() {
        tracing::info!(bridge = %config.bridge.name, "hearthd listening on http://{addr}");
    }

    shutdown_signal().await;
    tracing::info!("shutting down");
    bridge.registry.shutdown_all().await;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "unable to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "unable to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
