use tracing::{error, info};

use bridge_module::service::{run_server, BotConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt().with_target(false).init();

    let config = match BotConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!("talk bot config error: {}", err);
            return Err(err.into());
        }
    };
    info!("talk bot config loaded");

    run_server(config, shutdown_signal()).await
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("failed to listen for ctrl-c: {}", err);
        std::future::pending::<()>().await;
    }
    info!("talk bot shutting down");
}
