use market_server::core::{Config, Server, ServerState};
use market_server::utils::logger;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let config = Config::from_env();
    let log_dir = config.log_dir();
    logger::init_logger_with_file(
        std::env::var("LOG_LEVEL").ok().as_deref(),
        log_dir.to_str(),
    );

    tracing::info!(
        environment = %config.environment,
        port = config.http_port,
        "Starting market-server"
    );

    let state = ServerState::initialize(&config)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to initialize server state: {e}"))?;

    Server::new(state)
        .run()
        .await
        .map_err(|e| anyhow::anyhow!("Server exited with error: {e}"))?;

    Ok(())
}
