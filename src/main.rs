use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;

use cultural_navigator::api;
use cultural_navigator::config::Config;
use cultural_navigator::redis::RedisManager;
use cultural_navigator::repository::RedisPostRepository;
use cultural_navigator::service::NavigatorService;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing to stderr so stdout stays clean for tooling
    tracing_subscriber::fmt()
        .with_target(false)
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .init();

    // Load configuration
    let config = Config::load();

    // Initialize RedisManager and the anonymous post store
    let redis_manager = Arc::new(RedisManager::new_with_config(&config).await?);
    let repository = Arc::new(RedisPostRepository::new(
        redis_manager,
        config.server.name.clone(),
    ));

    // Create service
    let service = Arc::new(NavigatorService::new(&config, repository)?);

    let bind: SocketAddr = config
        .server
        .bind
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid server.bind {}: {e}", config.server.bind))?;

    let router = api::router(service);

    let listener = tokio::net::TcpListener::bind(bind).await?;
    tracing::info!(%bind, "Starting Cultural Navigator HTTP server");
    axum::serve(listener, router).await?;
    Ok(())
}
