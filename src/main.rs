use coin_market_sync::{
    create_router, AppState, CoinRepository, DexScreenerClient, JsonFileCoinRepository,
    SyncConfig, SyncOrchestrator, SyncScheduler,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file (if present)
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "coin_market_sync=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = SyncConfig::from_env();
    let violations = config.validate();
    if !violations.is_empty() {
        for violation in &violations {
            tracing::error!("❌ Invalid configuration: {}", violation);
        }
        std::process::exit(1);
    }

    tracing::info!(
        "⚙️  Sync every {} min, min refresh {} min, batch size {}",
        config.sync_interval_minutes,
        config.min_sync_interval_minutes,
        config.batch_size
    );

    // Record store
    let repository: Arc<dyn CoinRepository> = Arc::new(JsonFileCoinRepository::with_env_config());

    // Upstream client and sync engine
    let client = DexScreenerClient::from_config(config.clone())?;
    let orchestrator = Arc::new(SyncOrchestrator::new(client, repository.clone()));

    // Background scheduler
    let scheduler = Arc::new(SyncScheduler::new(orchestrator.clone(), &config).await?);
    scheduler.start().await?;

    let app = create_router(AppState {
        orchestrator,
        scheduler: scheduler.clone(),
        repository,
    });

    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:3000".to_string());
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("🚀 Coin market sync server running on http://{}", addr);
    tracing::info!("📚 Swagger UI available at http://{}/swagger-ui", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("🛑 Shutting down scheduler");
    scheduler.shutdown().await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
