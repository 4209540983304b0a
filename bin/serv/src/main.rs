use anyhow::Context;
use recall_api::{
    config::ApiConfig, metrics::init_metrics, router, state::ApiState, tracing::init_tracing,
};
use recall_db::PgReviewStore;
use tower_http::cors::CorsLayer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration from environment variables
    dotenvy::dotenv().ok();
    let config = ApiConfig::from_env()?;

    init_tracing(&config.app_env);
    let metrics = init_metrics()?;

    recall_db::ensure_database_exists(&config.database_url).await?;
    let pool = recall_db::create_pool(&config.database_url, config.db_max_connections).await?;
    recall_db::run_migrations(&pool).await?;

    let state =
        ApiState::new(PgReviewStore::new(pool), config.scheduler_config()).with_metrics(metrics);

    let app = router::app(state).layer(CorsLayer::very_permissive());

    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port))
        .await
        .with_context(|| format!("failed to bind {}:{}", config.host, config.port))?;
    tracing::info!(
        address = %listener.local_addr()?,
        environment = ?config.app_env,
        "Server running"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutting down");
}
