use std::sync::Arc;

use tracing_subscriber::EnvFilter;
use watchwise_api::{
    api::{cors_layer, create_router, AppState},
    auth::GoTrueAuth,
    config::Config,
    db::{create_pool, create_redis_client, run_migrations, Cache, PgRepository},
    services::providers::{TmdbClient, TmdbCredentials},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("watchwise_api=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    run_migrations(&pool).await?;
    tracing::info!("Database ready");

    let redis_client = create_redis_client(&config.redis_url)?;
    let (cache, cache_handle) = Cache::new(redis_client).await;

    let credentials = TmdbCredentials::from_config(
        config.tmdb_read_token.clone(),
        config.tmdb_api_key.clone(),
    );
    let metadata = TmdbClient::new(cache, config.tmdb_api_url.clone(), credentials);

    let auth = GoTrueAuth::new(
        config.auth_url.clone(),
        config.auth_anon_key.clone(),
        config.auth_service_role_key.clone(),
    );

    let state = Arc::new(AppState::new(
        Arc::new(PgRepository::new(pool)),
        Arc::new(auth),
        Arc::new(metadata),
    ));

    let app = create_router(state).layer(cors_layer(config.cors_origin.as_deref()));

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    cache_handle.shutdown().await;
    tracing::info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}
