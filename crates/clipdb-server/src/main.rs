mod api;
mod middleware;

use std::sync::Arc;

use clipdb_core::Environment;
use clipdb_jobs::{AnalyticsService, PgStore, ServiceSettings};
use clipdb_scraper::ApifyClient;
use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, AppState},
    middleware::{AuthState, RateLimitState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = clipdb_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = clipdb_db::PoolConfig::from_app_config(&config);
    let pool = clipdb_db::connect_pool(&config.database_url, pool_config).await?;
    let applied = clipdb_db::run_migrations(&pool).await?;
    tracing::info!(applied, "migrations up to date");

    let remote = Arc::new(ApifyClient::from_config(&config)?);
    let store = Arc::new(PgStore::new(pool.clone()));
    let service = AnalyticsService::new(store, remote, ServiceSettings::from_config(&config));

    let auth = AuthState::from_config(&config)?;
    let rate_limit = RateLimitState::from_config(&config);
    let state = AppState {
        service,
        pool: Some(pool),
        expose_internal_errors: config.env != Environment::Production,
    };
    let app = build_app(state, auth, rate_limit);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, env = %config.env, "clipdb-server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
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

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
