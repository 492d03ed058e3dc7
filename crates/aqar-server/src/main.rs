mod api;
mod middleware;

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use aqar_core::AdjacencyGraph;
use aqar_matching::{IdentityLocks, ListingCache};

use crate::{
    api::{build_app, default_rate_limit_state, AppState},
    middleware::AuthState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = aqar_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let graph = AdjacencyGraph::load(&config.districts_path)?;
    tracing::info!(
        cities = graph.city_count(),
        districts = graph.district_count(),
        "district adjacency data loaded"
    );

    let pool_config = aqar_db::PoolConfig::from_app_config(&config);
    let pool = aqar_db::connect_pool(&config.database_url, pool_config).await?;
    aqar_db::run_migrations(&pool).await?;

    let auth = AuthState::from_env(matches!(config.env, aqar_core::Environment::Development))?;
    let state = AppState {
        pool,
        graph: Arc::new(graph),
        locks: Arc::new(IdentityLocks::new()),
        listing_cache: Arc::new(ListingCache::new(Duration::from_secs(
            config.listing_cache_ttl_secs,
        ))),
    };
    let app = build_app(state, auth, default_rate_limit_state());

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
