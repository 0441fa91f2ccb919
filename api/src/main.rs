mod config;
mod handler;

use axum::{
    routing::{get, post, put},
    Router,
};
use config::ApiConfig;
use connectors::{coingecko::CoinGeckoConnector, ConnectorConfig, MarketDataSource};
use std::sync::Arc;
use synchronizer::{SyncConfig, SyncHandle, Synchronizer};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn router(sync: SyncHandle) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/v1/view", get(handler::get_view))
        .route("/api/v1/assets", get(handler::list_assets))
        .route("/api/v1/tickers", get(handler::list_tickers))
        .route("/api/v1/ranges", get(handler::list_ranges))
        .route("/api/v1/chart", get(handler::get_chart))
        .route("/api/v1/selection", put(handler::put_selection))
        .route("/api/v1/range", put(handler::put_range))
        .route("/api/v1/display/:id/toggle", post(handler::toggle_display))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(sync)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting market dashboard API");

    let api_config = ApiConfig::from_env();
    let connector_config = ConnectorConfig::from_env()?;
    let sync_config = SyncConfig::from_env()?;

    let source: Arc<dyn MarketDataSource> = Arc::new(CoinGeckoConnector::new(connector_config)?);
    let sync = Synchronizer::new(source, sync_config).spawn();

    let addr = api_config.socket_addr()?;
    info!("Listening on {}", addr);

    axum::Server::bind(&addr)
        .serve(router(sync.clone()).into_make_service())
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await?;

    sync.shutdown().await?;
    info!("Market dashboard API stopped");

    Ok(())
}
