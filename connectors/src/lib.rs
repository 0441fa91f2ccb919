pub mod coingecko;
pub mod config;

pub use config::ConnectorConfig;

use async_trait::async_trait;
use common::{
    models::{AssetSnapshot, HistorySample, TimeRange},
    Result,
};

/// Trait defining the interface for market-data API clients
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Fetch the market listing, ordered by market-cap rank
    async fn list_markets(&self) -> Result<Vec<AssetSnapshot>>;

    /// Fetch the price history of one asset over the given range, oldest sample first
    async fn price_history(&self, asset_id: &str, range: TimeRange) -> Result<Vec<HistorySample>>;
}
