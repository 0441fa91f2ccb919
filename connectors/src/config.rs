use common::{Error, Result};
use std::time::Duration;

pub const COINGECKO_API_URL: &str = "https://api.coingecko.com/api/v3";

/// Configuration for the CoinGecko connector
#[derive(Debug, Clone)]
pub struct ConnectorConfig {
    /// Base URL of the market-data API
    pub base_url: String,
    /// Quote currency for prices
    pub vs_currency: String,
    /// Number of assets requested per listing poll
    pub per_page: u32,
    /// Timeout applied to every request
    pub request_timeout: Duration,
    /// Optional demo API key
    pub api_key: Option<String>,
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            base_url: COINGECKO_API_URL.to_string(),
            vs_currency: "usd".to_string(),
            per_page: 20,
            request_timeout: Duration::from_secs(10),
            api_key: None,
        }
    }
}

impl ConnectorConfig {
    /// Create a connector configuration from environment variables, falling back to defaults
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let base_url = std::env::var("COINGECKO_API_URL").unwrap_or(defaults.base_url);
        let vs_currency = std::env::var("COINGECKO_VS_CURRENCY")
            .map(|c| c.to_lowercase())
            .unwrap_or(defaults.vs_currency);
        let per_page = match std::env::var("COINGECKO_PER_PAGE") {
            Ok(raw) => raw.parse().map_err(|_| {
                Error::ConfigError(format!("COINGECKO_PER_PAGE is not a number: {}", raw))
            })?,
            Err(_) => defaults.per_page,
        };
        let request_timeout = match std::env::var("COINGECKO_TIMEOUT_SECS") {
            Ok(raw) => Duration::from_secs(raw.parse().map_err(|_| {
                Error::ConfigError(format!("COINGECKO_TIMEOUT_SECS is not a number: {}", raw))
            })?),
            Err(_) => defaults.request_timeout,
        };
        let api_key = std::env::var("COINGECKO_API_KEY")
            .ok()
            .filter(|key| !key.is_empty());

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            vs_currency,
            per_page,
            request_timeout,
            api_key,
        })
    }
}
