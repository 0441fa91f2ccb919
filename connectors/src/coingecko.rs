use crate::{ConnectorConfig, MarketDataSource};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use common::{
    models::{AssetSnapshot, HistorySample, TimeRange},
    Error, Result,
};
use serde::Deserialize;
use tracing::{debug, error};

const API_KEY_HEADER: &str = "x-cg-demo-api-key";

pub struct CoinGeckoConnector {
    client: reqwest::Client,
    config: ConnectorConfig,
}

impl CoinGeckoConnector {
    pub fn new(config: ConnectorConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self { client, config })
    }

    async fn get_body(&self, url: &str, params: &[(&str, String)]) -> Result<String> {
        let mut request = self.client.get(url).query(params);
        if let Some(key) = &self.config.api_key {
            request = request.header(API_KEY_HEADER, key);
        }

        let response = request.send().await.map_err(Error::HttpError)?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!("CoinGecko API error: {} - {}", status, error_text);
            return Err(Error::ApiError {
                status: status.as_u16(),
                body: error_text,
            });
        }

        Ok(response.text().await?)
    }
}

#[derive(Debug, Deserialize)]
struct CoinGeckoMarket {
    id: String,
    symbol: String,
    name: String,
    #[serde(default)]
    image: Option<String>,
    current_price: Option<f64>,
    price_change_percentage_24h: Option<f64>,
    market_cap: Option<f64>,
}

impl From<CoinGeckoMarket> for AssetSnapshot {
    fn from(m: CoinGeckoMarket) -> Self {
        Self {
            id: m.id,
            name: m.name,
            symbol: m.symbol,
            icon_ref: m.image.unwrap_or_default(),
            price: m.current_price.unwrap_or_default(),
            change_24h_pct: m.price_change_percentage_24h.unwrap_or_default(),
            market_cap: m.market_cap.unwrap_or_default(),
        }
    }
}

// market_chart returns { "prices": [[ms, price], ...], "market_caps": ..., "total_volumes": ... }
#[derive(Debug, Deserialize)]
struct CoinGeckoMarketChart {
    prices: Vec<(f64, f64)>,
}

fn parse_markets(body: &str) -> Result<Vec<AssetSnapshot>> {
    let markets: Vec<CoinGeckoMarket> = serde_json::from_str(body).map_err(|e| {
        Error::ParseError(format!("Failed to parse CoinGecko markets: {}", e))
    })?;

    Ok(markets.into_iter().map(AssetSnapshot::from).collect())
}

fn parse_market_chart(body: &str) -> Result<Vec<HistorySample>> {
    let chart: CoinGeckoMarketChart = serde_json::from_str(body).map_err(|e| {
        Error::ParseError(format!("Failed to parse CoinGecko market chart: {}", e))
    })?;

    let mut samples = chart
        .prices
        .into_iter()
        .map(|(ts, price)| -> Result<HistorySample> {
            let timestamp = Utc
                .timestamp_millis_opt(ts as i64)
                .single()
                .filter(|_| ts.is_finite())
                .ok_or_else(|| Error::ParseError(format!("Invalid sample timestamp: {}", ts)))?;
            Ok(HistorySample { timestamp, price })
        })
        .collect::<Result<Vec<_>>>()?;

    // Oldest first
    samples.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));

    Ok(samples)
}

#[async_trait]
impl MarketDataSource for CoinGeckoConnector {
    async fn list_markets(&self) -> Result<Vec<AssetSnapshot>> {
        let url = format!("{}/coins/markets", self.config.base_url);

        debug!(
            "Fetching market listing from CoinGecko: {} (per_page: {})",
            url, self.config.per_page
        );

        let body = self
            .get_body(
                &url,
                &[
                    ("vs_currency", self.config.vs_currency.clone()),
                    ("order", "market_cap_desc".to_string()),
                    ("per_page", self.config.per_page.to_string()),
                    ("page", "1".to_string()),
                    ("sparkline", "false".to_string()),
                ],
            )
            .await?;

        parse_markets(&body)
    }

    async fn price_history(&self, asset_id: &str, range: TimeRange) -> Result<Vec<HistorySample>> {
        let url = format!("{}/coins/{}/market_chart", self.config.base_url, asset_id);

        debug!(
            "Fetching price history from CoinGecko: {} (range: {}, days: {})",
            url,
            range,
            range.days_param()
        );

        let body = self
            .get_body(
                &url,
                &[
                    ("vs_currency", self.config.vs_currency.clone()),
                    ("days", range.days_param()),
                ],
            )
            .await?;

        parse_market_chart(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MARKETS: &str = r#"[
        {
            "id": "bitcoin",
            "symbol": "btc",
            "name": "Bitcoin",
            "image": "https://assets.coingecko.com/coins/images/1/large/bitcoin.png",
            "current_price": 64321.5,
            "market_cap": 1266000000000,
            "market_cap_rank": 1,
            "price_change_percentage_24h": -1.25
        },
        {
            "id": "fresh-token",
            "symbol": "frsh",
            "name": "Fresh Token",
            "image": null,
            "current_price": null,
            "market_cap": null,
            "price_change_percentage_24h": null
        }
    ]"#;

    #[test]
    fn parses_market_listing() {
        let assets = parse_markets(MARKETS).unwrap();
        assert_eq!(assets.len(), 2);

        let btc = &assets[0];
        assert_eq!(btc.id, "bitcoin");
        assert_eq!(btc.symbol, "btc");
        assert_eq!(btc.price, 64321.5);
        assert_eq!(btc.change_24h_pct, -1.25);
        assert_eq!(btc.market_cap, 1_266_000_000_000.0);
        assert!(btc.icon_ref.ends_with("bitcoin.png"));
    }

    #[test]
    fn null_numbers_decode_as_zero() {
        let assets = parse_markets(MARKETS).unwrap();
        let fresh = &assets[1];
        assert_eq!(fresh.price, 0.0);
        assert_eq!(fresh.market_cap, 0.0);
        assert_eq!(fresh.icon_ref, "");
    }

    #[test]
    fn malformed_listing_is_a_parse_error() {
        let err = parse_markets(r#"{"status": {"error_code": 429}}"#).unwrap_err();
        assert!(matches!(err, Error::ParseError(_)));
    }

    #[test]
    fn parses_market_chart_oldest_first() {
        let body = r#"{
            "prices": [[1736179200000, 101.5], [1736175600000, 100.0]],
            "market_caps": [],
            "total_volumes": []
        }"#;
        let samples = parse_market_chart(body).unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].price, 100.0);
        assert_eq!(samples[0].timestamp.timestamp_millis(), 1_736_175_600_000);
        assert_eq!(samples[1].price, 101.5);
    }

    #[test]
    fn market_chart_without_prices_is_a_parse_error() {
        let err = parse_market_chart(r#"{"error": "coin not found"}"#).unwrap_err();
        assert!(matches!(err, Error::ParseError(_)));
    }
}
