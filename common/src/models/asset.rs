use serde::{Deserialize, Serialize};

/// One market asset as reported by a single listing poll.
///
/// Snapshots are immutable; a later poll replaces the whole record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssetSnapshot {
    /// Stable identifier for the asset (e.g., "bitcoin", "ethereum")
    pub id: String,
    /// Human-readable name (e.g., "Bitcoin")
    pub name: String,
    /// Ticker symbol as returned upstream (e.g., "btc")
    pub symbol: String,
    /// URL of the asset icon
    pub icon_ref: String,
    /// Current price in USD
    pub price: f64,
    /// Signed percentage change over the last 24h
    pub change_24h_pct: f64,
    /// Market capitalisation in USD
    pub market_cap: f64,
}

impl AssetSnapshot {
    /// Case-insensitive substring match on name or symbol.
    pub fn matches(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        self.name.to_lowercase().contains(&term) || self.symbol.to_lowercase().contains(&term)
    }
}
