mod asset;
mod history;

pub use asset::AssetSnapshot;
pub use history::{HistorySample, HistorySeries, Lookback, TimeRange};
