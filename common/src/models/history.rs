use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::Error;

/// Selectable chart time ranges
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TimeRange {
    #[serde(rename = "1D")]
    OneDay,
    #[default]
    #[serde(rename = "1W")]
    OneWeek,
    #[serde(rename = "1M")]
    OneMonth,
    #[serde(rename = "6M")]
    SixMonths,
    #[serde(rename = "1Y")]
    OneYear,
    #[serde(rename = "ALL")]
    All,
}

/// How far back a history request reaches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookback {
    Days(u32),
    Max,
}

impl TimeRange {
    /// All ranges, in the order they are offered to the user.
    pub const ALL: [TimeRange; 6] = [
        TimeRange::OneDay,
        TimeRange::OneWeek,
        TimeRange::OneMonth,
        TimeRange::SixMonths,
        TimeRange::OneYear,
        TimeRange::All,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            TimeRange::OneDay => "1D",
            TimeRange::OneWeek => "1W",
            TimeRange::OneMonth => "1M",
            TimeRange::SixMonths => "6M",
            TimeRange::OneYear => "1Y",
            TimeRange::All => "ALL",
        }
    }

    pub fn lookback(&self) -> Lookback {
        match self {
            TimeRange::OneDay => Lookback::Days(1),
            TimeRange::OneWeek => Lookback::Days(7),
            TimeRange::OneMonth => Lookback::Days(30),
            TimeRange::SixMonths => Lookback::Days(180),
            TimeRange::OneYear => Lookback::Days(365),
            TimeRange::All => Lookback::Max,
        }
    }

    /// The lookback rendered as the history endpoint's `days` parameter.
    pub fn days_param(&self) -> String {
        match self.lookback() {
            Lookback::Days(days) => days.to_string(),
            Lookback::Max => "max".to_string(),
        }
    }
}

impl std::fmt::Display for TimeRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TimeRange {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TimeRange::ALL
            .into_iter()
            .find(|range| range.label().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                Error::ParseError(format!(
                    "Unknown time range: {}. Supported ranges: 1D, 1W, 1M, 6M, 1Y, ALL",
                    s
                ))
            })
    }
}

/// A single point on a price chart
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistorySample {
    pub timestamp: DateTime<Utc>,
    /// Price in USD
    pub price: f64,
}

/// Price history for exactly one asset and range: the pair it was requested for.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistorySeries {
    pub asset_id: String,
    pub range: TimeRange,
    /// Samples ordered by ascending timestamp
    pub samples: Vec<HistorySample>,
}

impl HistorySeries {
    pub fn is_for(&self, asset_id: &str, range: TimeRange) -> bool {
        self.asset_id == asset_id && self.range == range
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_range_is_one_week() {
        assert_eq!(TimeRange::default(), TimeRange::OneWeek);
    }

    #[test]
    fn days_param_follows_lookback() {
        assert_eq!(TimeRange::OneDay.days_param(), "1");
        assert_eq!(TimeRange::SixMonths.days_param(), "180");
        assert_eq!(TimeRange::All.days_param(), "max");
    }

    #[test]
    fn parses_labels_case_insensitively() {
        assert_eq!("1m".parse::<TimeRange>().unwrap(), TimeRange::OneMonth);
        assert_eq!("ALL".parse::<TimeRange>().unwrap(), TimeRange::All);
        assert!(matches!(
            "2W".parse::<TimeRange>(),
            Err(Error::ParseError(_))
        ));
    }

    #[test]
    fn serde_uses_wire_labels() {
        let json = serde_json::to_string(&TimeRange::SixMonths).unwrap();
        assert_eq!(json, "\"6M\"");
        let back: TimeRange = serde_json::from_str("\"1Y\"").unwrap();
        assert_eq!(back, TimeRange::OneYear);
    }
}
