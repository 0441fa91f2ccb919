use common::{Error, Result};
use std::time::Duration;

/// Configuration for the market view synchronizer
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Period between listing polls; the first poll fires immediately
    pub poll_interval: Duration,
    /// How many top-ranked assets are displayed initially
    pub display_count: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(60),
            display_count: 4,
        }
    }
}

impl SyncConfig {
    /// Create a synchronizer configuration from environment variables, falling back to defaults
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let poll_interval = match std::env::var("SYNC_POLL_INTERVAL_SECS") {
            Ok(raw) => Duration::from_secs(parse_var("SYNC_POLL_INTERVAL_SECS", &raw)?),
            Err(_) => defaults.poll_interval,
        };
        if poll_interval.is_zero() {
            return Err(Error::ConfigError(
                "SYNC_POLL_INTERVAL_SECS must be greater than zero".to_string(),
            ));
        }

        let display_count = match std::env::var("SYNC_DISPLAY_COUNT") {
            Ok(raw) => parse_var("SYNC_DISPLAY_COUNT", &raw)?,
            Err(_) => defaults.display_count,
        };

        Ok(Self {
            poll_interval,
            display_count,
        })
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| Error::ConfigError(format!("{} is not a valid number: {}", name, raw)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_poll_every_minute_with_four_assets() {
        let config = SyncConfig::default();
        assert_eq!(config.poll_interval, Duration::from_secs(60));
        assert_eq!(config.display_count, 4);
    }

    #[test]
    fn parse_var_reports_the_variable() {
        let err = parse_var::<u64>("SYNC_DISPLAY_COUNT", "four").unwrap_err();
        assert!(err.to_string().contains("SYNC_DISPLAY_COUNT"));
        assert_eq!(parse_var::<usize>("SYNC_DISPLAY_COUNT", " 6 ").unwrap(), 6);
    }
}
