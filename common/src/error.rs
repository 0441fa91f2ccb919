use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP request error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Market data API error: {status} - {body}")]
    ApiError { status: u16, body: String },

    #[error("Parsing error: {0}")]
    ParseError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Coarse classification of a failed fetch, as shown to the presentation layer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Transport, timeout or upstream status failure
    Network,
    /// The response arrived but did not have the expected shape
    Decode,
}

/// Cloneable record of the most recent failed fetch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FetchFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchFailure {
    pub fn network(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Network,
            message: message.into(),
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Decode,
            message: message.into(),
        }
    }
}

impl From<&Error> for FetchFailure {
    fn from(err: &Error) -> Self {
        let kind = match err {
            Error::HttpError(e) if e.is_decode() => FailureKind::Decode,
            Error::ParseError(_) => FailureKind::Decode,
            _ => FailureKind::Network,
        };

        Self {
            kind,
            message: err.to_string(),
        }
    }
}

impl From<Error> for FetchFailure {
    fn from(err: Error) -> Self {
        FetchFailure::from(&err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_errors_are_decode_failures() {
        let failure = FetchFailure::from(Error::ParseError("missing field `prices`".into()));
        assert_eq!(failure.kind, FailureKind::Decode);
        assert!(failure.message.contains("missing field"));
    }

    #[test]
    fn upstream_status_is_a_network_failure() {
        let failure = FetchFailure::from(Error::ApiError {
            status: 429,
            body: "rate limited".into(),
        });
        assert_eq!(failure.kind, FailureKind::Network);
        assert_eq!(failure.message, "Market data API error: 429 - rate limited");
    }
}
