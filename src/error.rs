//! Errors raised at the price-feed and device-control boundaries

use thiserror::Error;

/// Failure fetching or decoding the day-ahead tariff feed
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("price feed request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("price feed returned HTTP {0}")]
    Status(reqwest::StatusCode),

    #[error("price feed response could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid tariff record {index}: {reason}")]
    InvalidRecord { index: usize, reason: String },
}

/// Failure talking to the inverter control API
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("device API request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("device API returned HTTP {status} for {path}")]
    Status {
        path: &'static str,
        status: reqwest::StatusCode,
    },

    #[error("login response carried no session cookie")]
    NoSessionCookie,

    #[error("device rejected {command}: {message}")]
    Rejected {
        command: &'static str,
        message: String,
    },
}
