use serde::{Deserialize, Serialize};
use thiserror::Error;

/// All errors generated in `spike-scanner`.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Deserialize, Serialize, Error)]
pub enum ScanError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("unexpected HTTP status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("kline series is empty")]
    EmptySeries,

    #[error("kline series has no prior intervals to average")]
    InsufficientHistory,

    #[error("arithmetic overflow: {0}")]
    Overflow(String),

    #[error("symbol discovery failed: {0}")]
    Discovery(Box<ScanError>),
}

impl ScanError {
    /// Short label used when grouping skipped symbols.
    pub fn kind(&self) -> &'static str {
        match self {
            ScanError::Request(_) => "request",
            ScanError::Status { .. } => "status",
            ScanError::Decode(_) => "decode",
            ScanError::EmptySeries => "empty_series",
            ScanError::InsufficientHistory => "insufficient_history",
            ScanError::Overflow(_) => "overflow",
            ScanError::Discovery(_) => "discovery",
        }
    }

    /// Determine if an error originated on the wire rather than in the returned data.
    #[allow(clippy::match_like_matches_macro)]
    pub fn is_transport(&self) -> bool {
        match self {
            ScanError::Request(_) | ScanError::Status { .. } => true,
            ScanError::Discovery(inner) => inner.is_transport(),
            _ => false,
        }
    }
}

impl From<reqwest::Error> for ScanError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_decode() {
            Self::Decode(value.to_string())
        } else {
            Self::Request(value.to_string())
        }
    }
}

impl From<serde_json::Error> for ScanError {
    fn from(value: serde_json::Error) -> Self {
        Self::Decode(value.to_string())
    }
}
