//! Error types for the digest pipeline.
//!
//! Per-feed failures never surface as a [`DigestError`] to callers of the
//! pipeline: the fetcher converts them into an empty payload. Everything that
//! does surface ends up in the failure envelope.

use thiserror::Error;

/// Errors that can occur while building a digest.
#[derive(Debug, Error)]
pub enum DigestError {
    /// HTTP request failed (connect error, timeout, body decode)
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Remote endpoint answered with a non-success status
    #[error("Unexpected status {status} from {url}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Requested URL
        url: String,
    },

    /// Configuration file could not be loaded
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The aggregation task failed before producing a digest
    #[error("Aggregation failed: {0}")]
    Aggregation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_message() {
        let err = DigestError::Status {
            status: 503,
            url: "https://example.com/feed".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Unexpected status 503 from https://example.com/feed"
        );
    }

    #[test]
    fn test_json_conversion() {
        let parse: Result<serde_json::Value, _> = serde_json::from_str("{");
        let err: DigestError = parse.unwrap_err().into();
        assert!(err.to_string().starts_with("JSON error"));
    }
}
