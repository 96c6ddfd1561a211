//! Data models shared by the feed and prediction pipelines.
//!
//! - [`FeedPayload`]: raw body (or nothing) fetched for one configured feed
//! - [`Article`]: one cleaned news item, the unit that gets deduplicated
//! - [`Digest`]: the ranked result of a run plus its counters
//! - [`Envelope`]: the JSON shape handed to HTTP and CLI callers
//! - [`PredictionMarket`]: a market that passed the signal filter
//!
//! All of these live for a single request; nothing is mutated after it is
//! built.

use crate::config::FeedSource;
use serde::{Deserialize, Serialize};

/// The outcome of fetching one feed.
///
/// `body` is `None` whenever the request failed for any reason. A failed feed
/// and an empty feed are indistinguishable downstream.
#[derive(Debug, Clone)]
pub struct FeedPayload {
    pub source: FeedSource,
    pub body: Option<String>,
}

/// A news item extracted from a feed.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Article {
    /// Cleaned headline.
    pub title: String,
    /// Article URL; the primary dedup key.
    pub link: String,
    /// Publish time in milliseconds since the Unix epoch.
    pub date: i64,
    /// Display name of the originating feed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// URL of the originating feed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Generated illustration keyed by the title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_image: Option<String>,
}

/// Ranked, deduplicated articles with the counters reported to callers.
#[derive(Debug, Clone, PartialEq)]
pub struct Digest {
    /// Articles that survived extraction and filtering.
    pub total_raw: usize,
    /// Articles left after deduplication, before the result cap.
    pub total_after_dedup: usize,
    pub articles: Vec<Article>,
}

/// Response body for every digest endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Envelope {
    Success {
        success: bool,
        /// Number of articles in this response.
        total: usize,
        total_raw: usize,
        total_after_dedup: usize,
        articles: Vec<Article>,
    },
    Failure {
        success: bool,
        error: String,
    },
}

impl Envelope {
    pub fn failure(error: impl Into<String>) -> Self {
        Envelope::Failure {
            success: false,
            error: error.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Envelope::Success { .. })
    }
}

impl From<Digest> for Envelope {
    fn from(digest: Digest) -> Self {
        Envelope::Success {
            success: true,
            total: digest.articles.len(),
            total_raw: digest.total_raw,
            total_after_dedup: digest.total_after_dedup,
            articles: digest.articles,
        }
    }
}

/// A prediction market with a strong enough signal to show.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionMarket {
    pub title: String,
    /// Probability of "yes", scaled to 0..=100.
    pub yes_price: f64,
    pub volume: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(title: &str) -> Article {
        Article {
            title: title.to_string(),
            link: "https://example.com/a".to_string(),
            date: 1_700_000_000_000,
            source: Some("Example".to_string()),
            source_url: None,
            image: None,
            ai_image: None,
        }
    }

    #[test]
    fn test_article_skips_missing_optionals() {
        let json = serde_json::to_string(&article("OpenAI ships a model")).unwrap();
        assert!(json.contains("\"source\":\"Example\""));
        assert!(!json.contains("image"));
        assert!(!json.contains("source_url"));
    }

    #[test]
    fn test_success_envelope_counts() {
        let digest = Digest {
            total_raw: 7,
            total_after_dedup: 5,
            articles: vec![article("First headline here"), article("Second headline here")],
        };
        let value = serde_json::to_value(Envelope::from(digest)).unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["total"], 2);
        assert_eq!(value["total_raw"], 7);
        assert_eq!(value["total_after_dedup"], 5);
        assert_eq!(value["articles"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_failure_envelope_shape() {
        let value = serde_json::to_value(Envelope::failure("boom")).unwrap();
        assert_eq!(value, serde_json::json!({ "success": false, "error": "boom" }));
    }

    #[test]
    fn test_envelope_deserialization() {
        let json = r#"{"success":true,"total":0,"total_raw":3,"total_after_dedup":0,"articles":[]}"#;
        let envelope: Envelope = serde_json::from_str(json).unwrap();
        assert!(envelope.is_success());

        let json = r#"{"success":false,"error":"nope"}"#;
        let envelope: Envelope = serde_json::from_str(json).unwrap();
        assert!(!envelope.is_success());
    }

    #[test]
    fn test_prediction_market_camel_case() {
        let market = PredictionMarket {
            title: "Will it rain?".to_string(),
            yes_price: 72.0,
            volume: 1234.5,
        };
        let value = serde_json::to_value(&market).unwrap();
        assert_eq!(value["yesPrice"], 72.0);
        assert_eq!(value["volume"], 1234.5);
    }
}
