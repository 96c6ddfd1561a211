//! Runtime configuration for the digest pipeline.
//!
//! Everything the pipeline treats as "constant" (feeds, stop words, the
//! promotional denylist, thresholds, caps) lives in [`Settings`] and is
//! passed in explicitly. Settings are read from an optional YAML file;
//! every field falls back to the built-in default when omitted.
//!
//! # Example
//!
//! ```yaml
//! max_articles: 30
//! dedup:
//!   title_key_words: ~
//!   similarity_threshold: 0.6
//!   short_token_len: 3
//! feeds:
//!   - url: https://techcrunch.com/category/artificial-intelligence/feed/
//!     name: TechCrunch
//! ```

use crate::error::DigestError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{info, instrument};

/// A configured syndication feed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct FeedSource {
    /// Feed URL.
    pub url: String,
    /// Display name; derived from the feed host when absent.
    #[serde(default)]
    pub name: Option<String>,
}

impl FeedSource {
    pub fn new(url: &str, name: Option<&str>) -> Self {
        Self {
            url: url.to_string(),
            name: name.map(str::to_string),
        }
    }
}

/// Top-level settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub feeds: Vec<FeedSource>,
    pub fetch: FetchSettings,
    pub filter: FilterSettings,
    pub dedup: DedupSettings,
    /// Result cap applied after deduplication.
    pub max_articles: usize,
    pub images: ImageSettings,
    pub predictions: PredictionSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            feeds: default_feeds(),
            fetch: FetchSettings::default(),
            filter: FilterSettings::default(),
            dedup: DedupSettings::default(),
            max_articles: 50,
            images: ImageSettings::default(),
            predictions: PredictionSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings from a YAML file, or the defaults when no path is given.
    #[instrument(level = "info")]
    pub fn load(path: Option<&str>) -> Result<Self, DigestError> {
        let Some(path) = path else {
            info!("No config file given; using built-in defaults");
            return Ok(Self::default());
        };
        let raw = std::fs::read_to_string(Path::new(path))?;
        let settings = Self::from_yaml(&raw)?;
        info!(
            path,
            feeds = settings.feeds.len(),
            max_articles = settings.max_articles,
            "Loaded configuration"
        );
        Ok(settings)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, DigestError> {
        let settings: Settings =
            serde_yaml::from_str(raw).map_err(|e| DigestError::Config(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), DigestError> {
        let threshold = self.dedup.similarity_threshold;
        if !(threshold > 0.0 && threshold <= 1.0) {
            return Err(DigestError::Config(format!(
                "similarity_threshold must be in (0, 1], got {threshold}"
            )));
        }
        if self.dedup.title_key_words == Some(0) {
            return Err(DigestError::Config(
                "dedup.title_key_words must be positive; use ~ for the full title".into(),
            ));
        }
        if self.dedup.topic_key_words == Some(0) {
            return Err(DigestError::Config(
                "dedup.topic_key_words must be positive; use ~ to disable the stage".into(),
            ));
        }
        if self.fetch.timeout_secs == 0 {
            return Err(DigestError::Config("fetch.timeout_secs must be positive".into()));
        }
        Ok(())
    }
}

/// Outbound request settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FetchSettings {
    pub timeout_secs: u64,
    pub user_agent: String,
    pub accept: String,
}

impl FetchSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 15,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) Chrome/120.0.0.0 Safari/537.36"
                .to_string(),
            accept: "application/rss+xml, application/xml, text/xml".to_string(),
        }
    }
}

/// Title-length and promotional-content filter.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FilterSettings {
    /// Titles with this many characters or fewer are dropped.
    pub min_title_len: usize,
    /// Case-insensitive substrings marking non-news content.
    pub denylist: Vec<String>,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            min_title_len: 10,
            denylist: to_strings(&[
                "tickets",
                "discount",
                "save up to",
                "% off",
                "promo code",
                "register now",
                "early bird",
                "last chance",
                "sponsored",
                "webinar",
                "giveaway",
                "deal of the day",
            ]),
        }
    }
}

/// How the short-title key used by exact-title dedup is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TitleKey {
    /// The whole lower-cased, trimmed title.
    Full,
    /// The first `n` lower-cased whitespace-separated tokens.
    LeadingWords(usize),
}

/// Deduplication parameters.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DedupSettings {
    /// Leading-token count of the title key; `None` keys on the full title.
    pub title_key_words: Option<usize>,
    /// Collapse articles sharing their top-N keyword set; `None` disables it.
    pub topic_key_words: Option<usize>,
    /// Minimum keyword-overlap ratio for two titles to count as one story.
    pub similarity_threshold: f64,
    /// Tokens this long or shorter are never keywords.
    pub short_token_len: usize,
    pub stop_words: Vec<String>,
}

impl DedupSettings {
    pub fn title_key(&self) -> TitleKey {
        match self.title_key_words {
            Some(n) => TitleKey::LeadingWords(n),
            None => TitleKey::Full,
        }
    }
}

impl Default for DedupSettings {
    fn default() -> Self {
        Self {
            title_key_words: Some(4),
            topic_key_words: None,
            similarity_threshold: 0.5,
            short_token_len: 2,
            stop_words: default_stop_words(),
        }
    }
}

/// Article image handling.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ImageSettings {
    pub enabled: bool,
    /// Prefix for generated images; the URL-encoded title is appended.
    pub fallback_endpoint: String,
}

impl Default for ImageSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            fallback_endpoint: "https://image.pollinations.ai/prompt/".to_string(),
        }
    }
}

/// Prediction-market listing and signal filter.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PredictionSettings {
    pub base_url: String,
    pub max_results: usize,
    /// Keep markets whose yes price differs from 50 by more than this.
    pub min_discrepancy: f64,
    /// ...or whose volume exceeds this.
    pub min_volume: f64,
}

impl Default for PredictionSettings {
    fn default() -> Self {
        Self {
            base_url: "https://gamma-api.polymarket.com".to_string(),
            max_results: 12,
            min_discrepancy: 10.0,
            min_volume: 10_000.0,
        }
    }
}

fn default_feeds() -> Vec<FeedSource> {
    vec![
        FeedSource::new(
            "https://news.google.com/rss/search?q=(OpenAI+OR+Anthropic+OR+Google+AI+OR+ChatGPT+OR+Claude+OR+%22large+language+model%22)+when:1d&hl=en-US&gl=US",
            Some("Google News"),
        ),
        FeedSource::new(
            "https://techcrunch.com/category/artificial-intelligence/feed/",
            Some("TechCrunch"),
        ),
        FeedSource::new(
            "https://www.theverge.com/rss/ai-artificial-intelligence/index.xml",
            Some("The Verge"),
        ),
        FeedSource::new("https://venturebeat.com/category/ai/feed/", Some("VentureBeat")),
    ]
}

fn default_stop_words() -> Vec<String> {
    to_strings(&[
        // function words
        "the", "and", "for", "with", "from", "into", "onto", "over", "under", "about", "after",
        "before", "this", "that", "these", "those", "its", "are", "was", "were", "been",
        "being", "has", "have", "had", "will", "would", "could", "should", "can", "may", "might",
        "not", "but", "you", "your", "our", "their", "they", "them", "his", "her", "who", "what",
        "when", "where", "why", "how", "which", "than", "then", "more", "most", "just", "also",
        "all", "any", "out", "off", "new", "now", "via", "get", "gets", "one", "two",
        "today", "here", "there", "amid", "says", "said",
        // newsroom boilerplate
        "launches", "launch", "launched", "unveils", "unveiled", "unveil", "announces",
        "announced", "introduces", "introduced", "releases", "released", "reveals", "revealed",
        "reports", "report", "reportedly", "update", "updates", "breaking", "exclusive", "news",
        "week", "latest",
    ])
}

fn to_strings(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.feeds.len(), 4);
        assert_eq!(settings.max_articles, 50);
        assert_eq!(settings.fetch.timeout(), Duration::from_secs(15));
        assert_eq!(settings.dedup.title_key(), TitleKey::LeadingWords(4));
        assert_eq!(settings.dedup.similarity_threshold, 0.5);
        assert_eq!(settings.predictions.max_results, 12);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let raw = r#"
max_articles: 30
dedup:
  title_key_words: ~
  similarity_threshold: 0.6
  short_token_len: 3
feeds:
  - url: https://example.com/feed.xml
"#;
        let settings = Settings::from_yaml(raw).unwrap();
        assert_eq!(settings.max_articles, 30);
        assert_eq!(settings.dedup.title_key(), TitleKey::Full);
        assert_eq!(settings.dedup.similarity_threshold, 0.6);
        assert_eq!(settings.dedup.short_token_len, 3);
        assert!(!settings.dedup.stop_words.is_empty());
        assert_eq!(settings.feeds, vec![FeedSource::new("https://example.com/feed.xml", None)]);
        assert_eq!(settings.fetch.timeout_secs, 15);
    }

    #[test]
    fn test_leading_words_yaml() {
        let settings = Settings::from_yaml("dedup:\n  title_key_words: 6\n").unwrap();
        assert_eq!(settings.dedup.title_key(), TitleKey::LeadingWords(6));
    }

    #[test]
    fn test_rejects_bad_threshold() {
        let err = Settings::from_yaml("dedup:\n  similarity_threshold: 1.5\n").unwrap_err();
        assert!(matches!(err, DigestError::Config(_)));
    }

    #[test]
    fn test_rejects_zero_word_keys() {
        let err = Settings::from_yaml("dedup:\n  title_key_words: 0\n").unwrap_err();
        assert!(matches!(err, DigestError::Config(ref m) if m.contains("title_key_words")));

        let err = Settings::from_yaml("dedup:\n  topic_key_words: 0\n").unwrap_err();
        assert!(matches!(err, DigestError::Config(ref m) if m.contains("topic_key_words")));

        let settings = Settings::from_yaml("dedup:\n  topic_key_words: 3\n").unwrap();
        assert_eq!(settings.dedup.topic_key_words, Some(3));
    }

    #[test]
    fn test_rejects_malformed_yaml() {
        let err = Settings::from_yaml("feeds: [not, a: mapping").unwrap_err();
        assert!(matches!(err, DigestError::Config(_)));
    }

    #[test]
    fn test_load_without_path() {
        let settings = Settings::load(None).unwrap();
        assert_eq!(settings.feeds.len(), 4);
    }
}
