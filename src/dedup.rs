//! Near-duplicate story collapsing.
//!
//! Input must already be sorted newest first; every stage keeps the first
//! article it sees for a given key, so the newest copy of a story wins and
//! relative order is never changed.
//!
//! Stages, in order:
//!
//! 1. **Link**: exact `link` equality.
//! 2. **Title key**: full lower-cased title, or its first N tokens.
//! 3. **Topic key** (optional): the first N keywords, sorted and joined.
//! 4. **Keyword overlap**: an article is dropped when its keyword set
//!    overlaps any accepted article's set by at least the threshold, measured
//!    against the smaller of the two sets. Both sets need two or more
//!    keywords to be compared at all.
//!
//! Stage 4 is a linear scan over the accepted list, quadratic overall. Feeds
//! yield tens of items, so that is fine; a keyword-to-article index would be
//! the way to scale it without changing the predicate.

use crate::config::{DedupSettings, TitleKey};
use crate::models::Article;
use itertools::Itertools;
use std::collections::HashSet;
use tracing::debug;

/// Common-keyword count divided by the size of the smaller set.
pub fn overlap_ratio(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    let smaller = a.len().min(b.len());
    if smaller == 0 {
        return 0.0;
    }
    let common = a.intersection(b).count();
    common as f64 / smaller as f64
}

/// Whether two keyword sets describe the same story.
pub fn is_similar(a: &HashSet<String>, b: &HashSet<String>, threshold: f64) -> bool {
    a.len() >= 2 && b.len() >= 2 && overlap_ratio(a, b) >= threshold
}

/// Key used by the exact-title stage.
pub fn title_key(title: &str, key: TitleKey) -> String {
    match key {
        TitleKey::Full => title.trim().to_lowercase(),
        TitleKey::LeadingWords(n) => title.to_lowercase().split_whitespace().take(n).join(" "),
    }
}

/// Runs the dedup stages with one set of settings.
#[derive(Debug)]
pub struct Deduplicator<'a> {
    settings: &'a DedupSettings,
    stop_words: HashSet<String>,
}

impl<'a> Deduplicator<'a> {
    pub fn new(settings: &'a DedupSettings) -> Self {
        let stop_words = settings
            .stop_words
            .iter()
            .map(|w| w.to_lowercase())
            .collect();
        Self {
            settings,
            stop_words,
        }
    }

    /// Distinct keywords of a title, in title order.
    pub fn keywords(&self, title: &str) -> Vec<String> {
        let cleaned: String = title
            .to_lowercase()
            .chars()
            .filter(|c| c.is_alphanumeric() || c.is_whitespace())
            .collect();
        cleaned
            .split_whitespace()
            .filter(|token| token.chars().count() > self.settings.short_token_len)
            .filter(|token| !self.stop_words.contains(*token))
            .unique()
            .map(str::to_string)
            .collect()
    }

    /// [`Self::keywords`] as a set, ready for [`overlap_ratio`].
    pub fn keyword_set(&self, title: &str) -> HashSet<String> {
        self.keywords(title).into_iter().collect()
    }

    /// Order-independent fingerprint of the first `words` keywords.
    ///
    /// `None` when the title has no keywords; such titles never collapse by
    /// topic.
    pub fn topic_key(&self, title: &str, words: usize) -> Option<String> {
        let mut top: Vec<String> = self.keywords(title).into_iter().take(words).collect();
        if top.is_empty() {
            return None;
        }
        top.sort();
        Some(top.join("|"))
    }

    /// Run every configured stage.
    pub fn dedup(&self, articles: Vec<Article>) -> Vec<Article> {
        let before = articles.len();
        let articles = dedup_by_link(articles);
        let articles = dedup_by_title(articles, self.settings.title_key());
        let articles = match self.settings.topic_key_words {
            Some(words) => self.dedup_by_topic(articles, words),
            None => articles,
        };
        let articles = self.dedup_by_similarity(articles);
        debug!(before, after = articles.len(), "Deduplicated articles");
        articles
    }

    /// Collapse articles that share a topic key.
    ///
    /// # Arguments
    ///
    /// * `articles` - Articles sorted newest first
    /// * `words` - How many leading keywords make up the key
    ///
    /// # Returns
    ///
    /// The first article per topic key, in input order. Titles without
    /// keywords always pass.
    pub fn dedup_by_topic(&self, articles: Vec<Article>, words: usize) -> Vec<Article> {
        let mut seen = HashSet::new();
        articles
            .into_iter()
            .filter(|article| match self.topic_key(&article.title, words) {
                Some(key) => seen.insert(key),
                None => true,
            })
            .collect()
    }

    /// Drop articles whose keywords overlap an already accepted article.
    ///
    /// Each article is compared against every article kept so far with
    /// [`is_similar`] at the configured threshold.
    ///
    /// # Arguments
    ///
    /// * `articles` - Articles sorted newest first
    ///
    /// # Returns
    ///
    /// The accepted articles in input order; for every cluster of similar
    /// titles only the first survives.
    pub fn dedup_by_similarity(&self, articles: Vec<Article>) -> Vec<Article> {
        let threshold = self.settings.similarity_threshold;
        let mut accepted: Vec<HashSet<String>> = Vec::with_capacity(articles.len());
        articles
            .into_iter()
            .filter(|article| {
                let keywords = self.keyword_set(&article.title);
                if accepted.iter().any(|kept| is_similar(&keywords, kept, threshold)) {
                    tracing::trace!(title = %article.title, "Dropped similar story");
                    return false;
                }
                accepted.push(keywords);
                true
            })
            .collect()
    }
}

/// Drop articles whose `link` was already seen.
///
/// # Arguments
///
/// * `articles` - Articles in priority order
///
/// # Returns
///
/// The first article per exact link, order preserved.
pub fn dedup_by_link(articles: Vec<Article>) -> Vec<Article> {
    articles.into_iter().unique_by(|a| a.link.clone()).collect()
}

/// Drop articles whose title key was already seen.
///
/// # Arguments
///
/// * `articles` - Articles in priority order
/// * `key` - Full title or leading-words key, see [`title_key`]
///
/// # Returns
///
/// The first article per title key, order preserved.
pub fn dedup_by_title(articles: Vec<Article>, key: TitleKey) -> Vec<Article> {
    articles
        .into_iter()
        .unique_by(|a| title_key(&a.title, key))
        .collect()
}
