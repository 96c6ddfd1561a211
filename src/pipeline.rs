//! End-to-end digest pipeline.
//!
//! 1. **Fetch** every configured feed concurrently ([`crate::fetcher`])
//! 2. **Extract** items from each body ([`crate::extractor`])
//! 3. **Filter** short and promotional titles ([`crate::filter`])
//! 4. **Rank**: stable sort newest first, deduplicate ([`crate::dedup`]), cap
//!
//! Steps 2-4 run in a separate task after every fetch has settled, so a panic
//! while aggregating turns into a [`DigestError::Aggregation`] instead of
//! taking the caller down.

use crate::config::Settings;
use crate::dedup::Deduplicator;
use crate::error::DigestError;
use crate::extractor::extract_articles;
use crate::fetcher::fetch_all;
use crate::filter;
use crate::models::{Article, Digest, Envelope, FeedPayload};
use chrono::Utc;
use reqwest::Client;
use std::sync::Arc;
use tracing::{error, info, instrument};

/// Stable sort, newest first; equal dates keep extraction order.
pub fn rank(articles: &mut [Article]) {
    articles.sort_by(|a, b| b.date.cmp(&a.date));
}

/// Turn fetched payloads into a ranked digest.
#[instrument(level = "info", skip_all, fields(feeds = payloads.len()))]
pub fn aggregate(payloads: &[FeedPayload], settings: &Settings, now_ms: i64) -> Digest {
    let extracted: Vec<Article> = payloads
        .iter()
        .flat_map(|payload| extract_articles(payload, &settings.images, now_ms))
        .collect();
    let extracted_count = extracted.len();

    let mut articles = filter::apply(extracted, &settings.filter);
    let total_raw = articles.len();

    rank(&mut articles);
    let mut articles = Deduplicator::new(&settings.dedup).dedup(articles);
    let total_after_dedup = articles.len();
    articles.truncate(settings.max_articles);

    info!(
        extracted = extracted_count,
        total_raw,
        total_after_dedup,
        returned = articles.len(),
        "Aggregated digest"
    );
    Digest {
        total_raw,
        total_after_dedup,
        articles,
    }
}

/// Fetch all feeds and aggregate them.
#[instrument(level = "info", skip_all)]
pub async fn run(client: &Client, settings: Arc<Settings>) -> Result<Digest, DigestError> {
    let payloads = fetch_all(client, &settings.feeds).await;
    let now_ms = Utc::now().timestamp_millis();
    spawn_aggregation(move || aggregate(&payloads, &settings, now_ms)).await
}

/// Run `job` on its own task; a panic inside it becomes
/// [`DigestError::Aggregation`].
async fn spawn_aggregation<F>(job: F) -> Result<Digest, DigestError>
where
    F: FnOnce() -> Digest + Send + 'static,
{
    tokio::spawn(async move { job() })
        .await
        .map_err(|e| DigestError::Aggregation(e.to_string()))
}

/// Run the pipeline and wrap the outcome in a response envelope.
pub async fn run_envelope(client: &Client, settings: Arc<Settings>) -> Envelope {
    match run(client, settings).await {
        Ok(digest) => Envelope::from(digest),
        Err(e) => {
            error!(error = %e, "Digest run failed");
            Envelope::failure(e.to_string())
        }
    }
}
