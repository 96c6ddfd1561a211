//! Concurrent feed fetching.
//!
//! Every configured feed gets exactly one GET with the configured timeout.
//! All requests run at once and the batch resolves when each has either
//! answered or failed. A failure only empties that feed's payload.

use crate::config::{FeedSource, FetchSettings};
use crate::error::DigestError;
use crate::models::FeedPayload;
use futures::future::join_all;
use reqwest::Client;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use tracing::{debug, info, instrument, warn};

/// Build the shared HTTP client with the outbound defaults.
pub fn build_client(settings: &FetchSettings) -> Result<Client, DigestError> {
    let mut headers = HeaderMap::new();
    if let Ok(accept) = HeaderValue::from_str(&settings.accept) {
        headers.insert(ACCEPT, accept);
    }
    let client = Client::builder()
        .user_agent(settings.user_agent.clone())
        .default_headers(headers)
        .timeout(settings.timeout())
        .build()?;
    Ok(client)
}

/// Fetch every source concurrently; output order matches `sources`.
#[instrument(level = "info", skip_all, fields(feeds = sources.len()))]
pub async fn fetch_all(client: &Client, sources: &[FeedSource]) -> Vec<FeedPayload> {
    let payloads = join_all(sources.iter().map(|source| async move {
        let body = match fetch_feed(client, &source.url).await {
            Ok(body) => {
                debug!(url = %source.url, bytes = body.len(), "Fetched feed");
                Some(body)
            }
            Err(e) => {
                warn!(url = %source.url, error = %e, "Feed fetch failed; skipping feed");
                None
            }
        };
        FeedPayload {
            source: source.clone(),
            body,
        }
    }))
    .await;

    let ok = payloads.iter().filter(|p| p.body.is_some()).count();
    info!(ok, failed = payloads.len() - ok, "Feed fetch complete");
    payloads
}

/// Fetch a single feed body.
async fn fetch_feed(client: &Client, url: &str) -> Result<String, DigestError> {
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(DigestError::Status {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }
    Ok(response.text().await?)
}
