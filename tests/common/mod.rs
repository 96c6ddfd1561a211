#![allow(dead_code)]

use feed_digest::config::{FeedSource, FetchSettings, Settings};
use httpmock::prelude::*;
use std::time::Duration;

/// Minimal RSS 2.0 document from `(title, link, pubDate)` triples.
pub fn rss(items: &[(&str, &str, &str)]) -> String {
    let body: String = items
        .iter()
        .map(|(title, link, date)| {
            format!(
                "<item><title><![CDATA[{title}]]></title><link>{link}</link><pubDate>{date}</pubDate></item>"
            )
        })
        .collect();
    format!(r#"<?xml version="1.0" encoding="UTF-8"?><rss version="2.0"><channel><title>Feed</title>{body}</channel></rss>"#)
}

/// Serve `body` at `path`, optionally after `delay`.
pub async fn feed(server: &MockServer, path: &str, body: String, delay: Option<Duration>) {
    server
        .mock_async(|when, then| {
            when.method(GET).path(path);
            let then = then
                .status(200)
                .header("content-type", "application/rss+xml")
                .body(body);
            if let Some(delay) = delay {
                then.delay(delay);
            }
        })
        .await;
}

/// Settings pointing at the mock server with a one second timeout.
pub fn settings_for(server: &MockServer, paths: &[(&str, &str)]) -> Settings {
    Settings {
        feeds: paths
            .iter()
            .map(|(path, name)| FeedSource::new(&server.url(*path), Some(*name)))
            .collect(),
        fetch: FetchSettings {
            timeout_secs: 1,
            ..FetchSettings::default()
        },
        ..Settings::default()
    }
}
