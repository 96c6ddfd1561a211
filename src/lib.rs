//! # feed_digest
//!
//! Aggregates AI news feeds into a single ranked, deduplicated JSON digest,
//! and filters prediction markets down to the ones with a strong signal.
//!
//! ## Architecture
//!
//! The news side is a four-stage pipeline:
//! 1. **Fetching**: one request per feed, all at once ([`fetcher`])
//! 2. **Extraction**: tolerant RSS/Atom item parsing ([`extractor`])
//! 3. **Filtering**: short and promotional titles ([`filter`])
//! 4. **Ranking**: newest first, near-duplicates collapsed, capped
//!    ([`dedup`], [`pipeline`])
//!
//! Results are served over HTTP ([`server`]) or written by the CLI
//! ([`outputs`]). All tunables live in [`config::Settings`].

pub mod cli;
pub mod config;
pub mod dedup;
pub mod error;
pub mod extractor;
pub mod fetcher;
pub mod filter;
pub mod models;
pub mod outputs;
pub mod pipeline;
pub mod predictions;
pub mod server;
pub mod utils;

pub use config::{FeedSource, Settings};
pub use error::DigestError;
pub use models::{Article, Digest, Envelope, PredictionMarket};
