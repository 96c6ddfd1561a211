//! # feed_digest
//!
//! ## Usage
//!
//! ```sh
//! feed_digest serve --bind 0.0.0.0:8080
//! feed_digest fetch -j ./json
//! feed_digest predictions
//! ```

use clap::Parser;
use feed_digest::cli::{Cli, Command};
use feed_digest::config::Settings;
use feed_digest::fetcher::build_client;
use feed_digest::outputs::json;
use feed_digest::predictions::fetch_predictions;
use feed_digest::server::{self, AppState};
use feed_digest::{Envelope, pipeline};
use std::error::Error;
use std::sync::Arc;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("feed_digest starting up");

    let args = Cli::parse();
    debug!(?args.config, ?args.command, "Parsed CLI arguments");

    let settings = Arc::new(Settings::load(args.config.as_deref())?);
    let client = build_client(&settings.fetch)?;

    match args.command {
        Command::Serve { bind } => {
            server::serve(&bind, AppState { settings, client }).await?;
        }
        Command::Fetch { json_output_dir } => {
            let envelope = pipeline::run_envelope(&client, Arc::clone(&settings)).await;
            println!("{}", serde_json::to_string_pretty(&envelope)?);

            if let Some(dir) = json_output_dir {
                if let Err(e) = json::write_digest(&envelope, &dir).await {
                    error!(path = %dir, error = %e, "Failed to write digest snapshot");
                    return Err(e);
                }
            }
            if let Envelope::Failure { error, .. } = envelope {
                return Err(error.into());
            }
        }
        Command::Predictions => {
            let markets = fetch_predictions(&client, &settings.predictions).await;
            println!("{}", serde_json::to_string_pretty(&markets)?);
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );
    Ok(())
}
