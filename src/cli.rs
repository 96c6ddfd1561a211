//! Command-line interface definitions.
//!
//! Every option can also come from the environment.

use clap::{Parser, Subcommand};

/// Command-line arguments for feed_digest.
///
/// # Examples
///
/// ```sh
/// # Serve the digest over HTTP
/// feed_digest serve --bind 127.0.0.1:8080
///
/// # One-shot run, printed to stdout and saved under ./json
/// feed_digest --config digest.yaml fetch -j ./json
///
/// # Prediction markets only
/// feed_digest predictions
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a YAML settings file
    #[arg(short, long, global = true, env = "FEED_DIGEST_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Serve the digest and prediction endpoints over HTTP
    Serve {
        /// Address to listen on
        #[arg(short, long, env = "FEED_DIGEST_BIND", default_value = "0.0.0.0:8080")]
        bind: String,
    },
    /// Build one digest, print it, and optionally save a dated snapshot
    Fetch {
        /// Output directory for the JSON snapshot
        #[arg(short, long)]
        json_output_dir: Option<String>,
    },
    /// Print the filtered prediction markets
    Predictions,
}
