//! JSON snapshot files for one-shot runs.
//!
//! Files are organized by date with edition names:
//! ```text
//! json_output_dir/
//! └── 2025-05-06/
//!     ├── morning.json
//!     ├── afternoon.json
//!     └── evening.json
//! ```
//!
//! A later run in the same edition overwrites the earlier snapshot.

use crate::models::Envelope;
use crate::utils::{ensure_writable_dir, time_of_day};
use chrono::Local;
use std::error::Error;
use std::path::PathBuf;
use tokio::fs;
use tracing::{info, instrument};

/// Path of the snapshot for a given date and edition.
pub fn snapshot_path(json_output_dir: &str, local_date: &str, edition: &str) -> PathBuf {
    PathBuf::from(json_output_dir)
        .join(local_date)
        .join(format!("{edition}.json"))
}

/// Write an [`Envelope`] to `{json_output_dir}/{date}/{time_of_day}.json`.
///
/// Returns the path written.
#[instrument(level = "info", skip_all, fields(json_output_dir = %json_output_dir))]
pub async fn write_digest(
    envelope: &Envelope,
    json_output_dir: &str,
) -> Result<PathBuf, Box<dyn Error>> {
    let json = serde_json::to_string_pretty(envelope)?;
    let local_date = Local::now().date_naive().to_string();
    let path = snapshot_path(json_output_dir, &local_date, &time_of_day());

    if let Some(dir) = path.parent() {
        ensure_writable_dir(&dir.to_string_lossy()).await?;
    }

    fs::write(&path, json).await?;
    info!(path = %path.display(), "Wrote digest snapshot");
    Ok(path)
}
