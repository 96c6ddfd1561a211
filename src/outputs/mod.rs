//! Output writers.
//!
//! - [`json`]: dated digest snapshots written by the `fetch` command

pub mod json;
