//! # Output Formatting
//!
//! Every command prints either human-readable text (the default) or a single
//! JSON document on stdout. Progress and log messages go to stderr so that
//! JSON output can be piped straight into `jq`.
//!
//! ```bash
//! revive sitemap example.com --format json | jq '.pages[].url'
//! ```

mod progress;
mod text;

pub use progress::ProgressObserver;
pub use text::{print_post, print_run_summary, print_site_pages};

use anyhow::Result;
use clap::ValueEnum;
use serde::Serialize;

/// Output format for command results
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty text output (default)
    #[default]
    Text,
    /// A single JSON document
    Json,
}

/// Print `value` as pretty JSON on stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
