//! Command implementations for the `revive` CLI.

mod fetch;
mod run;
mod sitemap;

pub use fetch::execute as fetch;
pub use run::execute as run;
pub use sitemap::execute as sitemap;

use anyhow::Result;
use revive_core::Config;
use std::path::Path;

use crate::error::CliError;

/// Load configuration from `--config` when given, otherwise by discovery.
///
/// # Errors
///
/// Unreadable or invalid configuration is a usage error.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let loaded = match path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };
    loaded.map_err(|e| CliError::usage(e).into())
}
