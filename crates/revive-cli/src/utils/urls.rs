//! Reading and checking post URL lists.

use anyhow::{Context, Result, anyhow};
use std::path::Path;
use url::Url;

use crate::error::CliError;

/// Split a URL list into entries, one per non-blank line.
pub fn parse_url_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Read a URL list file.
///
/// # Errors
///
/// A missing file maps to a not-found error. Other I/O failures are internal.
pub fn read_url_list(path: &Path) -> Result<Vec<String>> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(parse_url_lines(&text)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(CliError::not_found(anyhow!(
            "URL list {} does not exist",
            path.display()
        ))
        .into()),
        Err(e) => Err(e).with_context(|| format!("Failed to read URL list {}", path.display())),
    }
}

/// Combine URLs given as arguments with those from an optional list file.
///
/// Argument URLs come first; order is otherwise preserved.
pub fn collect_urls(args: &[String], file: Option<&Path>) -> Result<Vec<String>> {
    let mut urls: Vec<String> = args
        .iter()
        .map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty())
        .collect();
    if let Some(path) = file {
        urls.extend(read_url_list(path)?);
    }
    Ok(urls)
}

/// Check that `url` is an absolute `http` or `https` URL.
///
/// # Errors
///
/// Returns a usage error describing what is wrong with the URL.
pub fn validate_post_url(url: &str) -> Result<Url> {
    let parsed = Url::parse(url.trim())
        .map_err(|e| CliError::usage(anyhow!("invalid value '{url}' for URL: {e}")))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        scheme => Err(CliError::usage(anyhow!(
            "invalid value '{url}' for URL: unsupported scheme '{scheme}'"
        ))
        .into()),
    }
}
