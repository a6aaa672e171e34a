//! `revive fetch`: extract one post without calling the model.

use anyhow::{Result, anyhow};
use revive_core::{Config, ContentFetcher, FetchResult};
use tracing::debug;

use crate::error::CliError;
use crate::output::{self, OutputFormat};
use crate::utils::urls::validate_post_url;

/// Fetch `url` and print what was extracted.
///
/// # Errors
///
/// An invalid URL is a usage error; a post that could not be extracted is a
/// network error carrying the fetcher's reason.
pub async fn execute(config: &Config, url: &str, format: OutputFormat) -> Result<()> {
    let url = validate_post_url(url)?;
    let fetcher = ContentFetcher::new(config)?;

    match fetcher.fetch(url.as_str()).await {
        FetchResult::Extracted(post) => {
            debug!(words = post.word_count, "Extracted post");
            match format {
                OutputFormat::Json => output::print_json(&post),
                OutputFormat::Text => {
                    output::print_post(&post);
                    Ok(())
                },
            }
        },
        FetchResult::Failed(failure) => Err(CliError::network(anyhow!(failure.reason)).into()),
    }
}
