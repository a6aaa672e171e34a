//! `revive sitemap`: list the pages a site advertises.

use anyhow::Result;
use revive_core::sitemap::normalize_domain;
use revive_core::{Config, SitePage, SitemapResolver};
use serde::Serialize;

use crate::output::{self, OutputFormat};

#[derive(Serialize)]
struct SitemapOutput<'a> {
    domain: &'a str,
    count: usize,
    pages: &'a [SitePage],
}

/// Resolve `domain` and print its pages.
///
/// An empty result is not an error; sites without a sitemap still get posts
/// revised, just without internal link suggestions.
pub async fn execute(config: &Config, domain: &str, format: OutputFormat) -> Result<()> {
    let resolver = SitemapResolver::new(&config.http)?;
    let domain = normalize_domain(domain);
    let pages = resolver.resolve(&domain, None).await;

    match format {
        OutputFormat::Json => output::print_json(&SitemapOutput {
            domain: &domain,
            count: pages.len(),
            pages: &pages,
        }),
        OutputFormat::Text => {
            output::print_site_pages(&domain, &pages);
            Ok(())
        },
    }
}
