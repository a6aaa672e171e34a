//! # revive-core
//!
//! Core functionality for revive, a tool that brings old blog posts back to
//! life by auditing and rewriting them with a language model.
//!
//! ## Architecture
//!
//! - **Sitemap discovery**: [`SitemapResolver`] finds the pages a site links
//!   to, so rewrites can add internal links to real URLs
//! - **Content extraction**: [`ContentFetcher`] fetches a post through a chain
//!   of fallbacks and extracts its title, headings, links and body text
//! - **Revision**: the [`Reviser`] trait audits and rewrites a post;
//!   [`AnthropicReviser`] implements it with the Anthropic Messages API
//! - **Pipeline**: [`Pipeline`] runs a batch of posts end to end and totals
//!   token usage and cost
//!
//! ## Quick Start
//!
//! ```no_run
//! use revive_core::{Config, ContentFetcher, FetchResult, SitemapResolver};
//!
//! # async fn example() -> revive_core::Result<()> {
//! let config = Config::load()?;
//!
//! let resolver = SitemapResolver::new(&config.http)?;
//! let pages = resolver.resolve("example.com", None).await;
//! println!("{} pages in sitemap", pages.len());
//!
//! let fetcher = ContentFetcher::new(&config)?;
//! match fetcher.fetch("https://example.com/blog/old-post").await {
//!     FetchResult::Extracted(post) => println!("{} ({} words)", post.title, post.word_count),
//!     FetchResult::Failed(failure) => eprintln!("{failure}"),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Sitemap discovery and content extraction never fail with an [`Error`]:
//! missing sitemaps resolve to an empty list and unusable posts come back as
//! [`FetchResult::Failed`]. [`Error`] covers configuration, client setup and
//! the language model API.

/// Language model reviser backed by the Anthropic Messages API
pub mod anthropic;
/// Audit reports, usage accounting, prompts and the reviser trait
pub mod audit;
/// Sitemap caches with session and process scope
pub mod cache;
/// Configuration loading and defaults
pub mod config;
/// Error types and result aliases
pub mod error;
/// HTML content-region extraction
pub mod extract;
/// Post fetching with header rotation and API fallback
pub mod fetcher;
/// Sequential fetch, audit and rewrite over a batch of posts
pub mod pipeline;
/// Sitemap and sitemap-index discovery
pub mod sitemap;
/// Text helpers
pub mod text;
/// Core data types
pub mod types;

// Re-export commonly used types
pub use anthropic::AnthropicReviser;
pub use audit::{AuditReport, Reviser, Usage, Verdict};
pub use cache::{MemoryCache, SitemapCache, process_cache};
pub use config::{Config, ExtractConfig, HttpConfig, ModelConfig, PathsConfig, Pricing};
pub use error::{Error, Result};
pub use fetcher::ContentFetcher;
pub use pipeline::{
    FailedPost, NoopObserver, Pipeline, PostOutcome, RevisedPost, RunObserver, RunReport,
    RunTotals,
};
pub use sitemap::SitemapResolver;
pub use types::*;
