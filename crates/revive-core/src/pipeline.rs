//! Batch revival of blog posts.
//!
//! A [`Pipeline`] resolves the site's sitemap once and then takes each post
//! URL through fetch, audit and rewrite in turn. URLs are processed strictly
//! one after another. A failure at any stage is recorded against that URL and
//! the run moves on to the next one.

use crate::audit::{AuditReport, Reviser, Usage};
use crate::cache::{MemoryCache, SitemapCache};
use crate::config::Config;
use crate::fetcher::ContentFetcher;
use crate::sitemap::{SitemapResolver, normalize_domain};
use crate::text::word_count;
use crate::types::{FetchResult, PostContent, SitePage};
use crate::Result;
use serde::Serialize;
use tracing::{info, instrument, warn};

/// Progress callbacks for a [`Pipeline::run`].
///
/// Every method has an empty default so observers only implement what they
/// display.
pub trait RunObserver: Send {
    /// The sitemap was resolved (possibly to nothing).
    fn sitemap_resolved(&mut self, _pages: &[SitePage]) {}

    /// Work on post `index` (zero-based) of `total` is starting.
    fn post_started(&mut self, _index: usize, _total: usize, _url: &str) {}

    /// The post's content was extracted.
    fn post_fetched(&mut self, _post: &PostContent) {}

    /// The audit pass finished.
    fn post_audited(&mut self, _url: &str, _audit: &AuditReport) {}

    /// The rewrite pass finished.
    fn post_rewritten(&mut self, _post: &RevisedPost) {}

    /// The post could not be revised.
    fn post_failed(&mut self, _url: &str, _reason: &str) {}
}

/// Observer that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl RunObserver for NoopObserver {}

/// A successfully revised post.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RevisedPost {
    /// The requested URL.
    pub url: String,
    /// Title of the original post.
    pub title: String,
    /// Slug used to name the output file.
    pub slug: String,
    /// Words in the original post body.
    pub word_count_before: usize,
    /// Words in the rewritten markdown.
    pub word_count_after: usize,
    /// Markdown links pointing at the site itself.
    pub internal_links_added: usize,
    /// Markdown links pointing at other `https` sites.
    pub external_links_added: usize,
    /// Findings of the audit pass.
    pub audit: AuditReport,
    /// The rewritten post.
    pub markdown: String,
    /// Combined usage of the audit and rewrite calls.
    pub usage: Usage,
}

impl RevisedPost {
    /// Change in word count, negative when the post shrank.
    #[allow(clippy::cast_possible_wrap)]
    pub const fn word_count_delta(&self) -> i64 {
        self.word_count_after as i64 - self.word_count_before as i64
    }

    /// File name the rewritten markdown is saved under.
    pub fn output_file_name(&self) -> String {
        format!("{}-rewritten.md", self.slug)
    }
}

/// A post that could not be revised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedPost {
    /// The requested URL.
    pub url: String,
    /// Why it failed, prefixed with the failing stage for model errors.
    pub reason: String,
}

/// Outcome for one post URL.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum PostOutcome {
    /// Fetched, audited and rewritten.
    Revised(RevisedPost),
    /// Stopped at some stage.
    Failed(FailedPost),
}

impl PostOutcome {
    fn failed(url: &str, reason: String) -> Self {
        Self::Failed(FailedPost {
            url: url.to_string(),
            reason,
        })
    }

    /// The URL this outcome belongs to.
    pub fn url(&self) -> &str {
        match self {
            Self::Revised(post) => &post.url,
            Self::Failed(failure) => &failure.url,
        }
    }
}

/// Totals across a whole run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RunTotals {
    /// Posts that were rewritten.
    pub posts_revised: usize,
    /// Posts that failed at any stage.
    pub posts_failed: usize,
    /// Prompt tokens over every model call.
    pub input_tokens: u64,
    /// Completion tokens over every model call.
    pub output_tokens: u64,
    /// Cost in US dollars over every model call.
    pub cost_usd: f64,
}

impl RunTotals {
    /// Add one model call.
    pub fn record(&mut self, usage: &Usage) {
        self.input_tokens += usage.input_tokens;
        self.output_tokens += usage.output_tokens;
        self.cost_usd += usage.cost_usd;
    }
}

/// Everything a run produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    /// The normalized domain.
    pub domain: String,
    /// Pages found in the site's sitemap.
    pub site_pages: Vec<SitePage>,
    /// One outcome per input URL, in input order.
    pub outcomes: Vec<PostOutcome>,
    /// Usage and post counts.
    pub totals: RunTotals,
}

impl RunReport {
    /// Revised posts in input order.
    pub fn revised(&self) -> impl Iterator<Item = &RevisedPost> {
        self.outcomes.iter().filter_map(|outcome| match outcome {
            PostOutcome::Revised(post) => Some(post),
            PostOutcome::Failed(_) => None,
        })
    }

    /// Failed posts in input order.
    pub fn failed(&self) -> impl Iterator<Item = &FailedPost> {
        self.outcomes.iter().filter_map(|outcome| match outcome {
            PostOutcome::Failed(failure) => Some(failure),
            PostOutcome::Revised(_) => None,
        })
    }
}

/// Count markdown links in `markdown` that were added to the site and to
/// other sites.
///
/// Internal links are occurrences of `](<domain>`. External links are
/// occurrences of `](https://` that are not internal.
pub fn count_links_added(markdown: &str, domain: &str) -> (usize, usize) {
    let domain = domain.trim_end_matches('/');
    let internal_prefix = format!("]({domain}");
    let internal = if domain.is_empty() {
        0
    } else {
        markdown.matches(internal_prefix.as_str()).count()
    };

    let https_links = markdown.matches("](https://").count();
    let internal_https = if internal_prefix.starts_with("](https://") {
        internal
    } else {
        0
    };
    (internal, https_links.saturating_sub(internal_https))
}

/// Runs posts through fetch, audit and rewrite.
pub struct Pipeline<R> {
    resolver: SitemapResolver,
    fetcher: ContentFetcher,
    reviser: R,
    session: MemoryCache,
}

impl<R: Reviser> Pipeline<R> {
    /// Build a pipeline from configuration.
    pub fn new(config: &Config, reviser: R) -> Result<Self> {
        Ok(Self::with_parts(
            SitemapResolver::new(&config.http)?,
            ContentFetcher::new(config)?,
            reviser,
        ))
    }

    /// Build a pipeline from pre-built components.
    pub fn with_parts(resolver: SitemapResolver, fetcher: ContentFetcher, reviser: R) -> Self {
        Self {
            resolver,
            fetcher,
            reviser,
            session: MemoryCache::new(),
        }
    }

    /// Revive every URL in `urls` for `domain`.
    #[instrument(skip(self, urls, observer), fields(posts = urls.len()))]
    pub async fn run(
        &self,
        domain: &str,
        urls: &[String],
        observer: &mut dyn RunObserver,
    ) -> RunReport {
        let domain = normalize_domain(domain);
        let session: &dyn SitemapCache = &self.session;
        let site_pages = self.resolver.resolve(&domain, Some(session)).await;
        info!(pages = site_pages.len(), "Site pages available for internal linking");
        observer.sitemap_resolved(&site_pages);

        let mut outcomes = Vec::with_capacity(urls.len());
        let mut totals = RunTotals::default();

        for (index, url) in urls.iter().enumerate() {
            observer.post_started(index, urls.len(), url);
            let outcome = self
                .revise_post(url, &domain, &site_pages, &mut totals, observer)
                .await;

            match &outcome {
                PostOutcome::Revised(post) => {
                    totals.posts_revised += 1;
                    info!(url = %post.url, words = post.word_count_after, "Post revised");
                    observer.post_rewritten(post);
                },
                PostOutcome::Failed(failure) => {
                    totals.posts_failed += 1;
                    warn!(url = %failure.url, reason = %failure.reason, "Post failed");
                    observer.post_failed(&failure.url, &failure.reason);
                },
            }
            outcomes.push(outcome);
        }

        RunReport {
            domain,
            site_pages,
            outcomes,
            totals,
        }
    }

    async fn revise_post(
        &self,
        url: &str,
        domain: &str,
        site_pages: &[SitePage],
        totals: &mut RunTotals,
        observer: &mut dyn RunObserver,
    ) -> PostOutcome {
        let post = match self.fetcher.fetch(url).await {
            FetchResult::Extracted(post) => post,
            FetchResult::Failed(failure) => return PostOutcome::failed(url, failure.reason),
        };
        observer.post_fetched(&post);

        let (audit, audit_usage) = match self.reviser.audit(&post, site_pages, domain).await {
            Ok(result) => result,
            Err(e) => return PostOutcome::failed(url, format!("Audit: {e}")),
        };
        totals.record(&audit_usage);
        observer.post_audited(url, &audit);

        let (markdown, rewrite_usage) = match self
            .reviser
            .rewrite(&post, &audit, site_pages, domain)
            .await
        {
            Ok(result) => result,
            Err(e) => return PostOutcome::failed(url, format!("Rewrite: {e}")),
        };
        totals.record(&rewrite_usage);

        let (internal_links_added, external_links_added) = count_links_added(&markdown, domain);
        PostOutcome::Revised(RevisedPost {
            url: url.to_string(),
            title: post.title,
            slug: post.slug,
            word_count_before: post.word_count,
            word_count_after: word_count(&markdown),
            internal_links_added,
            external_links_added,
            audit,
            markdown,
            usage: Usage {
                input_tokens: audit_usage.input_tokens + rewrite_usage.input_tokens,
                output_tokens: audit_usage.output_tokens + rewrite_usage.output_tokens,
                cost_usd: audit_usage.cost_usd + rewrite_usage.cost_usd,
            },
        })
    }
}
