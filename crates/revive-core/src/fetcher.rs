//! Resilient blog post fetching.
//!
//! [`ContentFetcher::fetch`] never returns an error. Each post URL ends up as
//! either [`FetchResult::Extracted`] or [`FetchResult::Failed`] with a reason a
//! person can act on. The fallback chain is:
//!
//! 1. direct GET with each [`HeaderProfile`] in turn, discarding non-2xx
//!    responses and bot-challenge interstitials
//! 2. content-region extraction (see [`crate::extract`])
//! 3. a word-count gate on the extracted body
//! 4. the WordPress REST API (`/wp-json/wp/v2/posts?slug=...`)
//!
//! No step is retried; a failed attempt just moves on to the next one.

use crate::config::{Config, ExtractConfig};
use crate::extract::{ExtractedPage, extract_document, extract_fragment};
use crate::text::truncate_chars;
use crate::types::{FetchFailure, FetchResult, PostContent};
use crate::{Error, Result};
use reqwest::Client;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Case-insensitive markers of a bot-challenge interstitial.
pub const BOT_CHALLENGE_SIGNALS: [&str; 6] = [
    "just a moment",
    "checking your browser",
    "cf-challenge",
    "challenge-platform",
    "turnstile",
    "ray-id",
];

const BROWSER_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
const BROWSER_ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";
const WORDPRESS_POSTS_PATH: &str = "/wp-json/wp/v2/posts";
const MANUAL_ENTRY_HINT: &str = "Try pasting the post content manually instead.";

/// Request headers used for one direct-fetch attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderProfile {
    /// Short label used in logs and failure reasons.
    pub name: &'static str,
    /// `User-Agent` header value.
    pub user_agent: String,
    /// Send browser-style `Accept` and `Accept-Language` headers.
    pub browser_headers: bool,
}

impl HeaderProfile {
    /// The declared-bot profile followed by the browser-like profile.
    pub fn defaults(bot_user_agent: &str, browser_user_agent: &str) -> Vec<Self> {
        vec![
            Self {
                name: "bot",
                user_agent: bot_user_agent.to_string(),
                browser_headers: false,
            },
            Self {
                name: "browser",
                user_agent: browser_user_agent.to_string(),
                browser_headers: true,
            },
        ]
    }
}

/// Returns `true` when the first `scan_chars` characters of `body` look like a
/// bot-challenge page.
pub fn is_bot_challenge(body: &str, scan_chars: usize) -> bool {
    let head = truncate_chars(body, scan_chars).to_lowercase();
    BOT_CHALLENGE_SIGNALS
        .iter()
        .any(|signal| head.contains(signal))
}

/// Last non-empty path segment of `url`, or `post` for a bare host.
pub fn post_slug(url: &Url) -> String {
    last_path_segment(url).unwrap_or("post").to_string()
}

fn last_path_segment(url: &Url) -> Option<&str> {
    url.path_segments()?
        .filter(|segment| !segment.is_empty())
        .next_back()
}

/// Result of the direct-fetch stage.
enum DirectFetch {
    /// A 2xx, non-challenge HTML body.
    Accepted(String),
    /// Every profile failed; carries the last diagnostic.
    Rejected(String),
}

#[derive(Debug, Deserialize)]
struct WpPost {
    #[serde(default)]
    title: WpRendered,
    #[serde(default)]
    content: WpRendered,
}

#[derive(Debug, Default, Deserialize)]
struct WpRendered {
    #[serde(default)]
    rendered: String,
}

/// Fetches blog posts and extracts their content.
pub struct ContentFetcher {
    client: Client,
    profiles: Vec<HeaderProfile>,
    page_timeout: Duration,
    api_timeout: Duration,
    limits: ExtractConfig,
}

impl ContentFetcher {
    /// Creates a fetcher from configuration.
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .gzip(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(Error::Network)?;

        Ok(Self {
            client,
            profiles: HeaderProfile::defaults(
                &config.http.bot_user_agent,
                &config.http.browser_user_agent,
            ),
            page_timeout: config.http.page_timeout(),
            api_timeout: config.http.api_fallback_timeout(),
            limits: config.extract,
        })
    }

    /// Header profiles in the order they are tried.
    pub fn profiles(&self) -> &[HeaderProfile] {
        &self.profiles
    }

    /// Fetch `url` and extract its content.
    #[instrument(skip(self))]
    pub async fn fetch(&self, url: &str) -> FetchResult {
        let source = match Url::parse(url) {
            Ok(source) if matches!(source.scheme(), "http" | "https") => source,
            Ok(source) => {
                return failed(url, &format!("unsupported URL scheme '{}'", source.scheme()));
            },
            Err(e) => return failed(url, &format!("invalid URL ({e})")),
        };

        let reason = match self.fetch_direct(&source).await {
            DirectFetch::Accepted(html) => {
                let page = extract_document(&html, &source, self.limits.min_region_words);
                if page.word_count >= self.limits.min_post_words {
                    info!(words = page.word_count, "Extracted post content");
                    return FetchResult::Extracted(into_post(url, &source, page));
                }
                format!(
                    "page returned only {} words, likely blocked or JavaScript-rendered",
                    page.word_count
                )
            },
            DirectFetch::Rejected(reason) => reason,
        };
        debug!(%reason, "Direct fetch unusable, trying WordPress API");

        if let Some(page) = self.fetch_wordpress(&source).await {
            if page.word_count >= self.limits.min_post_words {
                info!(words = page.word_count, "Extracted post content from WordPress API");
                return FetchResult::Extracted(into_post(url, &source, page));
            }
            debug!(words = page.word_count, "WordPress API content below word floor");
        }

        warn!(%reason, "Could not extract post content");
        failed(url, &reason)
    }

    async fn fetch_direct(&self, source: &Url) -> DirectFetch {
        let mut last_error = String::from("no request attempted");

        for profile in &self.profiles {
            let mut request = self
                .client
                .get(source.as_str())
                .timeout(self.page_timeout)
                .header(USER_AGENT, profile.user_agent.as_str());
            if profile.browser_headers {
                request = request
                    .header(ACCEPT, BROWSER_ACCEPT)
                    .header(ACCEPT_LANGUAGE, BROWSER_ACCEPT_LANGUAGE);
            }

            let response = match request.send().await {
                Ok(response) => response,
                Err(e) => {
                    debug!(profile = profile.name, error = %e, "Request failed");
                    last_error = format!("request failed ({e})");
                    continue;
                },
            };

            let status = response.status();
            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    debug!(profile = profile.name, error = %e, "Failed to read body");
                    last_error = format!("could not read response body ({e})");
                    continue;
                },
            };

            if is_bot_challenge(&body, self.limits.challenge_scan_chars) {
                debug!(profile = profile.name, %status, "Bot challenge detected");
                last_error = format!("blocked by a bot challenge page (HTTP {})", status.as_u16());
                continue;
            }
            if !status.is_success() {
                debug!(profile = profile.name, %status, "Non-success status");
                last_error = format!("HTTP {status}");
                continue;
            }

            debug!(profile = profile.name, bytes = body.len(), "Accepted response");
            return DirectFetch::Accepted(body);
        }

        DirectFetch::Rejected(last_error)
    }

    async fn fetch_wordpress(&self, source: &Url) -> Option<ExtractedPage> {
        let slug = last_path_segment(source)?;
        let mut endpoint = source.join(WORDPRESS_POSTS_PATH).ok()?;
        endpoint.query_pairs_mut().append_pair("slug", slug);

        let user_agent = self
            .profiles
            .first()
            .map_or("", |profile| profile.user_agent.as_str());
        let response = self
            .client
            .get(endpoint.as_str())
            .timeout(self.api_timeout)
            .header(ACCEPT, "application/json")
            .header(USER_AGENT, user_agent)
            .send()
            .await
            .map_err(|e| debug!(error = %e, "WordPress API request failed"))
            .ok()?;

        if !response.status().is_success() {
            debug!(status = %response.status(), "WordPress API unavailable");
            return None;
        }

        let posts: Vec<WpPost> = response
            .json()
            .await
            .map_err(|e| debug!(error = %e, "WordPress API returned unexpected JSON"))
            .ok()?;
        let post = posts.into_iter().next()?;

        Some(extract_fragment(&post.title.rendered, &post.content.rendered, source))
    }
}

fn into_post(url: &str, source: &Url, page: ExtractedPage) -> PostContent {
    PostContent {
        url: url.to_string(),
        slug: post_slug(source),
        title: page.title,
        headings: page.headings,
        body_text: page.body_text,
        internal_links: page.internal_links,
        external_links: page.external_links,
        word_count: page.word_count,
    }
}

fn failed(url: &str, reason: &str) -> FetchResult {
    FetchResult::Failed(FetchFailure {
        url: url.to_string(),
        reason: format!("Could not extract content from {url}: {reason}. {MANUAL_ENTRY_HINT}"),
    })
}
