//! Post audits, rewrites and the [`Reviser`] seam.
//!
//! A [`Reviser`] runs two passes per post. The audit pass returns an
//! [`AuditReport`] describing what is weak about the post. The rewrite pass
//! returns the revised post as markdown. Both report token [`Usage`] so that
//! callers can total up cost.
//!
//! This module also owns the prompt text and the parsing of model output, so
//! that any backend (see [`crate::anthropic`]) only has to move strings.

use crate::config::{ModelConfig, Pricing};
use crate::text::truncate_chars;
use crate::types::{PostContent, SitePage};
use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt::{self, Write as _};
use tracing::debug;

/// Maximum characters of unparseable model output kept in an audit report.
pub const PARSE_ERROR_EXCERPT_CHARS: usize = 500;

/// Placeholder used in prompts when the site has no known pages.
pub const NO_SITE_PAGES: &str = "No sitemap pages available.";

/// Overall judgement of a post.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    /// Under roughly 800 words or sparse.
    Thin,
    /// Roughly 800 to 1200 words.
    #[default]
    Average,
    /// Over 1200 words with depth.
    Good,
}

impl Verdict {
    /// Lowercase name as used in audit JSON.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Thin => "thin",
            Self::Average => "average",
            Self::Good => "good",
        }
    }

    /// Parse a verdict, ignoring case and surrounding whitespace.
    pub fn parse_lenient(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "thin" => Some(Self::Thin),
            "average" => Some(Self::Average),
            "good" => Some(Self::Good),
            _ => None,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn lenient_verdict<'de, D>(deserializer: D) -> std::result::Result<Verdict, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value
        .as_deref()
        .and_then(Verdict::parse_lenient)
        .unwrap_or_default())
}

/// Findings of the audit pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditReport {
    /// `h2` headings whose sections are too short.
    pub thin_sections: Vec<String>,
    /// Sentences that look dated or vague about time.
    pub outdated_claims: Vec<String>,
    /// Topics that could link to existing site pages.
    pub missing_internal_links: Vec<String>,
    /// Claims that need a citation.
    pub missing_external_links: Vec<String>,
    /// Word count reported by the model.
    pub overall_word_count: usize,
    /// Overall judgement. Unknown values read as [`Verdict::Average`].
    #[serde(deserialize_with = "lenient_verdict")]
    pub verdict: Verdict,
    /// Start of the raw model output when it could not be parsed.
    #[serde(rename = "_parse_error", skip_serializing_if = "Option::is_none")]
    pub parse_error: Option<String>,
}

impl AuditReport {
    /// Neutral report used when the model output is not valid audit JSON.
    pub fn fallback(post_word_count: usize, raw: &str) -> Self {
        Self {
            overall_word_count: post_word_count,
            verdict: Verdict::Average,
            parse_error: Some(truncate_chars(raw, PARSE_ERROR_EXCERPT_CHARS).to_string()),
            ..Self::default()
        }
    }

    /// Parse model output into a report, degrading to [`AuditReport::fallback`].
    pub fn from_model_output(raw: &str, post_word_count: usize) -> Self {
        let cleaned = strip_code_fences(raw);
        match serde_json::from_str::<Self>(cleaned) {
            Ok(report) => report,
            Err(e) => {
                debug!(error = %e, "Audit output is not valid JSON, using fallback report");
                Self::fallback(post_word_count, cleaned)
            },
        }
    }
}

/// Token usage and cost of one model call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    /// Prompt tokens.
    pub input_tokens: u64,
    /// Completion tokens.
    pub output_tokens: u64,
    /// Cost in US dollars under the configured pricing.
    pub cost_usd: f64,
}

impl Usage {
    /// Usage with its cost computed from `pricing`.
    pub fn new(input_tokens: u64, output_tokens: u64, pricing: &Pricing) -> Self {
        Self {
            input_tokens,
            output_tokens,
            cost_usd: pricing.cost(input_tokens, output_tokens),
        }
    }
}

/// Audits and rewrites posts.
#[async_trait]
pub trait Reviser: Send + Sync {
    /// Audit a post against the site's pages.
    async fn audit(
        &self,
        post: &PostContent,
        pages: &[SitePage],
        domain: &str,
    ) -> Result<(AuditReport, Usage)>;

    /// Rewrite a post as markdown, addressing `audit`.
    async fn rewrite(
        &self,
        post: &PostContent,
        audit: &AuditReport,
        pages: &[SitePage],
        domain: &str,
    ) -> Result<(String, Usage)>;
}

/// Remove a surrounding markdown code fence, if present.
pub fn strip_code_fences(text: &str) -> &str {
    let text = text.trim();
    let Some(after_fence) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the info string (e.g. `json`) along with the opening fence
    let body = text.split_once('\n').map_or(after_fence, |(_, body)| body);
    body.strip_suffix("```").unwrap_or(body).trim()
}

/// Format site pages for a prompt, one `- url | title` line each.
///
/// At most `max_pages` pages are listed. A page without a URL gets one built
/// from `domain` and its slug.
pub fn format_site_pages(pages: &[SitePage], domain: &str, max_pages: usize) -> String {
    if pages.is_empty() {
        return NO_SITE_PAGES.to_string();
    }

    let base = domain.trim_end_matches('/');
    let mut out = String::new();
    for page in pages.iter().take(max_pages) {
        let url = if !page.url.is_empty() {
            page.url.clone()
        } else if !page.slug.is_empty() && !base.is_empty() {
            format!("{base}/{}", page.slug.trim_start_matches('/'))
        } else if !page.slug.is_empty() {
            page.slug.clone()
        } else {
            "(no url)".to_string()
        };
        if !out.is_empty() {
            out.push('\n');
        }
        let _ = write!(out, "- {url} | {}", page.title);
    }
    out
}

fn post_title(post: &PostContent) -> &str {
    if post.title.trim().is_empty() {
        "Untitled"
    } else {
        &post.title
    }
}

/// Prompt for the audit pass.
pub fn audit_prompt(
    post: &PostContent,
    pages: &[SitePage],
    domain: &str,
    model: &ModelConfig,
) -> String {
    let word_count = post.word_count;
    format!(
        r#"You are auditing a blog post for search performance. Respond with a single JSON object and nothing else (no markdown fences, no commentary).

Use exactly these keys:
{{
  "thin_sections": ["H2 headings whose section has fewer than 150 words"],
  "outdated_claims": ["sentences that cite old statistics or say 'recently' without a date"],
  "missing_internal_links": ["topics in the post that match one of the site pages below"],
  "missing_external_links": ["factual claims that should cite a source, quoted"],
  "overall_word_count": {word_count},
  "verdict": "thin"
}}

"verdict" is "thin" (under 800 words or sparse), "average" (800 to 1200 words) or "good" (over 1200 words with depth).

TITLE: {title}
WORD COUNT: {word_count}

POST CONTENT:
{body}

SITE PAGES (for internal link matching):
{site_pages}

Respond with the JSON object only."#,
        title = post_title(post),
        body = truncate_chars(&post.body_text, model.max_body_chars),
        site_pages = format_site_pages(pages, domain, model.max_site_pages),
    )
}

/// Prompt for the rewrite pass.
pub fn rewrite_prompt(
    post: &PostContent,
    audit: &AuditReport,
    pages: &[SitePage],
    domain: &str,
    model: &ModelConfig,
) -> Result<String> {
    let audit_json = serde_json::to_string_pretty(audit)?;
    Ok(format!(
        r#"You are an experienced SEO writer. Rewrite the blog post below, following every instruction.

VOICE
- Work out the author's tone first: formal or casual, technical or plain, second or third person, sentence length, humour.
- The rewrite must read as if the same author wrote it. Keep their recurring phrases and habits.

STRUCTURE
- Phrase most H2 headings (around 60%) as questions.
- Directly under each question heading, give a self-contained 30 to 60 word answer in **bold** that could stand alone as a featured snippet.
- Follow it with two or three supporting paragraphs with examples or data.

CONTENT
- Replace outdated facts with current information.
- Write at least 1,200 words.
- Resolve every issue in the audit findings.

EXTERNAL LINKS
- Support factual claims with real URLs from credible sources (government sites, major industry publications, Wikipedia, research).
- Format: [descriptive anchor text](https://example.org/page)
- Only write (SOURCE: domain.com) when you genuinely do not know the exact URL.

INTERNAL LINKS
- Add three to five links to the site pages listed below, using their full URLs exactly as given.
- Format: [natural anchor text](https://full-url-from-the-list)
- Never use "click here" as anchor text.

OUTPUT
- Markdown only, starting with the # title. No preamble and nothing after the post.

ORIGINAL TITLE: {title}

AUDIT FINDINGS:
{audit_json}

SITE PAGES FOR INTERNAL LINKS (use these full URLs):
{site_pages}

ORIGINAL POST:
{body}"#,
        title = post_title(post),
        site_pages = format_site_pages(pages, domain, model.max_site_pages),
        body = truncate_chars(&post.body_text, model.max_body_chars),
    ))
}
