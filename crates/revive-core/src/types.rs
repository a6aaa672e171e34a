//! Core data types shared by the resolver, the extractor and the pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A page discovered through the site's sitemap.
///
/// `slug` is the site-relative path and always starts with `/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SitePage {
    /// Absolute page URL as listed in the sitemap.
    pub url: String,
    /// Site-relative path without a trailing slash (`/` for the home page).
    pub slug: String,
    /// Human-readable title derived from the last path segment.
    pub title: String,
}

/// Heading level captured from post content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeadingLevel {
    /// `<h2>`
    H2,
    /// `<h3>`
    H3,
}

impl HeadingLevel {
    /// Map an element name onto a captured heading level.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "h2" => Some(Self::H2),
            "h3" => Some(Self::H3),
            _ => None,
        }
    }

    /// The element name for this level.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::H2 => "h2",
            Self::H3 => "h3",
        }
    }
}

/// A heading inside the post's content region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    /// Heading level.
    pub level: HeadingLevel,
    /// Whitespace-normalized heading text.
    pub text: String,
}

/// An anchor found inside the post's content region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// Whitespace-normalized anchor text.
    pub text: String,
    /// The `href` attribute exactly as written in the markup.
    pub href: String,
}

/// Structured content of a successfully fetched post.
///
/// `word_count` always equals the number of whitespace-delimited tokens in
/// `body_text`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostContent {
    /// The URL that was requested.
    pub url: String,
    /// Last path segment of the URL, or `post` for a bare host.
    pub slug: String,
    /// First `<h1>`, falling back to the document `<title>`.
    pub title: String,
    /// `h2`/`h3` headings in document order.
    pub headings: Vec<Heading>,
    /// Region text, one text node per line, blank-line runs collapsed.
    pub body_text: String,
    /// Links to the same host or root-relative paths.
    pub internal_links: Vec<Link>,
    /// Absolute `http(s)` links to other hosts.
    pub external_links: Vec<Link>,
    /// Whitespace-delimited tokens in `body_text`.
    pub word_count: usize,
}

/// Terminal failure for a single post URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchFailure {
    /// The URL that was requested.
    pub url: String,
    /// Human-actionable reason, including a manual-entry suggestion.
    pub reason: String,
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.reason)
    }
}

/// Outcome of fetching a single post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchResult {
    /// Content was extracted and passed the usability gate.
    Extracted(PostContent),
    /// Every strategy was exhausted.
    Failed(FetchFailure),
}

impl FetchResult {
    /// Returns the extracted content, if any.
    pub const fn content(&self) -> Option<&PostContent> {
        match self {
            Self::Extracted(post) => Some(post),
            Self::Failed(_) => None,
        }
    }

    /// Returns `true` when content was extracted.
    pub const fn is_extracted(&self) -> bool {
        matches!(self, Self::Extracted(_))
    }

    /// Convert into a standard `Result`.
    pub fn into_result(self) -> Result<PostContent, FetchFailure> {
        match self {
            Self::Extracted(post) => Ok(post),
            Self::Failed(failure) => Err(failure),
        }
    }
}
