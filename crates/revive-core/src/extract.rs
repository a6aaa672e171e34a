//! HTML content extraction for blog posts.
//!
//! Picks the main content region of a page and pulls out its title, `h2`/`h3`
//! headings, links and readable text. Region selection walks
//! [`CONTENT_SELECTORS`] from most to least specific and accepts the first
//! match whose text reaches the caller's word floor, so a small "related posts"
//! widget that happens to match a loose selector is skipped.

use crate::text::{collapse_blank_lines, squash_whitespace, word_count};
use crate::types::{Heading, HeadingLevel, Link};
use scraper::{ElementRef, Html, Node, Selector};
use std::sync::LazyLock;
use tracing::debug;
use url::Url;

/// Content region selectors in priority order.
pub const CONTENT_SELECTORS: [&str; 11] = [
    ".post-content",
    ".entry-content",
    ".post-body",
    ".article-body",
    ".article-content",
    ".blog-post",
    ".single-post",
    "#content",
    ".content",
    "article",
    "main",
];

/// Elements whose text never counts as readable content.
const NON_CONTENT_ELEMENTS: [&str; 4] = ["script", "style", "noscript", "template"];

/// Parsed [`CONTENT_SELECTORS`].
///
/// SAFETY: Selectors are compile-time constants that are known to be valid.
#[allow(clippy::unwrap_used)]
static REGION_SELECTORS: LazyLock<Vec<(&'static str, Selector)>> = LazyLock::new(|| {
    CONTENT_SELECTORS
        .iter()
        .map(|css| (*css, Selector::parse(css).unwrap()))
        .collect()
});

#[allow(clippy::unwrap_used)]
static H1_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h1").unwrap());

#[allow(clippy::unwrap_used)]
static TITLE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("title").unwrap());

#[allow(clippy::unwrap_used)]
static BODY_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("body").unwrap());

#[allow(clippy::unwrap_used)]
static HEADING_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h2, h3").unwrap());

#[allow(clippy::unwrap_used)]
static ANCHOR_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());

/// Fields extracted from one HTML document or fragment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedPage {
    /// Page title (empty when none was found).
    pub title: String,
    /// `h2`/`h3` headings inside the region, in document order.
    pub headings: Vec<Heading>,
    /// Region text, one text node per line.
    pub body_text: String,
    /// Same-host or root-relative links inside the region.
    pub internal_links: Vec<Link>,
    /// Absolute `http(s)` links to other hosts inside the region.
    pub external_links: Vec<Link>,
    /// Whitespace-delimited tokens in `body_text`.
    pub word_count: usize,
}

/// Where a link points relative to the page it was found on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    /// Same site.
    Internal,
    /// Another site.
    External,
}

/// Extract a full HTML document fetched from `source`.
///
/// The title is the first `<h1>` anywhere in the document, falling back to
/// `<title>`. When no selector yields a region of at least
/// `min_region_words` words the whole `<body>` is used.
pub fn extract_document(html: &str, source: &Url, min_region_words: usize) -> ExtractedPage {
    let document = Html::parse_document(html);

    let title = first_text(&document, &H1_SELECTOR)
        .or_else(|| first_text(&document, &TITLE_SELECTOR))
        .unwrap_or_default();

    let region = select_region(&document, min_region_words);
    extract_region(title, region, source)
}

/// Extract an HTML fragment, such as the rendered body returned by a CMS API.
///
/// The whole fragment is treated as the content region. `title_html` may
/// contain markup or entities and is reduced to plain text.
pub fn extract_fragment(title_html: &str, content_html: &str, source: &Url) -> ExtractedPage {
    let title = fragment_text(title_html);
    let fragment = Html::parse_fragment(content_html);
    extract_region(title, fragment.root_element(), source)
}

/// Plain text of an HTML fragment with whitespace squashed.
pub fn fragment_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    squash_whitespace(fragment.root_element().text())
}

/// Classify an `href` found on `source`.
///
/// Empty, fragment-only and `mailto:` links are ignored, as are relative paths
/// and non-web schemes. Hosts are compared without a leading `www.`.
pub fn classify_link(href: &str, source: &Url) -> Option<LinkKind> {
    if href.is_empty() || href.starts_with('#') || href.starts_with("mailto:") {
        return None;
    }

    if href.starts_with('/') && !href.starts_with("//") {
        return Some(LinkKind::Internal);
    }

    let target = if href.starts_with("//") {
        source.join(href).ok()?
    } else {
        Url::parse(href).ok()?
    };
    if !matches!(target.scheme(), "http" | "https") {
        return None;
    }

    if same_site(target.host_str(), source.host_str()) {
        Some(LinkKind::Internal)
    } else {
        Some(LinkKind::External)
    }
}

fn same_site(a: Option<&str>, b: Option<&str>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => {
            let strip = |host: &str| host.strip_prefix("www.").unwrap_or(host).to_ascii_lowercase();
            strip(a) == strip(b)
        },
        _ => false,
    }
}

fn first_text(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .next()
        .map(|el| squash_whitespace(el.text()))
        .filter(|text| !text.is_empty())
}

fn select_region(document: &Html, min_region_words: usize) -> ElementRef<'_> {
    for &(css, ref selector) in REGION_SELECTORS.iter() {
        let Some(candidate) = document.select(selector).next() else {
            continue;
        };
        let words = word_count(&region_text(candidate));
        if words >= min_region_words {
            debug!(selector = css, words, "Selected content region");
            return candidate;
        }
        debug!(selector = css, words, "Content region below word floor");
    }

    debug!("No content selector qualified, using document body");
    document
        .select(&BODY_SELECTOR)
        .next()
        .unwrap_or_else(|| document.root_element())
}

fn extract_region(title: String, region: ElementRef<'_>, source: &Url) -> ExtractedPage {
    let headings = region
        .select(&HEADING_SELECTOR)
        .filter_map(|el| {
            HeadingLevel::from_tag(el.value().name()).map(|level| Heading {
                level,
                text: squash_whitespace(el.text()),
            })
        })
        .collect();

    let mut internal_links = Vec::new();
    let mut external_links = Vec::new();
    for anchor in region.select(&ANCHOR_SELECTOR) {
        let href = anchor.value().attr("href").unwrap_or_default().trim();
        let Some(kind) = classify_link(href, source) else {
            continue;
        };
        let link = Link {
            text: squash_whitespace(anchor.text()),
            href: href.to_string(),
        };
        match kind {
            LinkKind::Internal => internal_links.push(link),
            LinkKind::External => external_links.push(link),
        }
    }

    let body_text = region_text(region);
    let word_count = word_count(&body_text);

    ExtractedPage {
        title,
        headings,
        body_text,
        internal_links,
        external_links,
        word_count,
    }
}

/// Visible text of `region`: trimmed text nodes joined by newlines.
fn region_text(region: ElementRef<'_>) -> String {
    let mut lines = Vec::new();
    for node in region.descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let hidden = node
            .ancestors()
            .filter_map(ElementRef::wrap)
            .any(|el| NON_CONTENT_ELEMENTS.contains(&el.value().name()));
        if hidden {
            continue;
        }
        let line = text.trim();
        if !line.is_empty() {
            lines.push(line);
        }
    }
    collapse_blank_lines(&lines.join("\n"))
}
