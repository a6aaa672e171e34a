//! Sitemap discovery for a site's internal pages.
//!
//! The [`SitemapResolver`] turns a domain into the list of pages its sitemap
//! advertises. Candidates are tried in a fixed order and the first one that
//! yields at least one page wins:
//!
//! 1. every `Sitemap:` URL declared in `robots.txt`, in file order
//! 2. `/sitemap.xml`
//! 3. `/sitemap_index.xml`
//! 4. `/sitemap-index.xml`
//! 5. `/wp-sitemap.xml`
//!
//! Sitemap indexes are followed recursively up to [`MAX_INDEX_DEPTH`] levels
//! and their children are concatenated in document order. Pages are not
//! deduplicated.
//!
//! Every network or parse problem is swallowed: a candidate that cannot be
//! fetched or parsed simply contributes no pages. The resolved list, even when
//! empty, is cached per normalized domain for the lifetime of the process.
//!
//! ## Quick Start
//!
//! ```no_run
//! use revive_core::config::HttpConfig;
//! use revive_core::sitemap::SitemapResolver;
//!
//! # async fn example() -> revive_core::Result<()> {
//! let resolver = SitemapResolver::new(&HttpConfig::default())?;
//! let pages = resolver.resolve("example.com", None).await;
//! for page in &pages {
//!     println!("{} -> {}", page.slug, page.title);
//! }
//! # Ok(())
//! # }
//! ```

use crate::cache::{SitemapCache, process_cache};
use crate::config::HttpConfig;
use crate::text::title_from_slug;
use crate::types::SitePage;
use crate::{Error, Result};
use percent_encoding::percent_decode_str;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use reqwest::{Client, Response, StatusCode};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument};
use url::Url;

/// Deepest sitemap-index level that is still parsed (the top document is level 0).
pub const MAX_INDEX_DEPTH: u8 = 3;

/// Conventional sitemap locations probed after any `robots.txt` declarations.
pub const FALLBACK_SITEMAP_PATHS: [&str; 4] = [
    "/sitemap.xml",
    "/sitemap_index.xml",
    "/sitemap-index.xml",
    "/wp-sitemap.xml",
];

/// A parsed sitemap document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SitemapDocument {
    /// A `<sitemapindex>` listing child sitemap URLs.
    Index(Vec<String>),
    /// A regular `<urlset>` listing pages.
    UrlSet(Vec<SitePage>),
}

/// Normalize user input into `scheme://host[:port][/path]` without a trailing slash.
///
/// Bare hostnames get an `https://` prefix.
pub fn normalize_domain(domain: &str) -> String {
    let domain = domain.trim();
    let lower = domain.to_ascii_lowercase();
    let with_scheme = if lower.starts_with("http://") || lower.starts_with("https://") {
        domain.to_string()
    } else {
        format!("https://{domain}")
    };
    with_scheme.trim_end_matches('/').to_string()
}

/// Cache key for a normalized domain.
pub fn cache_key(normalized_domain: &str) -> String {
    format!("sitemap_{normalized_domain}")
}

/// Extract `Sitemap:` declarations from a `robots.txt` body, in file order.
pub fn declared_sitemaps(robots_txt: &str) -> Vec<String> {
    const DIRECTIVE: &str = "sitemap:";

    robots_txt
        .lines()
        .filter_map(|line| {
            let line = line.trim();
            let (head, rest) = (line.get(..DIRECTIVE.len())?, line.get(DIRECTIVE.len()..)?);
            if !head.eq_ignore_ascii_case(DIRECTIVE) {
                return None;
            }
            let declared = rest.trim();
            (!declared.is_empty()).then(|| declared.to_string())
        })
        .collect()
}

/// Ordered sitemap candidates: declarations first, then the conventional paths.
pub fn sitemap_candidates(normalized_domain: &str, declared: Vec<String>) -> Vec<String> {
    let mut candidates = declared;
    candidates.extend(
        FALLBACK_SITEMAP_PATHS
            .iter()
            .map(|path| format!("{normalized_domain}{path}")),
    );
    candidates
}

/// Build a [`SitePage`] from a `<loc>` value.
///
/// The slug is the percent-decoded URL path with trailing slashes removed,
/// `/` for the root, and always begins with `/`.
pub fn site_page_from_loc(loc: &str) -> SitePage {
    let encoded = Url::parse(loc).map_or_else(
        |_| {
            loc.split(['?', '#'])
                .next()
                .unwrap_or_default()
                .to_string()
        },
        |url| url.path().to_string(),
    );
    let path = percent_decode_str(&encoded).decode_utf8_lossy();

    let trimmed = path.trim_end_matches('/');
    let slug = if trimmed.is_empty() {
        "/".to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    };

    SitePage {
        url: loc.to_string(),
        title: title_from_slug(&slug),
        slug,
    }
}

/// Parse a sitemap or sitemap index without fetching anything.
///
/// The namespace prefix of the root element (if any) is applied to the child
/// lookups, so `<sm:urlset>` expects `<sm:url>` and `<sm:loc>`. Entries
/// without a non-empty `<loc>` are skipped.
///
/// # Errors
///
/// Returns [`Error::Parse`] for malformed or truncated XML and for documents
/// without a root element.
pub fn parse_document(xml: &str) -> Result<SitemapDocument> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut root: Option<RootElement> = None;
    let mut open_elements = 0usize;
    let mut in_entry = false;
    let mut in_loc = false;
    let mut loc_seen = false;
    let mut current_loc = String::new();
    let mut locs = Vec::new();

    loop {
        let event = reader.read_event_into(&mut buf);
        if root.is_some() && open_elements == 0 {
            match &event {
                Ok(Event::Start(_) | Event::Empty(_)) => {
                    return Err(Error::Parse("second element after the document root".into()));
                },
                Ok(Event::Text(_) | Event::CData(_)) => {
                    return Err(Error::Parse("text after the document root".into()));
                },
                _ => {},
            }
        }

        match event {
            Ok(Event::Start(e)) => {
                open_elements += 1;
                let name = qualified_name(&e);
                match &root {
                    None => root = Some(RootElement::new(&name)),
                    Some(root) => {
                        if open_elements == 2 && name == root.entry_tag {
                            in_entry = true;
                            loc_seen = false;
                            current_loc.clear();
                        } else if open_elements == 3 && in_entry && !loc_seen && name == root.loc_tag
                        {
                            in_loc = true;
                        }
                    },
                }
            },
            Ok(Event::Empty(e)) => {
                if root.is_none() {
                    root = Some(RootElement::new(&qualified_name(&e)));
                }
            },
            Ok(Event::End(_)) => {
                match open_elements {
                    0 => return Err(Error::Parse("unexpected closing tag".into())),
                    3 if in_loc => {
                        in_loc = false;
                        loc_seen = true;
                    },
                    2 if in_entry => {
                        let loc = current_loc.trim();
                        if !loc.is_empty() {
                            locs.push(loc.to_string());
                        }
                        in_entry = false;
                    },
                    _ => {},
                }
                open_elements -= 1;
            },
            Ok(Event::Text(e)) => {
                if in_loc {
                    let text = e.unescape().map_err(|e| Error::Parse(e.to_string()))?;
                    current_loc.push_str(&text);
                }
            },
            Ok(Event::CData(e)) => {
                if in_loc {
                    current_loc.push_str(&String::from_utf8_lossy(&e));
                }
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::Parse(format!("XML parse error: {e}"))),
            _ => {},
        }
        buf.clear();
    }

    let Some(root) = root else {
        return Err(Error::Parse("document has no root element".into()));
    };
    if open_elements != 0 {
        return Err(Error::Parse(format!(
            "document ended with {open_elements} unclosed element(s)"
        )));
    }

    if root.is_index {
        Ok(SitemapDocument::Index(locs))
    } else {
        Ok(SitemapDocument::UrlSet(
            locs.iter().map(|loc| site_page_from_loc(loc)).collect(),
        ))
    }
}

/// Root element facts that drive child lookups.
struct RootElement {
    is_index: bool,
    entry_tag: String,
    loc_tag: String,
}

impl RootElement {
    fn new(qualified: &str) -> Self {
        let (prefix, local) = qualified
            .split_once(':')
            .map_or(("", qualified), |(prefix, local)| (prefix, local));
        let qualify = |tag: &str| {
            if prefix.is_empty() {
                tag.to_string()
            } else {
                format!("{prefix}:{tag}")
            }
        };
        let is_index = local.contains("sitemapindex");
        Self {
            is_index,
            entry_tag: qualify(if is_index { "sitemap" } else { "url" }),
            loc_tag: qualify("loc"),
        }
    }
}

fn qualified_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.name().as_ref()).into_owned()
}

/// Resolves a domain into the pages its sitemap lists.
pub struct SitemapResolver {
    client: Client,
    robots_timeout: Duration,
    sitemap_timeout: Duration,
    cache: Arc<dyn SitemapCache>,
}

impl SitemapResolver {
    /// Create a resolver backed by the process-wide cache.
    pub fn new(config: &HttpConfig) -> Result<Self> {
        Self::with_cache(config, process_cache())
    }

    /// Create a resolver backed by a specific process-level cache.
    pub fn with_cache(config: &HttpConfig, cache: Arc<dyn SitemapCache>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.bot_user_agent.as_str())
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(Error::Network)?;

        Ok(Self {
            client,
            robots_timeout: config.robots_timeout(),
            sitemap_timeout: config.sitemap_timeout(),
            cache,
        })
    }

    /// Discover the pages of `domain`.
    ///
    /// A hit in `session` or in the resolver's own cache returns immediately
    /// without any network activity. Otherwise the candidates are probed and
    /// the result (possibly empty) is written to the resolver's cache and to
    /// `session` when one is supplied.
    #[instrument(skip(self, session))]
    pub async fn resolve(&self, domain: &str, session: Option<&dyn SitemapCache>) -> Vec<SitePage> {
        let domain = normalize_domain(domain);
        let key = cache_key(&domain);

        if let Some(pages) = session
            .and_then(|cache| cache.get(&key))
            .or_else(|| self.cache.get(&key))
        {
            debug!(pages = pages.len(), "Sitemap cache hit");
            return pages;
        }

        let declared = self.robots_declarations(&domain).await;
        debug!(declared = declared.len(), "Collected robots.txt sitemap declarations");

        let mut pages = Vec::new();
        for candidate in sitemap_candidates(&domain, declared) {
            let found = self.fetch_and_parse(&candidate, 0).await;
            if !found.is_empty() {
                info!(sitemap = %candidate, pages = found.len(), "Resolved sitemap");
                pages = found;
                break;
            }
            debug!(sitemap = %candidate, "Sitemap candidate yielded no pages");
        }

        self.cache.put(&key, pages.clone());
        if let Some(session) = session {
            session.put(&key, pages.clone());
        }
        pages
    }

    /// Parse sitemap XML, following sitemap-index children.
    ///
    /// Malformed XML and anything below [`MAX_INDEX_DEPTH`] yield an empty list.
    pub fn parse<'a>(
        &'a self,
        xml: &'a str,
        depth: u8,
    ) -> Pin<Box<dyn Future<Output = Vec<SitePage>> + Send + 'a>> {
        Box::pin(async move {
            if depth > MAX_INDEX_DEPTH {
                debug!(depth, "Sitemap index nesting too deep, skipping branch");
                return Vec::new();
            }

            match parse_document(xml) {
                Ok(SitemapDocument::UrlSet(pages)) => pages,
                Ok(SitemapDocument::Index(children)) => {
                    debug!(children = children.len(), depth, "Following sitemap index");
                    let mut pages = Vec::new();
                    for child in children {
                        pages.extend(self.fetch_and_parse(&child, depth + 1).await);
                    }
                    pages
                },
                Err(e) => {
                    debug!(error = %e, "Discarding unparseable sitemap");
                    Vec::new()
                },
            }
        })
    }

    async fn fetch_and_parse(&self, url: &str, depth: u8) -> Vec<SitePage> {
        if depth > MAX_INDEX_DEPTH {
            return Vec::new();
        }
        let Some(response) = self.get(url, self.sitemap_timeout).await else {
            return Vec::new();
        };
        if !response.status().is_success() {
            debug!(url, status = %response.status(), "Sitemap request failed");
            return Vec::new();
        }
        match response.text().await {
            Ok(xml) => self.parse(&xml, depth).await,
            Err(e) => {
                debug!(url, error = %e, "Failed to read sitemap body");
                Vec::new()
            },
        }
    }

    async fn robots_declarations(&self, domain: &str) -> Vec<String> {
        let url = format!("{domain}/robots.txt");
        let Some(response) = self.get(&url, self.robots_timeout).await else {
            return Vec::new();
        };
        if response.status() != StatusCode::OK {
            debug!(status = %response.status(), "No usable robots.txt");
            return Vec::new();
        }
        response
            .text()
            .await
            .map(|body| declared_sitemaps(&body))
            .unwrap_or_default()
    }

    async fn get(&self, url: &str, timeout: Duration) -> Option<Response> {
        match self.client.get(url).timeout(timeout).send().await {
            Ok(response) => Some(response),
            Err(e) => {
                debug!(url, error = %e, "Request failed");
                None
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use proptest::prelude::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn urlset(locs: &[&str]) -> String {
        let entries: String = locs
            .iter()
            .map(|loc| format!("<url><loc>{loc}</loc></url>"))
            .collect();
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
            <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">{entries}</urlset>"#
        )
    }

    fn index(children: &[String]) -> String {
        let entries: String = children
            .iter()
            .map(|loc| format!("<sitemap><loc>{loc}</loc></sitemap>"))
            .collect();
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
            <sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">{entries}</sitemapindex>"#
        )
    }

    fn resolver() -> SitemapResolver {
        SitemapResolver::with_cache(&HttpConfig::default(), Arc::new(MemoryCache::new())).unwrap()
    }

    async fn mount_xml(server: &MockServer, at: &str, body: String) {
        Mock::given(method("GET"))
            .and(path(at))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(body)
                    .insert_header("Content-Type", "application/xml"),
            )
            .mount(server)
            .await;
    }

    #[test]
    fn test_parses_urlset_pages() {
        let xml = urlset(&[
            "https://example.com/blog/how-to-grow_tomatoes/",
            "https://example.com/",
            "https://example.com/about",
        ]);

        let SitemapDocument::UrlSet(pages) = parse_document(&xml).unwrap() else {
            panic!("expected urlset");
        };

        assert_eq!(pages.len(), 3);
        assert_eq!(pages[0].slug, "/blog/how-to-grow_tomatoes");
        assert_eq!(pages[0].title, "How To Grow Tomatoes");
        assert_eq!(pages[0].url, "https://example.com/blog/how-to-grow_tomatoes/");
        assert_eq!(pages[1].slug, "/");
        assert_eq!(pages[1].title, "/");
        assert_eq!(pages[2].slug, "/about");
        assert_eq!(pages[2].title, "About");
    }

    #[test]
    fn test_detects_sitemap_index() {
        let xml = index(&[
            "https://example.com/post-sitemap.xml".to_string(),
            "https://example.com/page-sitemap.xml".to_string(),
        ]);

        assert_eq!(
            parse_document(&xml).unwrap(),
            SitemapDocument::Index(vec![
                "https://example.com/post-sitemap.xml".to_string(),
                "https://example.com/page-sitemap.xml".to_string(),
            ])
        );
    }

    #[test]
    fn test_applies_root_namespace_prefix() {
        let xml = r#"<?xml version="1.0"?>
        <sm:urlset xmlns:sm="http://www.sitemaps.org/schemas/sitemap/0.9">
          <sm:url><sm:loc>https://example.com/prefixed</sm:loc></sm:url>
          <url><loc>https://example.com/unprefixed</loc></url>
        </sm:urlset>"#;

        let SitemapDocument::UrlSet(pages) = parse_document(xml).unwrap() else {
            panic!("expected urlset");
        };
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].slug, "/prefixed");
    }

    #[test]
    fn test_skips_entries_without_loc() {
        let xml = r#"<urlset>
          <url><lastmod>2024-01-15</lastmod></url>
          <url><loc>   </loc></url>
          <url><loc>https://example.com/kept</loc></url>
        </urlset>"#;

        let SitemapDocument::UrlSet(pages) = parse_document(xml).unwrap() else {
            panic!("expected urlset");
        };
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].url, "https://example.com/kept");
    }

    #[test]
    fn test_handles_xml_entities() {
        let xml = urlset(&["https://example.com/page?foo=1&amp;bar=2"]);
        let SitemapDocument::UrlSet(pages) = parse_document(&xml).unwrap() else {
            panic!("expected urlset");
        };
        assert_eq!(pages[0].url, "https://example.com/page?foo=1&bar=2");
        assert_eq!(pages[0].slug, "/page");
    }

    #[test]
    fn test_rejects_malformed_xml() {
        let mismatched = r#"<urlset><url><loc>https://example.com/a</url></urlset>"#;
        assert!(parse_document(mismatched).is_err());

        let truncated = r#"<urlset><url><loc>https://example.com/a</loc></url>"#;
        assert!(parse_document(truncated).is_err());

        assert!(parse_document("").is_err());
        assert!(parse_document("just some text").is_err());

        let second_root = r#"<urlset><url><loc>https://example.com/a</loc></url></urlset><urlset><url><loc>https://example.com/b</loc></url></urlset>"#;
        assert!(parse_document(second_root).is_err());

        let trailing_text = r#"<urlset><url><loc>https://example.com/a</loc></url></urlset>junk text"#;
        assert!(parse_document(trailing_text).is_err());

        assert!(parse_document("<urlset/><url/>").is_err());
    }

    #[test]
    fn test_trailing_whitespace_and_comments_are_accepted() {
        let xml = "<urlset><url><loc>https://example.com/a</loc></url></urlset>\n<!-- generated -->\n";
        let SitemapDocument::UrlSet(pages) = parse_document(xml).unwrap() else {
            panic!("expected a urlset");
        };
        assert_eq!(pages.len(), 1);
    }

    #[test]
    fn test_empty_root_is_valid() {
        assert_eq!(
            parse_document("<urlset/>").unwrap(),
            SitemapDocument::UrlSet(Vec::new())
        );
    }

    #[test]
    fn test_slug_is_percent_decoded() {
        let page = site_page_from_loc("https://example.com/a b/");
        assert_eq!(page.slug, "/a b");
        assert_eq!(page.title, "A B");

        let page = site_page_from_loc("https://example.com/blog/caf%C3%A9-guide");
        assert_eq!(page.slug, "/blog/café-guide");
        assert_eq!(page.title, "Café Guide");
        assert_eq!(page.url, "https://example.com/blog/caf%C3%A9-guide");
    }

    #[test]
    fn test_normalize_domain() {
        assert_eq!(normalize_domain("example.com"), "https://example.com");
        assert_eq!(normalize_domain("example.com/"), "https://example.com");
        assert_eq!(normalize_domain("http://example.com//"), "http://example.com");
        assert_eq!(normalize_domain(" https://example.com "), "https://example.com");
        assert_eq!(
            cache_key(&normalize_domain("example.com")),
            "sitemap_https://example.com"
        );
    }

    #[test]
    fn test_declared_sitemaps() {
        let robots = "User-agent: *\nDisallow: /wp-admin/\n\
                      Sitemap: https://example.com/custom-sitemap.xml\n\
                      SITEMAP:https://example.com/news.xml\n\
                      sitemap:\n# Sitemap: commented\n";

        assert_eq!(
            declared_sitemaps(robots),
            vec![
                "https://example.com/custom-sitemap.xml".to_string(),
                "https://example.com/news.xml".to_string(),
            ]
        );
    }

    #[test]
    fn test_candidate_order() {
        let candidates = sitemap_candidates(
            "https://example.com",
            vec!["https://example.com/custom.xml".to_string()],
        );
        assert_eq!(
            candidates,
            vec![
                "https://example.com/custom.xml",
                "https://example.com/sitemap.xml",
                "https://example.com/sitemap_index.xml",
                "https://example.com/sitemap-index.xml",
                "https://example.com/wp-sitemap.xml",
            ]
        );
    }

    proptest! {
        #[test]
        fn slugs_always_start_with_slash(segments in prop::collection::vec("[a-z0-9_-]{0,8}", 0..5), trailing in any::<bool>()) {
            let mut loc = format!("https://example.com/{}", segments.join("/"));
            if trailing {
                loc.push('/');
            }
            let page = site_page_from_loc(&loc);
            prop_assert!(page.slug.starts_with('/'));
            prop_assert!(page.slug == "/" || !page.slug.ends_with('/'));
        }

        #[test]
        fn parse_never_panics(xml in ".{0,200}") {
            let _ = parse_document(&xml);
        }
    }

    #[tokio::test]
    async fn test_robots_declaration_tried_first_then_fallbacks() {
        let server = MockServer::start().await;
        let uri = server.uri();

        Mock::given(method("GET"))
            .and(path("/robots.txt"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(format!("User-agent: *\nSitemap: {uri}/custom-sitemap.xml\n")),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/custom-sitemap.xml"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;
        mount_xml(
            &server,
            "/sitemap.xml",
            urlset(&["https://example.com/blog/first-post"]),
        )
        .await;
        Mock::given(method("GET"))
            .and(path("/sitemap_index.xml"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let pages = resolver().resolve(&uri, None).await;

        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].slug, "/blog/first-post");
        assert_eq!(pages[0].title, "First Post");
    }

    #[tokio::test]
    async fn test_first_candidate_with_pages_wins() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/robots.txt"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        mount_xml(&server, "/sitemap.xml", urlset(&[])).await;
        mount_xml(
            &server,
            "/sitemap_index.xml",
            urlset(&["https://example.com/a", "https://example.com/b"]),
        )
        .await;
        Mock::given(method("GET"))
            .and(path("/sitemap-index.xml"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let pages = resolver().resolve(&server.uri(), None).await;

        let slugs: Vec<_> = pages.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, vec!["/a", "/b"]);
    }

    #[tokio::test]
    async fn test_no_sitemap_anywhere_yields_empty() {
        let server = MockServer::start().await;

        let pages = resolver().resolve(&server.uri(), None).await;

        assert!(pages.is_empty());
        // robots.txt plus the four conventional locations
        assert_eq!(server.received_requests().await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_second_resolve_is_served_from_cache() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/robots.txt"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/sitemap.xml"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(urlset(&["https://example.com/x"])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let resolver = resolver();
        let first = resolver.resolve(&server.uri(), None).await;
        let second = resolver.resolve(&format!("{}/", server.uri()), None).await;

        assert_eq!(first.len(), 1);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_session_cache_short_circuits_and_is_populated() {
        let server = MockServer::start().await;
        let uri = server.uri();
        let key = cache_key(&normalize_domain(&uri));

        let session = MemoryCache::new();
        let cached = vec![site_page_from_loc("https://example.com/from-session")];
        session.put(&key, cached.clone());

        let pages = resolver().resolve(&uri, Some(&session)).await;
        assert_eq!(pages, cached);
        assert!(server.received_requests().await.unwrap().is_empty());

        let fresh_session = MemoryCache::new();
        mount_xml(&server, "/sitemap.xml", urlset(&["https://example.com/y"])).await;
        let pages = resolver().resolve(&uri, Some(&fresh_session)).await;
        assert_eq!(fresh_session.get(&key), Some(pages));
    }

    #[tokio::test]
    async fn test_index_children_concatenated_in_document_order() {
        let server = MockServer::start().await;
        let uri = server.uri();

        mount_xml(
            &server,
            "/sitemap-1.xml",
            urlset(&["https://example.com/page1", "https://example.com/page2"]),
        )
        .await;
        Mock::given(method("GET"))
            .and(path("/sitemap-broken.xml"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        mount_xml(&server, "/sitemap-2.xml", urlset(&["https://example.com/page3"])).await;

        let xml = index(&[
            format!("{uri}/sitemap-1.xml"),
            format!("{uri}/sitemap-broken.xml"),
            format!("{uri}/sitemap-2.xml"),
        ]);
        let pages = resolver().parse(&xml, 0).await;

        let slugs: Vec<_> = pages.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, vec!["/page1", "/page2", "/page3"]);
    }

    #[tokio::test]
    async fn test_index_nesting_depth_limit() {
        let server = MockServer::start().await;
        let uri = server.uri();

        // level-1 -> level-2 -> level-3 (urlset): reachable from depth 0
        mount_xml(&server, "/level-1.xml", index(&[format!("{uri}/level-2.xml")])).await;
        mount_xml(&server, "/level-2.xml", index(&[format!("{uri}/level-3.xml")])).await;
        mount_xml(&server, "/level-3.xml", urlset(&["https://example.com/deep"])).await;

        let resolver = resolver();
        let top = index(&[format!("{uri}/level-1.xml")]);
        let pages = resolver.parse(&top, 0).await;
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].slug, "/deep");

        // One more level of nesting pushes the urlset to depth 4
        let pages = resolver.parse(&index(&[format!("{uri}/level-1.xml")]), 1).await;
        assert!(pages.is_empty());

        assert!(resolver.parse(&urlset(&["https://example.com/z"]), 4).await.is_empty());
    }

    #[tokio::test]
    async fn test_parse_swallows_malformed_xml() {
        let pages = resolver().parse("<urlset><url><loc>x</url>", 0).await;
        assert!(pages.is_empty());
    }
}
