//! Sitemap page caches.
//!
//! The resolver only needs a `get`/`put` capability, expressed by the
//! [`SitemapCache`] trait. Two scopes are used in practice:
//!
//! - a **session** cache owned by the caller (one per interactive session or
//!   batch run), passed to [`SitemapResolver::resolve`] explicitly;
//! - the **process** cache shared by every resolver in the process, returned by
//!   [`process_cache`].
//!
//! Entries are written once per domain and never expire.
//!
//! [`SitemapResolver::resolve`]: crate::sitemap::SitemapResolver::resolve

use crate::types::SitePage;
use std::collections::HashMap;
use std::sync::{Arc, LazyLock, PoisonError, RwLock};

/// Key/value store for resolved sitemap page lists.
pub trait SitemapCache: Send + Sync {
    /// Look up a cached page list.
    fn get(&self, key: &str) -> Option<Vec<SitePage>>;

    /// Store a page list, replacing any previous entry.
    fn put(&self, key: &str, pages: Vec<SitePage>);
}

/// In-memory [`SitemapCache`].
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, Vec<SitePage>>>,
}

impl MemoryCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached domains.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns `true` if nothing has been cached yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SitemapCache for MemoryCache {
    fn get(&self, key: &str) -> Option<Vec<SitePage>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn put(&self, key: &str, pages: Vec<SitePage>) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), pages);
    }
}

static PROCESS_CACHE: LazyLock<Arc<MemoryCache>> = LazyLock::new(|| Arc::new(MemoryCache::new()));

/// The cache shared by every resolver in this process.
pub fn process_cache() -> Arc<MemoryCache> {
    Arc::clone(&PROCESS_CACHE)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(slug: &str) -> SitePage {
        SitePage {
            url: format!("https://example.com{slug}"),
            slug: slug.to_string(),
            title: slug.trim_start_matches('/').to_string(),
        }
    }

    #[test]
    fn test_memory_cache_get_put() {
        let cache = MemoryCache::new();
        assert!(cache.is_empty());
        assert!(cache.get("sitemap_https://example.com").is_none());

        cache.put("sitemap_https://example.com", vec![page("/a"), page("/b")]);

        let pages = cache.get("sitemap_https://example.com");
        assert_eq!(pages.map(|p| p.len()), Some(2));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_memory_cache_stores_empty_lists() {
        let cache = MemoryCache::new();
        cache.put("sitemap_https://empty.example", Vec::new());
        assert_eq!(cache.get("sitemap_https://empty.example"), Some(Vec::new()));
    }

    #[test]
    fn test_process_cache_is_shared() {
        let first = process_cache();
        let second = process_cache();
        assert!(Arc::ptr_eq(&first, &second));
    }
}
