//! Library scanning: which items carry deletable custom artwork.

use super::progress::{ScanProgressTracker, ScanSession};
use crate::artwork::{ArtworkFile, KindFilter, PathResolver};
use crate::config::ScanConfig;
use crate::error::Result;
use crate::provider::{ItemType, LibraryItem};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// An item with at least one custom artwork file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScannedItem {
    pub rating_key: String,
    pub title: String,
    #[serde(rename = "type")]
    pub item_type: ItemType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<u32>,
    pub base_dir: PathBuf,
    pub artwork_count: usize,
    pub total_bytes: u64,
    pub artwork: Vec<ArtworkFile>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanStats {
    /// Items returned.
    pub total_items: usize,
    /// Files across returned items.
    pub total_artwork: usize,
    /// Size of the library as reported by the provider.
    pub total_count: usize,
    pub total_bytes: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScanResult {
    pub success: bool,
    pub library: String,
    pub items: Vec<ScannedItem>,
    pub stats: ScanStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// Enumerates a library and resolves every item's custom artwork.
pub struct LibraryScanner {
    resolver: PathResolver,
    progress: Arc<ScanProgressTracker>,
    workers: usize,
    page_size: usize,
}

impl LibraryScanner {
    pub fn new(resolver: PathResolver, progress: Arc<ScanProgressTracker>) -> Self {
        Self {
            resolver,
            progress,
            workers: ScanConfig::WORKERS,
            page_size: ScanConfig::PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn progress(&self) -> &Arc<ScanProgressTracker> {
        &self.progress
    }

    /// Scan `limit` items of `library` starting at `offset` (all remaining
    /// items when `limit` is `None`).
    ///
    /// Items without custom artwork are dropped from the result; the window
    /// applies to the raw listing.
    pub async fn scan(
        &self,
        library: &str,
        limit: Option<usize>,
        offset: usize,
    ) -> Result<ScanResult> {
        self.scan_matching(library, None, limit, offset).await
    }

    /// Like [`LibraryScanner::scan`], keeping only items whose title contains
    /// `query`, ignoring case. An empty query matches everything.
    pub async fn search(
        &self,
        library: &str,
        query: &str,
        limit: Option<usize>,
        offset: usize,
    ) -> Result<ScanResult> {
        let query = query.trim().to_lowercase();
        self.scan_matching(library, Some(query.as_str()), limit, offset)
            .await
    }

    async fn scan_matching(
        &self,
        library: &str,
        title_query: Option<&str>,
        limit: Option<usize>,
        offset: usize,
    ) -> Result<ScanResult> {
        let session = self.progress.start(library);
        info!(
            "Scanning library '{}' (offset {}, limit {:?}, title filter {:?})",
            library, offset, limit, title_query
        );

        let window_end = limit.map(|l| offset.saturating_add(l));
        let end_of = |total: Option<usize>| match (window_end, total) {
            (Some(w), Some(t)) => Some(w.min(t)),
            (w, t) => w.or(t),
        };

        let mut requested = limit.map_or(self.page_size, |l| l.min(self.page_size));
        let mut page = self
            .resolver
            .provider()
            .list_items(library, offset, requested)
            .await?;
        let mut total = page.total_size;
        if let Some(end) = end_of(total) {
            session.set_total(end.saturating_sub(offset));
        }

        let mut items = Vec::new();
        let mut position = offset;
        loop {
            let returned = page.items.len();
            // Without a reported size, a short page ends the library
            let exhausted = total.is_none() && returned < requested;
            if exhausted {
                total = Some(position + returned);
            }
            let wanted = end_of(total).map_or(usize::MAX, |end| end.saturating_sub(position));
            let batch: Vec<LibraryItem> = page.items.into_iter().take(wanted).collect();
            if batch.is_empty() {
                break;
            }
            position += batch.len();
            items.extend(self.resolve_page(batch, title_query, &session).await);

            let end = end_of(total);
            if exhausted || end.is_some_and(|end| position >= end) {
                break;
            }
            requested = end.map_or(self.page_size, |end| (end - position).min(self.page_size));
            page = self
                .resolver
                .provider()
                .list_items(library, position, requested)
                .await?;
            total = total.or(page.total_size);
        }
        // Without a reported size the listing is the best lower bound
        let total_count = total.unwrap_or(position);
        session.set_total(position - offset);

        let stats = ScanStats {
            total_items: items.len(),
            total_artwork: items.iter().map(|i| i.artwork_count).sum(),
            total_count,
            total_bytes: items.iter().map(|i| i.total_bytes).sum(),
        };
        let warning = items.is_empty().then(|| match title_query {
            Some(query) if !query.is_empty() => format!(
                "No items matching '{}' with custom artwork in library '{}' ({} items checked)",
                query,
                library,
                position - offset
            ),
            _ => format!(
                "No custom artwork found in library '{}' ({} items checked)",
                library,
                position - offset
            ),
        });

        info!(
            "Scan of '{}' found {} items with {} custom files ({} bytes)",
            library, stats.total_items, stats.total_artwork, stats.total_bytes
        );
        Ok(ScanResult {
            success: true,
            library: library.to_string(),
            items,
            stats,
            warning,
        })
    }

    /// Resolve one page with bounded concurrency, keeping listing order.
    async fn resolve_page(
        &self,
        batch: Vec<LibraryItem>,
        title_query: Option<&str>,
        session: &ScanSession,
    ) -> Vec<ScannedItem> {
        stream::iter(batch)
            .map(|item| async move {
                let scanned = if title_matches(&item.title, title_query) {
                    self.resolve_item(&item).await
                } else {
                    None
                };
                session.advance(&item.title);
                scanned
            })
            .buffered(self.workers)
            .filter_map(|scanned| async move { scanned })
            .collect()
            .await
    }

    async fn resolve_item(&self, item: &LibraryItem) -> Option<ScannedItem> {
        let details = match self.resolver.provider().get_item(&item.rating_key).await {
            Ok(details) => details,
            Err(e) => {
                warn!("Skipping '{}' ({}): {}", item.title, item.rating_key, e);
                return None;
            }
        };
        let resolution = match self
            .resolver
            .resolve_details(&details, KindFilter::All, None)
            .await
        {
            Ok(resolution) => resolution,
            Err(e) => {
                debug!("Skipping '{}' ({}): {}", item.title, item.rating_key, e);
                return None;
            }
        };
        if resolution.files.is_empty() {
            return None;
        }

        Some(ScannedItem {
            rating_key: item.rating_key.clone(),
            title: item.title.clone(),
            item_type: item.item_type,
            year: item.year,
            base_dir: resolution.base_dir.clone(),
            artwork_count: resolution.files.len(),
            total_bytes: resolution.total_bytes(),
            artwork: resolution.files,
        })
    }
}

fn title_matches(title: &str, query: Option<&str>) -> bool {
    match query {
        Some(query) => title.to_lowercase().contains(query),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artwork::ResolverOptions;
    use crate::error::ArtkeepError;
    use crate::provider::{
        ItemDetails, ItemPage, LibrarySection, MetadataProvider, StaticProvider,
    };
    use async_trait::async_trait;
    use std::fs;
    use tempfile::TempDir;

    fn library(tmp: &TempDir, size: usize, with_uploads: &[usize]) -> Arc<StaticProvider> {
        let provider = Arc::new(StaticProvider::new());
        for i in 0..size {
            let bundle = tmp.path().join(format!("{}.bundle", i));
            fs::create_dir_all(&bundle).unwrap();
            if with_uploads.contains(&i) {
                let posters = bundle.join("Uploads").join("posters");
                fs::create_dir_all(&posters).unwrap();
                fs::write(posters.join("p"), [1u8; 10]).unwrap();
            }
            provider.insert("Movies", i.to_string(), format!("Movie {}", i), ItemType::Movie, bundle);
        }
        provider
    }

    fn scanner(provider: Arc<StaticProvider>) -> LibraryScanner {
        LibraryScanner::new(
            PathResolver::new(provider, ResolverOptions::default()),
            Arc::new(ScanProgressTracker::new()),
        )
        .with_page_size(4)
    }

    #[tokio::test]
    async fn test_scan_filters_and_counts() {
        let tmp = TempDir::new().unwrap();
        let scanner = scanner(library(&tmp, 11, &[1, 5, 9]));

        let result = scanner.scan("Movies", None, 0).await.unwrap();
        let keys: Vec<_> = result.items.iter().map(|i| i.rating_key.as_str()).collect();
        assert_eq!(keys, vec!["1", "5", "9"]);
        assert_eq!(result.stats.total_count, 11);
        assert_eq!(result.stats.total_artwork, 3);
        assert_eq!(result.stats.total_bytes, 30);
        assert!(result.warning.is_none());

        let progress = scanner.progress().snapshot();
        assert!(!progress.scanning);
        assert_eq!((progress.current, progress.total), (11, 11));
    }

    #[tokio::test]
    async fn test_window_applies_to_raw_listing() {
        let tmp = TempDir::new().unwrap();
        let scanner = scanner(library(&tmp, 11, &[1, 5, 9]));

        let result = scanner.scan("Movies", Some(5), 2).await.unwrap();
        let keys: Vec<_> = result.items.iter().map(|i| i.rating_key.as_str()).collect();
        assert_eq!(keys, vec!["5"]);
        assert_eq!(result.stats.total_count, 11);
    }

    #[tokio::test]
    async fn test_empty_result_warns() {
        let tmp = TempDir::new().unwrap();
        let scanner = scanner(library(&tmp, 3, &[]));
        let result = scanner.scan("Movies", None, 0).await.unwrap();
        assert!(result.items.is_empty());
        assert!(result.warning.unwrap().contains("No custom artwork"));
    }

    #[tokio::test]
    async fn test_unknown_library_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let scanner = scanner(library(&tmp, 1, &[]));
        assert!(matches!(
            scanner.scan("Music", None, 0).await,
            Err(ArtkeepError::NotFound { .. })
        ));
        assert!(!scanner.progress().snapshot().scanning);
    }

    /// Lists like the wrapped catalog but never reports the library size.
    struct UncountedProvider(Arc<StaticProvider>);

    #[async_trait]
    impl MetadataProvider for UncountedProvider {
        async fn get_item(&self, rating_key: &str) -> Result<ItemDetails> {
            self.0.get_item(rating_key).await
        }

        async fn refresh(&self, rating_key: &str) -> Result<()> {
            self.0.refresh(rating_key).await
        }

        async fn list_items(&self, library: &str, offset: usize, limit: usize) -> Result<ItemPage> {
            let page = self.0.list_items(library, offset, limit).await?;
            Ok(ItemPage {
                total_size: None,
                ..page
            })
        }

        async fn libraries(&self) -> Result<Vec<LibrarySection>> {
            self.0.libraries().await
        }
    }

    #[tokio::test]
    async fn test_pages_until_short_page_without_library_size() {
        let tmp = TempDir::new().unwrap();
        let provider = Arc::new(UncountedProvider(library(&tmp, 10, &[0, 9])));
        let scanner = LibraryScanner::new(
            PathResolver::new(provider, ResolverOptions::default()),
            Arc::new(ScanProgressTracker::new()),
        )
        .with_page_size(4);

        let result = scanner.scan("Movies", None, 0).await.unwrap();
        let keys: Vec<_> = result.items.iter().map(|i| i.rating_key.as_str()).collect();
        assert_eq!(keys, vec!["0", "9"]);
        assert_eq!(result.stats.total_count, 10);
        assert_eq!(scanner.progress().snapshot().current, 10);

        let windowed = scanner.scan("Movies", Some(3), 8).await.unwrap();
        assert_eq!(windowed.items.len(), 1);
        assert_eq!(windowed.stats.total_count, 10);
    }

    #[tokio::test]
    async fn test_search_filters_titles_case_insensitively() {
        let tmp = TempDir::new().unwrap();
        let scanner = scanner(library(&tmp, 12, &[1, 10, 11]));

        let result = scanner.search("Movies", "  MOVIE 1", None, 0).await.unwrap();
        let keys: Vec<_> = result.items.iter().map(|i| i.rating_key.as_str()).collect();
        assert_eq!(keys, vec!["1", "10", "11"]);
        assert_eq!(result.stats.total_count, 12);

        let none = scanner.search("Movies", "heat", None, 0).await.unwrap();
        assert!(none.items.is_empty());
        assert!(none.warning.unwrap().contains("matching 'heat'"));

        let everything = scanner.search("Movies", "", None, 0).await.unwrap();
        assert_eq!(everything.items.len(), 3);
    }
}
