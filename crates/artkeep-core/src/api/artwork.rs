//! Scanning and deletion methods on ArtkeepApi.

use crate::artwork::{PathResolver, Resolution, VirtualArtworkRef};
use crate::deletion::BatchResult;
use crate::error::{ArtkeepError, Result};
use crate::models::LibrariesResponse;
use crate::scanner::{find_duplicates, DuplicateReport, ScanProgress, ScanResult};
use crate::ArtkeepApi;

impl ArtkeepApi {
    // ========================================
    // Library scanning
    // ========================================

    /// Scan a library for items with custom artwork.
    pub async fn scan(
        &self,
        library: &str,
        limit: Option<usize>,
        offset: usize,
    ) -> Result<ScanResult> {
        require_library(library)?;
        self.state.scanner.scan(library, limit, offset).await
    }

    /// Scan a library, keeping only items whose title contains `query`.
    pub async fn search(
        &self,
        library: &str,
        query: &str,
        limit: Option<usize>,
        offset: usize,
    ) -> Result<ScanResult> {
        require_library(library)?;
        self.state
            .scanner
            .search(library, query, limit, offset)
            .await
    }

    /// Scan the whole library and group its custom artwork by content.
    pub async fn find_duplicates(&self, library: &str) -> Result<DuplicateReport> {
        require_library(library)?;
        let scan = self.state.scanner.scan(library, None, 0).await?;
        let groups = find_duplicates(scan.items).await?;
        Ok(DuplicateReport::new(library, groups))
    }

    pub fn scan_progress(&self) -> ScanProgress {
        self.state.scanner.progress().snapshot()
    }

    pub async fn libraries(&self) -> Result<LibrariesResponse> {
        let libraries = self.state.resolver.provider().libraries().await?;
        Ok(LibrariesResponse {
            success: true,
            libraries,
        })
    }

    // ========================================
    // Deletion
    // ========================================

    /// Delete everything the virtual references address.
    pub async fn delete(&self, refs: &[String], reason: &str) -> Result<BatchResult> {
        self.state.engine.delete_all(refs, reason).await
    }

    /// Preview the files a reference would delete, without touching anything.
    pub async fn resolve(&self, reference: &str) -> Result<Resolution> {
        let reference: VirtualArtworkRef = reference.parse()?;
        let (_, mut resolution) = self.resolver().resolve(&reference).await?;
        resolution.files = resolution.select(reference.selector);
        Ok(resolution)
    }

    fn resolver(&self) -> &PathResolver {
        &self.state.resolver
    }
}

fn require_library(library: &str) -> Result<()> {
    if library.trim().is_empty() {
        return Err(ArtkeepError::InvalidParams {
            message: "library must not be empty".to_string(),
        });
    }
    Ok(())
}
