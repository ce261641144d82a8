//! Artkeep Core - headless library for reversible cleanup of custom
//! media-server artwork.
//!
//! Resolves the extension-less upload files a media server keeps per item,
//! moves them into timestamped backup groups instead of deleting them
//! outright, and records every move in a journal so it can be undone.
//!
//! # Example
//!
//! ```rust,ignore
//! use artkeep_core::{ArtkeepApi, PlexProvider};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> artkeep_core::Result<()> {
//!     let plex = PlexProvider::new("http://localhost:32400", Some(token), metadata_root)?;
//!     let api = ArtkeepApi::builder("/var/lib/artkeep")
//!         .provider(Arc::new(plex))
//!         .auto_create_dirs(true)
//!         .build()?;
//!
//!     let scan = api.scan("TV Shows", Some(100), 0).await?;
//!     println!("{} items carry custom artwork", scan.stats.total_items);
//!
//!     let batch = api.delete(&["70791/posters/all".to_string()], "cleanup").await?;
//!     for id in batch.operation_ids() {
//!         api.undo(id).await?;
//!     }
//!     Ok(())
//! }
//! ```

pub mod artwork;
pub mod backup;
pub mod config;
pub mod deletion;
pub mod error;
pub mod journal;
pub mod models;
pub mod network;
pub mod provider;
pub mod retention;
pub mod scanner;
pub mod storage;

mod api;

// Re-export commonly used types
pub use artwork::{
    ArtworkFile, ArtworkKind, KindFilter, MediaType, PathResolver, Resolution, ResolverOptions,
    Selector, VirtualArtworkRef,
};
pub use backup::BackupGroup;
pub use deletion::{BatchResult, DeletionEngine, RefResult};
pub use error::{ArtkeepError, Result};
pub use journal::{OperationAction, OperationEntry, OperationsJournal};
pub use provider::{
    ItemDetails, ItemPage, ItemType, LibraryItem, LibrarySection, MetadataProvider, PlexProvider,
    StaticProvider,
};
pub use retention::{BackupInfo, CleanupReport, RetentionManager};
pub use scanner::{
    DuplicateGroup, DuplicateReport, LibraryScanner, ScanProgress, ScanResult, ScanStats,
    ScannedItem,
};

pub use api::ArtkeepApiBuilder;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use api::CoreState;

/// Main API struct for Artkeep operations.
///
/// Owns the journal lock for its backup root; only one instance per backup
/// root can exist at a time. Cheap to clone.
#[derive(Clone)]
pub struct ArtkeepApi {
    data_dir: PathBuf,
    backup_root: PathBuf,
    state: Arc<CoreState>,
}

impl ArtkeepApi {
    /// Create a builder for ArtkeepApi.
    pub fn builder(data_dir: impl Into<PathBuf>) -> ArtkeepApiBuilder {
        ArtkeepApiBuilder::new(data_dir)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn backup_root(&self) -> &Path {
        &self.backup_root
    }
}
