//! Builder for configuring ArtkeepApi initialization.

use std::path::PathBuf;
use std::sync::Arc;

use crate::api::state::CoreState;
use crate::artwork::{PathResolver, ResolverOptions};
use crate::config::PathsConfig;
use crate::deletion::DeletionEngine;
use crate::error::{ArtkeepError, Result};
use crate::journal::OperationsJournal;
use crate::provider::MetadataProvider;
use crate::retention::RetentionManager;
use crate::scanner::{LibraryScanner, ScanProgressTracker};
use crate::ArtkeepApi;

/// Builder for configuring ArtkeepApi initialization.
///
/// # Example
///
/// ```rust,ignore
/// use artkeep_core::{ArtkeepApi, PlexProvider};
///
/// let provider = PlexProvider::new("http://localhost:32400", Some(token), metadata_root)?;
/// let api = ArtkeepApi::builder("./artkeep-data")
///     .provider(Arc::new(provider))
///     .auto_create_dirs(true)
///     .build()?;
/// ```
pub struct ArtkeepApiBuilder {
    data_dir: PathBuf,
    backup_root: Option<PathBuf>,
    provider: Option<Arc<dyn MetadataProvider>>,
    resolver_options: ResolverOptions,
    auto_create_dirs: bool,
}

impl ArtkeepApiBuilder {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            backup_root: None,
            provider: None,
            resolver_options: ResolverOptions::default(),
            auto_create_dirs: false,
        }
    }

    /// Metadata provider to resolve items through. Required.
    pub fn provider(mut self, provider: Arc<dyn MetadataProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Put backups somewhere other than `<data_dir>/backups`.
    pub fn backup_root(mut self, backup_root: impl Into<PathBuf>) -> Self {
        self.backup_root = Some(backup_root.into());
        self
    }

    /// Whether theme music is resolvable and deletable.
    ///
    /// Default: `true`
    pub fn include_themes(mut self, include: bool) -> Self {
        self.resolver_options.include_themes = include;
        self
    }

    /// Create the data directory if it doesn't exist.
    ///
    /// Default: `false` (the directory must exist)
    pub fn auto_create_dirs(mut self, enable: bool) -> Self {
        self.auto_create_dirs = enable;
        self
    }

    /// Build the ArtkeepApi instance.
    ///
    /// Opens (and locks) the operations journal.
    pub fn build(self) -> Result<ArtkeepApi> {
        if !self.data_dir.exists() {
            if !self.auto_create_dirs {
                return Err(ArtkeepError::Config {
                    message: format!("Data directory does not exist: {}", self.data_dir.display()),
                });
            }
            std::fs::create_dir_all(&self.data_dir).map_err(|e| ArtkeepError::Io {
                message: format!("Failed to create data directory: {}", self.data_dir.display()),
                path: Some(self.data_dir.clone()),
                source: Some(e),
            })?;
        }

        let provider = self.provider.ok_or_else(|| ArtkeepError::Config {
            message: "A metadata provider is required".to_string(),
        })?;
        let backup_root = self
            .backup_root
            .unwrap_or_else(|| self.data_dir.join(PathsConfig::BACKUPS_DIR_NAME));

        let journal = Arc::new(OperationsJournal::open(&backup_root)?);
        let resolver = PathResolver::new(provider, self.resolver_options);
        let progress = Arc::new(ScanProgressTracker::new());

        let state = CoreState {
            engine: DeletionEngine::new(resolver.clone(), journal.clone(), &backup_root),
            retention: RetentionManager::new(&backup_root, journal.clone()),
            scanner: LibraryScanner::new(resolver.clone(), progress),
            resolver,
            journal,
        };

        Ok(ArtkeepApi {
            data_dir: self.data_dir,
            backup_root,
            state: Arc::new(state),
        })
    }
}
