//! Path resolution for virtual artwork references.
//!
//! Custom artwork lives under `<base_dir>/Uploads/<kind dir>/`, one file per
//! upload, named by content hash or agent id and carrying no extension.
//! Every regular file in a candidate directory counts; sniffing only
//! annotates.

use super::reference::VirtualArtworkRef;
use super::sniff::sniff_media_type;
use super::types::{ArtworkFile, ArtworkKind, KindFilter, Selector};
use crate::config::PathsConfig;
use crate::error::{ArtkeepError, Result};
use crate::provider::{ItemDetails, ItemType, MetadataProvider};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Resolution policy.
#[derive(Debug, Clone, Copy)]
pub struct ResolverOptions {
    /// When false, themes are skipped for `all` and explicit theme
    /// references are rejected.
    pub include_themes: bool,
    /// Sniff each file's leading bytes to annotate its media type.
    pub sniff: bool,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            include_themes: true,
            sniff: true,
        }
    }
}

/// Files found for one item, in kind order then path order.
#[derive(Debug, Clone, Serialize)]
pub struct Resolution {
    pub base_dir: PathBuf,
    /// Whether `<base_dir>/Uploads` exists at all.
    pub uploads_present: bool,
    pub files: Vec<ArtworkFile>,
}

impl Resolution {
    pub fn uploads_dir(&self) -> PathBuf {
        self.base_dir.join(PathsConfig::UPLOADS_DIR_NAME)
    }

    pub fn total_bytes(&self) -> u64 {
        self.files.iter().map(|f| f.size_bytes).sum()
    }

    /// Apply a selector. An out-of-range index selects nothing.
    pub fn select(&self, selector: Selector) -> Vec<ArtworkFile> {
        match selector {
            Selector::All => self.files.clone(),
            Selector::Index(i) => self.files.get(i).cloned().into_iter().collect(),
        }
    }
}

/// Maps virtual references to files on disk.
#[derive(Clone)]
pub struct PathResolver {
    provider: Arc<dyn MetadataProvider>,
    options: ResolverOptions,
}

impl PathResolver {
    pub fn new(provider: Arc<dyn MetadataProvider>, options: ResolverOptions) -> Self {
        Self { provider, options }
    }

    pub fn options(&self) -> ResolverOptions {
        self.options
    }

    pub fn provider(&self) -> &Arc<dyn MetadataProvider> {
        &self.provider
    }

    /// Look the item up and list its custom artwork for `reference`.
    ///
    /// The selector is not applied; see [`Resolution::select`].
    pub async fn resolve(&self, reference: &VirtualArtworkRef) -> Result<(ItemDetails, Resolution)> {
        self.check_policy(reference.kind)?;
        let details = self.provider.get_item(&reference.rating_key).await?;
        let resolution = self
            .resolve_details(&details, reference.kind, reference.season_index)
            .await?;
        Ok((details, resolution))
    }

    /// List artwork for an already-fetched item.
    pub async fn resolve_details(
        &self,
        details: &ItemDetails,
        kind: KindFilter,
        season: Option<u32>,
    ) -> Result<Resolution> {
        let options = self.options;
        let base_dir = details.base_dir.clone();
        let item_type = details.item.item_type;
        tokio::task::spawn_blocking(move || {
            resolve_dir(&base_dir, item_type, kind, season, options)
        })
        .await
        .map_err(|e| ArtkeepError::Other(format!("Resolver task failed: {}", e)))?
    }

    fn check_policy(&self, kind: KindFilter) -> Result<()> {
        if kind == KindFilter::Kind(ArtworkKind::Theme) && !self.options.include_themes {
            return Err(ArtkeepError::Validation {
                field: "kind".to_string(),
                message: "theme music is excluded by configuration".to_string(),
            });
        }
        Ok(())
    }
}

/// Enumerate custom artwork under `base_dir`. Blocking.
pub fn resolve_dir(
    base_dir: &Path,
    item_type: ItemType,
    kind: KindFilter,
    season: Option<u32>,
    options: ResolverOptions,
) -> Result<Resolution> {
    if !base_dir.is_dir() {
        return Err(ArtkeepError::not_found(format!(
            "Bundle directory {} does not exist",
            base_dir.display()
        )));
    }

    let uploads = base_dir.join(PathsConfig::UPLOADS_DIR_NAME);
    let uploads_present = uploads.is_dir();
    let mut files = Vec::new();

    if uploads_present {
        for artwork_kind in ArtworkKind::ALL {
            if !kind.matches(artwork_kind) {
                continue;
            }
            if artwork_kind == ArtworkKind::Theme && !options.include_themes {
                continue;
            }
            let kind_dir = uploads.join(artwork_kind.dir_name());

            if season.is_none() {
                collect_files(&kind_dir, artwork_kind, None, options, &mut files);
            }
            if artwork_kind == ArtworkKind::Poster && item_type.has_seasons() {
                collect_season_posters(&kind_dir, season, options, &mut files);
            }
        }
    }

    files.sort_by(|a, b| {
        a.kind
            .cmp(&b.kind)
            .then(a.season_index.cmp(&b.season_index))
            .then_with(|| a.path.cmp(&b.path))
    });

    debug!(
        "Resolved {} files under {} ({:?})",
        files.len(),
        base_dir.display(),
        kind
    );

    Ok(Resolution {
        base_dir: base_dir.to_path_buf(),
        uploads_present,
        files,
    })
}

fn collect_season_posters(
    posters_dir: &Path,
    season: Option<u32>,
    options: ResolverOptions,
    out: &mut Vec<ArtworkFile>,
) {
    let seasons_dir = posters_dir.join(PathsConfig::SEASONS_DIR_NAME);
    if !seasons_dir.is_dir() {
        return;
    }
    for entry in WalkDir::new(&seasons_dir).min_depth(1).max_depth(1) {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!("Failed to read {}: {}", seasons_dir.display(), e);
                continue;
            }
        };
        if !entry.file_type().is_dir() {
            continue;
        }
        let Some(index) = entry.file_name().to_str().and_then(|n| n.parse::<u32>().ok()) else {
            continue;
        };
        if season.is_some_and(|wanted| wanted != index) {
            continue;
        }
        collect_files(entry.path(), ArtworkKind::Poster, Some(index), options, out);
    }
}

/// Add every regular file directly inside `dir`. A missing directory adds
/// nothing.
fn collect_files(
    dir: &Path,
    kind: ArtworkKind,
    season_index: Option<u32>,
    options: ResolverOptions,
    out: &mut Vec<ArtworkFile>,
) {
    if !dir.is_dir() {
        return;
    }
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!("Failed to read {}: {}", dir.display(), e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let size_bytes = match entry.metadata() {
            Ok(m) => m.len(),
            Err(e) => {
                warn!("Failed to stat {}: {}", entry.path().display(), e);
                continue;
            }
        };
        let media_type = if options.sniff {
            sniff_media_type(entry.path())
        } else {
            None
        };
        out.push(ArtworkFile {
            path: entry.into_path(),
            kind,
            size_bytes,
            media_type,
            season_index,
        });
    }
}
