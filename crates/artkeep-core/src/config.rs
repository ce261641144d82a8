//! Centralized configuration for Artkeep.
//!
//! Constants for on-disk layout, scanning, retention and upstream network
//! access. Runtime settings (paths, server URL, token) come from the builder.

use std::time::Duration;

/// Application-level configuration.
pub struct AppConfig;

impl AppConfig {
    pub const APP_NAME: &'static str = "Artkeep";
    pub const USER_AGENT: &'static str = "Artkeep/0.3";
}

/// On-disk layout of the data directory and of media-server bundles.
pub struct PathsConfig;

impl PathsConfig {
    pub const BACKUPS_DIR_NAME: &'static str = "backups";
    pub const JOURNAL_FILENAME: &'static str = "operations.json";
    pub const JOURNAL_LOCK_FILENAME: &'static str = "operations.lock";
    /// Per-item directory holding user-uploaded artwork.
    pub const UPLOADS_DIR_NAME: &'static str = "Uploads";
    /// Season posters live at `posters/<SEASONS_DIR_NAME>/<n>/`.
    pub const SEASONS_DIR_NAME: &'static str = "seasons";
    pub const TEMP_SUFFIX: &'static str = ".artkeep-tmp";
}

/// Library scanning.
pub struct ScanConfig;

impl ScanConfig {
    /// Concurrent per-item resolutions during a scan.
    pub const WORKERS: usize = 5;
    /// Items requested from the metadata provider per page.
    pub const PAGE_SIZE: usize = 200;
}

/// Backup retention and journal listing defaults.
pub struct RetentionConfig;

impl RetentionConfig {
    pub const DEFAULT_DAYS: u32 = 30;
    pub const DEFAULT_OPERATIONS_LIMIT: usize = 50;
    /// Name format for new backup groups (sortable, unique per batch).
    pub const GROUP_NAME_FORMAT: &'static str = "%Y%m%d_%H%M%S_%6f";
    /// Name format written by earlier releases; still recognized.
    pub const LEGACY_GROUP_NAME_FORMAT: &'static str = "%Y%m%d_%H%M%S";
}

/// Upstream metadata provider access.
pub struct NetworkConfig;

impl NetworkConfig {
    pub const DEFAULT_PLEX_URL: &'static str = "http://localhost:32400";
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
    pub const MAX_RETRIES: u32 = 3;
    pub const RETRY_BASE_DELAY: Duration = Duration::from_millis(250);
    /// Sustained request rate allowed against the media server.
    pub const REQUESTS_PER_SECOND: u32 = 20;
}
