//! Retention: age-based cleanup and "empty trash".

mod manager;

pub use manager::{BackupInfo, CleanupReport, RetentionManager};
