//! Library scanning, title search, duplicate detection and scan progress.

mod duplicates;
mod library;
mod progress;

pub use duplicates::{find_duplicates, DuplicateFile, DuplicateGroup, DuplicateReport};
pub use library::{LibraryScanner, ScanResult, ScanStats, ScannedItem};
pub use progress::{ScanProgress, ScanProgressTracker, ScanSession};
