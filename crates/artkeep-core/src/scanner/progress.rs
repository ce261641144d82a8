//! Thread-safe progress tracking for library scans.

use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};

/// What the UI polls while a scan runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanProgress {
    pub scanning: bool,
    pub current: usize,
    pub total: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_item: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub library: Option<String>,
}

#[derive(Default)]
struct TrackerState {
    progress: ScanProgress,
    /// Id of the session allowed to write; older sessions are ignored.
    session: u64,
}

/// Tracks the most recent scan.
#[derive(Default)]
pub struct ScanProgressTracker {
    state: Mutex<TrackerState>,
}

impl ScanProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, TrackerState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Start a new scan of `library`, superseding any running one.
    pub fn start(self: &Arc<Self>, library: &str) -> ScanSession {
        let mut state = self.lock();
        state.session += 1;
        state.progress = ScanProgress {
            scanning: true,
            library: Some(library.to_string()),
            ..ScanProgress::default()
        };
        ScanSession {
            tracker: Arc::clone(self),
            id: state.session,
        }
    }

    pub fn snapshot(&self) -> ScanProgress {
        self.lock().progress.clone()
    }

    fn update(&self, session: u64, apply: impl FnOnce(&mut ScanProgress)) {
        let mut state = self.lock();
        if state.session == session {
            apply(&mut state.progress);
        }
    }
}

/// Write handle for one scan. Dropping it (on any exit path, including a
/// panic) marks the scan finished unless a newer scan has started.
pub struct ScanSession {
    tracker: Arc<ScanProgressTracker>,
    id: u64,
}

impl ScanSession {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn set_total(&self, total: usize) {
        self.tracker.update(self.id, |p| p.total = total);
    }

    /// Record one more processed item.
    pub fn advance(&self, item: &str) {
        self.tracker.update(self.id, |p| {
            p.current += 1;
            p.current_item = Some(item.to_string());
        });
    }
}

impl Drop for ScanSession {
    fn drop(&mut self) {
        self.tracker.update(self.id, |p| {
            p.scanning = false;
            p.current_item = None;
        });
    }
}
