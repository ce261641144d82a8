//! Subsystems owned by an API instance.

use std::sync::Arc;

use crate::artwork::PathResolver;
use crate::deletion::DeletionEngine;
use crate::journal::OperationsJournal;
use crate::retention::RetentionManager;
use crate::scanner::LibraryScanner;

pub(crate) struct CoreState {
    pub(crate) resolver: PathResolver,
    pub(crate) journal: Arc<OperationsJournal>,
    pub(crate) engine: DeletionEngine,
    pub(crate) retention: RetentionManager,
    pub(crate) scanner: LibraryScanner,
}
