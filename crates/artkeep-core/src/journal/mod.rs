//! Operations journal: undo and audit for artwork deletions.

mod entry;
mod store;

pub use entry::{DiscardOutcome, NewOperation, OperationAction, OperationEntry, UndoOutcome};
pub use store::{JournalTxn, OperationsJournal};
