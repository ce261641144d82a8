//! Deletion engine: reversible soft deletes via backup groups.

mod engine;
mod result;

pub use engine::DeletionEngine;
pub use result::{to_mb, BatchResult, RefResult};
