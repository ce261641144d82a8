//! Backup group layout on disk.

mod group;

pub use group::{tree_size, BackupGroup, TreeSize};
