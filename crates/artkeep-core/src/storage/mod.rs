//! Durable storage primitives.
//!
//! This module provides:
//! - Atomic JSON file operations for the operations journal
//! - Durable file copies for backups and restores
//! - Content hashing to verify those copies

mod atomic;
mod hashing;

pub use atomic::{atomic_read_json, atomic_write_json, durable_copy};
pub use hashing::{compute_blake3, files_match};
