//! API implementation submodules.
//!
//! Each submodule contains `impl ArtkeepApi` blocks. The struct itself is
//! defined in `lib.rs`.

mod artwork;
mod backups;
mod builder;
mod state;

pub use builder::ArtkeepApiBuilder;
pub(crate) use state::CoreState;
