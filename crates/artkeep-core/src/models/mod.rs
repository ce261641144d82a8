//! Data models for the API boundary.

mod responses;

pub use responses::*;
