//! Upstream network helpers.

mod retry;

pub use retry::{with_retry, RetryPolicy};
