//! Bulk processing with bounded concurrency.
//!
//! [`chunks`] works on collections already in memory, [`query`] sweeps a store
//! query page by page. Both fan out within one chunk or page, wait for all of
//! it to settle, and only then move on.

pub mod chunks;
pub mod query;

use std::time::Duration;

/// Joined with each unit of work so a unit takes at least `duration`.
pub(crate) async fn throttle(duration: Duration) {
    if !duration.is_zero() {
        tokio::time::sleep(duration).await;
    }
}
