//! Run configuration for fetching and processing.
//!
//! All option structs deserialize with `#[serde(default)]`, so a partial JSON
//! object only overrides the fields it names.

use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::time::Duration;

const fn non_zero(n: usize) -> NonZeroUsize {
    match NonZeroUsize::new(n) {
        Some(n) => n,
        None => panic!("size must be non-zero"),
    }
}

/// Per-request document cap. Stores may silently truncate larger result
/// sets, so unbounded fetches are split into pages of at most this size.
pub const MAX_BATCH_SIZE: NonZeroUsize = non_zero(500);

pub const DEFAULT_CHUNK_SIZE: NonZeroUsize = non_zero(500);

/// Options for `get_documents` and `get_some_documents`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryOptions {
    /// Run the query as-is, without a cap and without pagination. The caller
    /// is responsible for bounding the result size.
    pub disable_batching: bool,
    pub batch_size: NonZeroUsize,
    /// Stop after the first page. Meant for test runs of scripts, never
    /// for production sweeps.
    pub limit_to_first_batch: bool,
    /// Field reported in progress lines instead of the document id.
    pub order_by_field: Option<String>,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            disable_batching: false,
            batch_size: MAX_BATCH_SIZE,
            limit_to_first_batch: false,
            order_by_field: None,
        }
    }
}

/// Options for `process_in_chunks` and `process_in_chunks_by_chunk`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingOptions {
    pub chunk_size: NonZeroUsize,
    pub throttle_secs: f64,
}

impl Default for ChunkingOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            throttle_secs: 0.0,
        }
    }
}

impl ChunkingOptions {
    pub fn throttle(&self) -> Duration {
        secs_to_duration(self.throttle_secs)
    }
}

/// Options for `query_and_process` and `query_and_process_by_chunk`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessOptions {
    pub batch_size: NonZeroUsize,
    pub limit_to_first_batch: bool,
    pub throttle_secs: f64,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_CHUNK_SIZE,
            limit_to_first_batch: false,
            throttle_secs: 0.0,
        }
    }
}

impl ProcessOptions {
    pub fn throttle(&self) -> Duration {
        secs_to_duration(self.throttle_secs)
    }

    pub fn query_options(&self) -> QueryOptions {
        QueryOptions {
            batch_size: self.batch_size,
            limit_to_first_batch: self.limit_to_first_batch,
            ..QueryOptions::default()
        }
    }
}

// Negative and non-finite values disable throttling.
fn secs_to_duration(secs: f64) -> Duration {
    Duration::try_from_secs_f64(secs).unwrap_or_default()
}
