use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// A single-document lookup found nothing at the given path.
    #[error("No document available at {path}")]
    NotFound { path: String },

    /// The store failed to execute a read.
    #[error("Store error: {0}")]
    Store(String),

    /// A query filter could not be converted into the store's format.
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    #[error("MongoDB error: {0}")]
    Mongo(#[from] mongodb::error::Error),

    /// A document payload could not be deserialized into the requested type.
    #[error("Failed to decode document {id}: {message}")]
    Decode { id: String, message: String },

    /// One or more chunks failed in `process_in_chunks_by_chunk`.
    /// `messages` holds at most the first ten failures, JSON-rendered.
    #[error(
        "Failed to process all chunks successfully. Error messages (limited to 10): {messages}"
    )]
    ChunksFailed { failed: usize, messages: String },
}

/// A callback failure recorded during a processing run.
///
/// `id` is the document id for per-document failures, the item index for
/// local per-item failures, and `None` for whole-chunk failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub id: Option<String>,
    pub message: String,
}

impl ErrorRecord {
    pub fn new(id: Option<String>, err: &anyhow::Error) -> Self {
        Self {
            id,
            message: error_message(err),
        }
    }
}

impl std::fmt::Display for ErrorRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.id {
            Some(id) => write!(f, "{}: {}", id, self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Renders an error with its full context chain on one line.
pub fn error_message(err: &anyhow::Error) -> String {
    format!("{:#}", err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn error_message_includes_context_chain() {
        let err = std::result::Result::<(), _>::Err(anyhow::anyhow!("disk full"))
            .context("writing city")
            .unwrap_err();
        assert_eq!(error_message(&err), "writing city: disk full");
    }

    #[test]
    fn error_record_display() {
        let with_id = ErrorRecord::new(Some("abc".into()), &anyhow::anyhow!("boom"));
        let without_id = ErrorRecord::new(None, &anyhow::anyhow!("boom"));
        assert_eq!(with_id.to_string(), "abc: boom");
        assert_eq!(without_id.to_string(), "boom");
    }
}
