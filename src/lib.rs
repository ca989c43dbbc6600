//! Batched retrieval and chunked processing over document store queries.
//!
//! Stores cap how many documents one request may return and may truncate
//! larger result sets without reporting an error. This crate reads through
//! such stores in capped pages, resumes with an opaque cursor, and drives
//! callbacks over the results with bounded concurrency, collecting callback
//! failures instead of aborting on the first one.
//!
//! The store itself is abstracted by the traits in [`store`]; [`mongo`] backs
//! them with MongoDB and [`memory`] with an in-process collection.

pub mod document;
pub mod documents;
pub mod error;
pub mod memory;
pub mod mongo;
pub mod options;
pub mod process;
pub mod store;
pub mod utils;

pub use document::{
    get_document, get_document_from_transaction, get_document_from_transaction_maybe,
    get_document_maybe, make_document, Document, PlainDocument,
};
pub use documents::{
    get_documents, get_documents_from_transaction, get_first_document, get_some_documents,
    DocumentOf, Page, ResumeCursor,
};
pub use error::{Error, ErrorRecord, Result};
pub use options::{
    ChunkingOptions, ProcessOptions, QueryOptions, DEFAULT_CHUNK_SIZE, MAX_BATCH_SIZE,
};
pub use process::chunks::{process_in_chunks, process_in_chunks_by_chunk};
pub use process::query::{query_and_process, query_and_process_by_chunk, ProcessReport};
pub use utils::logging::{init_tracing, set_verbose, verbose_count, verbose_log};
