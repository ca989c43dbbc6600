//! The capabilities this crate needs from a document store.
//!
//! A store supplies snapshots (point-in-time reads of one document), queries
//! that can be capped and positioned after a snapshot, collections for
//! lookups by id, and transactions for consistent reads. Implementations live
//! in [`crate::mongo`] and [`crate::memory`].

use crate::error::Result;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::fmt::Debug;

/// One document as read from the store.
pub trait Snapshot: Send + Sync {
    /// Stable handle to the document, usable for later lookups.
    type Ref: Clone + Debug + Send + Sync;

    fn id(&self) -> &str;

    fn exists(&self) -> bool;

    /// Deserializes the payload. Fails for missing documents and for payloads
    /// that do not match `T`.
    fn data<T: DeserializeOwned>(&self) -> Result<T>;

    /// Value of a dotted field path rendered as text, if present.
    fn field(&self, path: &str) -> Option<String>;

    fn reference(&self) -> Self::Ref;
}

/// A query that can be capped, positioned and executed.
///
/// `limit` and `start_after` return new queries and leave `self` untouched.
/// A snapshot passed to `start_after` must come from a page of the same base
/// query.
#[async_trait]
pub trait Query: Clone + Send + Sync {
    type Snapshot: Snapshot;

    fn limit(&self, n: usize) -> Self;

    fn start_after(&self, snapshot: &Self::Snapshot) -> Self;

    /// Executes the query. An empty vec means no results.
    async fn get(&self) -> Result<Vec<Self::Snapshot>>;
}

#[async_trait]
pub trait Collection: Send + Sync {
    type Snapshot: Snapshot;

    /// Path used in error messages, e.g. `cities` or `db.cities`.
    fn path(&self) -> String;

    /// Reads one document. A missing document yields a snapshot whose
    /// `exists()` is false, not an error.
    async fn get(&self, id: &str) -> Result<Self::Snapshot>;
}

/// Reads that observe a consistent view of the store.
#[async_trait]
pub trait Transaction: Send {
    type Snapshot: Snapshot;
    type Collection: Collection<Snapshot = Self::Snapshot>;
    type Query: Query<Snapshot = Self::Snapshot>;

    async fn get(&mut self, collection: &Self::Collection, id: &str) -> Result<Self::Snapshot>;

    async fn query(&mut self, query: &Self::Query) -> Result<Vec<Self::Snapshot>>;
}
