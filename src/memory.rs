//! An in-process document store.
//!
//! Documents are kept in insertion order, which is the natural order of every
//! query. The store counts reads and can be told to silently cap result sets
//! or to fail a specific read, which makes it suitable for exercising paging
//! and failure handling in tests.

use crate::error::{Error, Result};
use crate::store::{Collection, Query, Snapshot, Transaction};
use crate::utils::json::{get_path, render_value};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct State {
    docs: Vec<(String, Value)>,
    fetches: usize,
    silent_cap: Option<usize>,
    fail_on_fetch: Option<usize>,
}

#[derive(Debug)]
struct Inner {
    name: String,
    state: Mutex<State>,
}

impl Inner {
    /// A panic while holding the lock cannot leave `State` half-updated, so a
    /// poisoned lock is recovered rather than reported.
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Registers a read and applies the configured failure, if any.
    fn begin_fetch(&self) -> Result<MutexGuard<'_, State>> {
        let mut state = self.lock();
        state.fetches += 1;

        if state.fail_on_fetch == Some(state.fetches) {
            return Err(Error::Store(format!(
                "injected failure on read {} of {}",
                state.fetches, self.name
            )));
        }

        Ok(state)
    }

    fn snapshot(&self, id: &str, data: Option<Value>) -> MemorySnapshot {
        MemorySnapshot {
            id: id.to_string(),
            data,
            reference: MemoryRef {
                path: format!("{}/{}", self.name, id),
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl MemoryStore {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Inner {
                name: name.into(),
                state: Mutex::new(State::default()),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.inner.lock()
    }

    /// Inserts or replaces a document. New ids are appended to the end.
    pub fn insert(&self, id: impl Into<String>, data: Value) {
        let id = id.into();
        let mut state = self.state();
        match state.docs.iter_mut().find(|(existing, _)| *existing == id) {
            Some((_, existing)) => *existing = data,
            None => state.docs.push((id, data)),
        }
    }

    pub fn len(&self) -> usize {
        self.state().docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of reads served so far, including failed ones.
    pub fn fetch_count(&self) -> usize {
        self.state().fetches
    }

    /// Truncates every query result to `cap` documents without reporting it.
    pub fn set_silent_cap(&self, cap: Option<usize>) {
        self.state().silent_cap = cap;
    }

    /// Makes the `n`-th read (1-based, counted from store creation) fail.
    pub fn fail_on_fetch(&self, n: usize) {
        self.state().fail_on_fetch = Some(n);
    }

    pub fn collection(&self) -> MemoryCollection {
        MemoryCollection {
            inner: Arc::clone(&self.inner),
        }
    }

    /// A query over all documents in natural order.
    pub fn query(&self) -> MemoryQuery {
        MemoryQuery {
            inner: Arc::clone(&self.inner),
            limit: None,
            after: None,
        }
    }

    pub fn transaction(&self) -> MemoryTransaction {
        MemoryTransaction {
            collection: self.collection(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryRef {
    path: String,
}

impl MemoryRef {
    pub fn path(&self) -> &str {
        &self.path
    }
}

#[derive(Debug, Clone)]
pub struct MemorySnapshot {
    id: String,
    data: Option<Value>,
    reference: MemoryRef,
}

impl Snapshot for MemorySnapshot {
    type Ref = MemoryRef;

    fn id(&self) -> &str {
        &self.id
    }

    fn exists(&self) -> bool {
        self.data.is_some()
    }

    fn data<T: DeserializeOwned>(&self) -> Result<T> {
        let data = self.data.as_ref().ok_or_else(|| Error::NotFound {
            path: self.reference.path.clone(),
        })?;
        T::deserialize(data).map_err(|e| Error::Decode {
            id: self.id.clone(),
            message: e.to_string(),
        })
    }

    fn field(&self, path: &str) -> Option<String> {
        get_path(self.data.as_ref()?, path).and_then(render_value)
    }

    fn reference(&self) -> MemoryRef {
        self.reference.clone()
    }
}

#[derive(Debug, Clone)]
pub struct MemoryQuery {
    inner: Arc<Inner>,
    limit: Option<usize>,
    after: Option<String>,
}

#[async_trait]
impl Query for MemoryQuery {
    type Snapshot = MemorySnapshot;

    fn limit(&self, n: usize) -> Self {
        Self {
            limit: Some(n),
            ..self.clone()
        }
    }

    fn start_after(&self, snapshot: &MemorySnapshot) -> Self {
        Self {
            after: Some(snapshot.id.clone()),
            ..self.clone()
        }
    }

    async fn get(&self) -> Result<Vec<MemorySnapshot>> {
        let state = self.inner.begin_fetch()?;

        let start = match &self.after {
            Some(after) => {
                let position = state
                    .docs
                    .iter()
                    .position(|(id, _)| id == after)
                    .ok_or_else(|| {
                        Error::Store(format!("cursor document {} no longer exists", after))
                    })?;
                position + 1
            }
            None => 0,
        };

        let take = [self.limit, state.silent_cap]
            .into_iter()
            .flatten()
            .min()
            .unwrap_or(usize::MAX);

        Ok(state
            .docs
            .iter()
            .skip(start)
            .take(take)
            .map(|(id, data)| self.inner.snapshot(id, Some(data.clone())))
            .collect())
    }
}

#[derive(Debug, Clone)]
pub struct MemoryCollection {
    inner: Arc<Inner>,
}

#[async_trait]
impl Collection for MemoryCollection {
    type Snapshot = MemorySnapshot;

    fn path(&self) -> String {
        self.inner.name.clone()
    }

    async fn get(&self, id: &str) -> Result<MemorySnapshot> {
        let state = self.inner.begin_fetch()?;
        let data = state
            .docs
            .iter()
            .find(|(existing, _)| existing == id)
            .map(|(_, data)| data.clone());
        Ok(self.inner.snapshot(id, data))
    }
}

/// Reads go straight to the store; every read holds the store lock, so each
/// one sees a consistent state.
#[derive(Debug, Clone)]
pub struct MemoryTransaction {
    collection: MemoryCollection,
}

#[async_trait]
impl Transaction for MemoryTransaction {
    type Snapshot = MemorySnapshot;
    type Collection = MemoryCollection;
    type Query = MemoryQuery;

    async fn get(&mut self, collection: &MemoryCollection, id: &str) -> Result<MemorySnapshot> {
        if !Arc::ptr_eq(&collection.inner, &self.collection.inner) {
            return Err(Error::Store(format!(
                "collection {} is not part of this transaction",
                collection.inner.name
            )));
        }
        collection.get(id).await
    }

    async fn query(&mut self, query: &MemoryQuery) -> Result<Vec<MemorySnapshot>> {
        query.get().await
    }
}
