use crate::error::{Error, Result};
use crate::store::{Collection, Snapshot, Transaction};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// A serializable document without a store reference. Useful when a document
/// is built from an API payload or has to be sent over the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlainDocument<T> {
    pub id: String,
    pub data: T,
}

/// A document read from the store, together with a reference back to it.
#[derive(Debug, Clone, PartialEq)]
pub struct Document<T, R> {
    id: String,
    data: T,
    reference: R,
}

impl<T, R> Document<T, R> {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn data(&self) -> &T {
        &self.data
    }

    pub fn reference(&self) -> &R {
        &self.reference
    }

    pub fn into_data(self) -> T {
        self.data
    }

    pub fn into_plain(self) -> PlainDocument<T> {
        PlainDocument {
            id: self.id,
            data: self.data,
        }
    }
}

/// Builds a document from a snapshot of an existing document.
pub fn make_document<T, S>(snapshot: &S) -> Result<Document<T, S::Ref>>
where
    T: DeserializeOwned,
    S: Snapshot,
{
    Ok(Document {
        id: snapshot.id().to_string(),
        data: snapshot.data()?,
        reference: snapshot.reference(),
    })
}

pub(crate) fn make_documents<T, S>(snapshots: &[S]) -> Result<Vec<Document<T, S::Ref>>>
where
    T: DeserializeOwned,
    S: Snapshot,
{
    snapshots.iter().map(make_document::<T, S>).collect()
}

fn not_found<C: Collection>(collection: &C, id: &str) -> Error {
    Error::NotFound {
        path: format!("{}/{}", collection.path(), id),
    }
}

/// Fetches a document that is expected to exist.
pub async fn get_document<T, C>(
    collection: &C,
    id: &str,
) -> Result<Document<T, <C::Snapshot as Snapshot>::Ref>>
where
    T: DeserializeOwned,
    C: Collection,
{
    let snapshot = collection.get(id).await?;

    if !snapshot.exists() {
        return Err(not_found(collection, id));
    }

    make_document(&snapshot)
}

/// Fetches a document that may not exist. An empty or missing id yields `None`
/// without touching the store.
pub async fn get_document_maybe<T, C>(
    collection: &C,
    id: Option<&str>,
) -> Result<Option<Document<T, <C::Snapshot as Snapshot>::Ref>>>
where
    T: DeserializeOwned,
    C: Collection,
{
    let Some(id) = id.filter(|id| !id.is_empty()) else {
        return Ok(None);
    };

    let snapshot = collection.get(id).await?;

    if !snapshot.exists() {
        return Ok(None);
    }

    make_document(&snapshot).map(Some)
}

pub async fn get_document_from_transaction<T, X>(
    transaction: &mut X,
    collection: &X::Collection,
    id: &str,
) -> Result<Document<T, <X::Snapshot as Snapshot>::Ref>>
where
    T: DeserializeOwned,
    X: Transaction,
{
    let snapshot = transaction.get(collection, id).await?;

    if !snapshot.exists() {
        return Err(not_found(collection, id));
    }

    make_document(&snapshot)
}

pub async fn get_document_from_transaction_maybe<T, X>(
    transaction: &mut X,
    collection: &X::Collection,
    id: Option<&str>,
) -> Result<Option<Document<T, <X::Snapshot as Snapshot>::Ref>>>
where
    T: DeserializeOwned,
    X: Transaction,
{
    let Some(id) = id.filter(|id| !id.is_empty()) else {
        return Ok(None);
    };

    let snapshot = transaction.get(collection, id).await?;

    if !snapshot.exists() {
        return Ok(None);
    }

    make_document(&snapshot).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct City {
        name: String,
        population: u64,
    }

    fn store() -> MemoryStore {
        let store = MemoryStore::new("cities");
        store.insert("ams", json!({ "name": "Amsterdam", "population": 921_402 }));
        store.insert("bad", json!({ "name": 42 }));
        store
    }

    #[tokio::test]
    async fn get_document_materializes_id_data_and_reference() {
        let store = store();
        let doc = get_document::<City, _>(&store.collection(), "ams")
            .await
            .unwrap();

        assert_eq!(doc.id(), "ams");
        assert_eq!(doc.data().name, "Amsterdam");
        assert_eq!(doc.reference().path(), "cities/ams");
    }

    #[tokio::test]
    async fn get_document_fails_loudly_when_missing() {
        let store = store();
        let err = get_document::<City, _>(&store.collection(), "nope")
            .await
            .unwrap_err();

        assert!(matches!(err, Error::NotFound { ref path } if path == "cities/nope"));
        assert_eq!(err.to_string(), "No document available at cities/nope");
    }

    #[tokio::test]
    async fn get_document_maybe_returns_none_for_missing_or_empty_id() {
        let store = store();
        let collection = store.collection();

        assert!(get_document_maybe::<City, _>(&collection, None).await.unwrap().is_none());
        assert!(get_document_maybe::<City, _>(&collection, Some("")).await.unwrap().is_none());
        assert!(get_document_maybe::<City, _>(&collection, Some("nope")).await.unwrap().is_none());
        assert_eq!(store.fetch_count(), 1);

        let found = get_document_maybe::<City, _>(&collection, Some("ams")).await.unwrap();
        assert_eq!(found.unwrap().into_data().population, 921_402);
    }

    #[tokio::test]
    async fn mismatched_payload_is_a_decode_error() {
        let store = store();
        let err = get_document::<City, _>(&store.collection(), "bad")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Decode { ref id, .. } if id == "bad"));
    }

    #[tokio::test]
    async fn transaction_lookups() {
        let store = store();
        let collection = store.collection();
        let mut tx = store.transaction();

        let doc = get_document_from_transaction::<City, _>(&mut tx, &collection, "ams")
            .await
            .unwrap();
        assert_eq!(doc.into_plain().id, "ams");

        let err = get_document_from_transaction::<City, _>(&mut tx, &collection, "nope")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));

        let maybe =
            get_document_from_transaction_maybe::<City, _>(&mut tx, &collection, Some("nope"))
                .await
                .unwrap();
        assert!(maybe.is_none());
    }
}
