use mongodb::bson::{self, oid::ObjectId, Bson, Document};
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};
use crate::store::Snapshot;
use crate::utils::json::{bson_to_json, get_bson_path, render_value};

/// Where a document lives: `db.collection` plus its `_id`.
#[derive(Debug, Clone, PartialEq)]
pub struct MongoRef {
    pub namespace: String,
    pub key: Bson,
}

#[derive(Debug, Clone)]
pub struct MongoSnapshot {
    id: String,
    doc: Option<Document>,
    reference: MongoRef,
}

impl MongoSnapshot {
    pub(crate) fn found(namespace: &str, doc: Document) -> Self {
        let key = doc.get("_id").cloned().unwrap_or(Bson::Null);
        Self {
            id: render_key(&key),
            doc: Some(doc),
            reference: MongoRef {
                namespace: namespace.to_string(),
                key,
            },
        }
    }

    pub(crate) fn missing(namespace: &str, id: &str) -> Self {
        Self {
            id: id.to_string(),
            doc: None,
            reference: MongoRef {
                namespace: namespace.to_string(),
                key: parse_key(id),
            },
        }
    }

    pub(crate) fn raw(&self) -> Option<&Document> {
        self.doc.as_ref()
    }
}

impl Snapshot for MongoSnapshot {
    type Ref = MongoRef;

    fn id(&self) -> &str {
        &self.id
    }

    fn exists(&self) -> bool {
        self.doc.is_some()
    }

    fn data<T: DeserializeOwned>(&self) -> Result<T> {
        let doc = self.doc.clone().ok_or_else(|| Error::NotFound {
            path: format!("{}/{}", self.reference.namespace, self.id),
        })?;
        bson::from_document(doc).map_err(|e| Error::Decode {
            id: self.id.clone(),
            message: e.to_string(),
        })
    }

    fn field(&self, path: &str) -> Option<String> {
        let value = get_bson_path(self.doc.as_ref()?, path)?.clone();
        render_value(&bson_to_json(value))
    }

    fn reference(&self) -> MongoRef {
        self.reference.clone()
    }
}

/// `_id` as text: hex for ObjectIds, the plain value for strings.
pub fn render_key(key: &Bson) -> String {
    match key {
        Bson::ObjectId(oid) => oid.to_hex(),
        Bson::String(s) => s.clone(),
        other => render_value(&bson_to_json(other.clone())).unwrap_or_default(),
    }
}

/// Inverse of [`render_key`] for the common cases: 24-digit hex becomes an
/// ObjectId, anything else stays a string.
pub fn parse_key(id: &str) -> Bson {
    ObjectId::parse_str(id)
        .map(Bson::ObjectId)
        .unwrap_or_else(|_| Bson::String(id.to_string()))
}
