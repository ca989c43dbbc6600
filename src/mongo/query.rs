use async_trait::async_trait;
use mongodb::bson::{doc, Bson, Document};
use mongodb::options::FindOptions;
use mongodb::Collection;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::mongo::cursor_engine::collect_snapshots;
use crate::mongo::snapshot::MongoSnapshot;
use crate::store::{Query, Snapshot};
use crate::utils::json::{get_bson_path, json_to_bson};

/// A find query sorted ascending on one field, with `_id` as tiebreaker.
///
/// Pages resume strictly after the `(sort value, _id)` pair of the last
/// document read, so documents sharing a sort value are never skipped.
#[derive(Debug, Clone)]
pub struct MongoQuery {
    pub(crate) collection: Collection<Document>,
    filter: Document,
    sort_field: String,
    limit: Option<usize>,
    after: Option<Position>,
}

/// Sort value and `_id` of the last document of a page.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub value: Bson,
    pub id: Bson,
}

impl MongoQuery {
    pub fn new(collection: Collection<Document>, filter: Document) -> Self {
        Self {
            collection,
            filter,
            sort_field: "_id".to_string(),
            limit: None,
            after: None,
        }
    }

    pub fn from_json(collection: Collection<Document>, filter: Value) -> Result<Self> {
        Ok(Self::new(collection, parse_filter(filter)?))
    }

    pub fn order_by(self, field: impl Into<String>) -> Self {
        Self {
            sort_field: field.into(),
            ..self
        }
    }

    pub(crate) fn namespace(&self) -> String {
        self.collection.namespace().to_string()
    }

    pub(crate) fn effective_filter(&self) -> Document {
        paged_filter(&self.filter, &self.sort_field, self.after.as_ref())
    }

    pub(crate) fn find_options(&self) -> FindOptions {
        let mut options = FindOptions::default();
        options.sort = Some(sort_spec(&self.sort_field));
        options.limit = self.limit.and_then(|n| i64::try_from(n).ok());
        options
    }
}

/// Parses a JSON filter such as `{"country": "NL"}` into BSON.
pub fn parse_filter(filter: Value) -> Result<Document> {
    json_to_bson(filter).map_err(Error::InvalidFilter)
}

/// Ascending on `sort_field`, then on `_id`.
pub fn sort_spec(sort_field: &str) -> Document {
    let mut sort = Document::new();
    sort.insert(sort_field, 1);
    if sort_field != "_id" {
        sort.insert("_id", 1);
    }
    sort
}

/// Combines the base filter with the resume position, if any.
pub fn paged_filter(filter: &Document, sort_field: &str, after: Option<&Position>) -> Document {
    let Some(after) = after else {
        return filter.clone();
    };

    let position = if sort_field == "_id" {
        doc! { "_id": { "$gt": after.id.clone() } }
    } else {
        let mut greater = Document::new();
        greater.insert(sort_field, doc! { "$gt": after.value.clone() });

        let mut tied = Document::new();
        tied.insert(sort_field, after.value.clone());
        tied.insert("_id", doc! { "$gt": after.id.clone() });

        doc! { "$or": [greater, tied] }
    };

    if filter.is_empty() {
        position
    } else {
        doc! { "$and": [filter.clone(), position] }
    }
}

#[async_trait]
impl Query for MongoQuery {
    type Snapshot = MongoSnapshot;

    fn limit(&self, n: usize) -> Self {
        Self {
            limit: Some(n),
            ..self.clone()
        }
    }

    fn start_after(&self, snapshot: &MongoSnapshot) -> Self {
        let value = snapshot
            .raw()
            .and_then(|doc| get_bson_path(doc, &self.sort_field))
            .cloned()
            .unwrap_or(Bson::Null);

        Self {
            after: Some(Position {
                value,
                id: snapshot.reference().key,
            }),
            ..self.clone()
        }
    }

    async fn get(&self) -> Result<Vec<MongoSnapshot>> {
        let cursor = self
            .collection
            .find(self.effective_filter(), self.find_options())
            .await?;

        collect_snapshots(cursor, &self.namespace()).await
    }
}
