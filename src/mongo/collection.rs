use async_trait::async_trait;
use mongodb::bson::{doc, Document};

use crate::error::Result;
use crate::mongo::query::MongoQuery;
use crate::mongo::snapshot::{parse_key, MongoSnapshot};
use crate::store::Collection;

#[derive(Debug, Clone)]
pub struct MongoCollection {
    inner: mongodb::Collection<Document>,
}

impl MongoCollection {
    pub fn new(inner: mongodb::Collection<Document>) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &mongodb::Collection<Document> {
        &self.inner
    }

    pub fn query(&self, filter: Document) -> MongoQuery {
        MongoQuery::new(self.inner.clone(), filter)
    }

    pub fn all(&self) -> MongoQuery {
        self.query(Document::new())
    }
}

#[async_trait]
impl Collection for MongoCollection {
    type Snapshot = MongoSnapshot;

    fn path(&self) -> String {
        self.inner.namespace().to_string()
    }

    async fn get(&self, id: &str) -> Result<MongoSnapshot> {
        let found = self.inner.find_one(doc! { "_id": parse_key(id) }, None).await?;

        Ok(match found {
            Some(doc) => MongoSnapshot::found(&self.path(), doc),
            None => MongoSnapshot::missing(&self.path(), id),
        })
    }
}
