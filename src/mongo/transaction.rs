use async_trait::async_trait;
use mongodb::bson::doc;
use mongodb::{Client, ClientSession};

use crate::error::Result;
use crate::mongo::collection::MongoCollection;
use crate::mongo::cursor_engine::collect_session_snapshots;
use crate::mongo::query::MongoQuery;
use crate::mongo::snapshot::{parse_key, MongoSnapshot};
use crate::store::{Collection, Transaction};

/// A multi-document transaction. Requires a replica set or sharded cluster.
pub struct MongoTransaction {
    session: ClientSession,
}

impl MongoTransaction {
    pub async fn start(client: &Client) -> Result<Self> {
        let mut session = client.start_session(None).await?;
        session.start_transaction(None).await?;
        Ok(Self { session })
    }

    pub async fn commit(mut self) -> Result<()> {
        self.session.commit_transaction().await?;
        Ok(())
    }

    pub async fn abort(mut self) -> Result<()> {
        self.session.abort_transaction().await?;
        Ok(())
    }
}

#[async_trait]
impl Transaction for MongoTransaction {
    type Snapshot = MongoSnapshot;
    type Collection = MongoCollection;
    type Query = MongoQuery;

    async fn get(&mut self, collection: &MongoCollection, id: &str) -> Result<MongoSnapshot> {
        let found = collection
            .inner()
            .find_one_with_session(doc! { "_id": parse_key(id) }, None, &mut self.session)
            .await?;

        Ok(match found {
            Some(doc) => MongoSnapshot::found(&collection.path(), doc),
            None => MongoSnapshot::missing(&collection.path(), id),
        })
    }

    async fn query(&mut self, query: &MongoQuery) -> Result<Vec<MongoSnapshot>> {
        let cursor = query
            .collection
            .find_with_session(query.effective_filter(), query.find_options(), &mut self.session)
            .await?;

        collect_session_snapshots(cursor, &mut self.session, &query.namespace()).await
    }
}
