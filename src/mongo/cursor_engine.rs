use futures::TryStreamExt;
use mongodb::{ClientSession, Cursor, SessionCursor, bson::Document};

use crate::error::Result;
use crate::mongo::snapshot::MongoSnapshot;

/// Drains a driver cursor into snapshots. A failed batch fails the whole read.
pub async fn collect_snapshots(
    cursor: Cursor<Document>,
    namespace: &str,
) -> Result<Vec<MongoSnapshot>> {
    let docs: Vec<Document> = cursor.try_collect().await?;
    Ok(into_snapshots(docs, namespace))
}

/// Same as [`collect_snapshots`] for a cursor bound to a session.
pub async fn collect_session_snapshots(
    mut cursor: SessionCursor<Document>,
    session: &mut ClientSession,
    namespace: &str,
) -> Result<Vec<MongoSnapshot>> {
    let mut docs = Vec::new();
    while let Some(doc) = cursor.next(session).await {
        docs.push(doc?);
    }
    Ok(into_snapshots(docs, namespace))
}

fn into_snapshots(docs: Vec<Document>, namespace: &str) -> Vec<MongoSnapshot> {
    docs.into_iter()
        .map(|doc| MongoSnapshot::found(namespace, doc))
        .collect()
}
