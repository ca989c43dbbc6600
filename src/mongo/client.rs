use mongodb::{Client, options::ClientOptions};
use anyhow::{Result, Context};

use crate::mongo::collection::MongoCollection;

pub async fn connect(uri: &str) -> Result<Client> {
    let mut options = ClientOptions::parse(uri)
        .await
        .context("Failed to parse MongoDB connection URI")?;

    options.app_name = Some("NovaDB Batch".into());

    let client = Client::with_options(options)
        .context("Failed to create MongoDB client with options")?;

    // Test the connection
    client
        .database("admin")
        .run_command(mongodb::bson::doc! {"ping": 1}, None)
        .await
        .context("Failed to ping MongoDB server - connection test failed")?;

    tracing::debug!("Connected to MongoDB");

    Ok(client)
}

/// Connects and opens one collection.
pub async fn open_collection(uri: &str, db: &str, collection: &str) -> Result<MongoCollection> {
    let client = connect(uri).await?;
    Ok(MongoCollection::new(client.database(db).collection(collection)))
}
