//! MongoDB implementation of the store traits.

pub mod client;
pub mod collection;
pub mod cursor_engine;
pub mod query;
pub mod snapshot;
pub mod transaction;

pub use client::{connect, open_collection};
pub use collection::MongoCollection;
pub use query::{parse_filter, MongoQuery, Position};
pub use snapshot::{MongoRef, MongoSnapshot};
pub use transaction::MongoTransaction;
