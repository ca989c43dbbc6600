//! Multi-document reads.
//!
//! Fetching everything a query matches in one request is unsafe: a store
//! may hand back a truncated result set without any error once it passes its
//! own limit. [`get_documents`] therefore pages through the query in capped
//! batches by default, and [`get_some_documents`] gives callers one page at a
//! time together with a cursor for the next one.

use crate::document::{make_document, make_documents, Document};
use crate::error::Result;
use crate::options::QueryOptions;
use crate::store::{Query, Snapshot, Transaction};
use crate::utils::logging::verbose_log;
use serde::de::DeserializeOwned;
use std::num::NonZeroUsize;

pub type DocumentOf<T, S> = Document<T, <S as Snapshot>::Ref>;

/// Position after the last document of a page. Only valid for fetching the
/// next page of the query that produced it.
#[derive(Debug, Clone)]
pub struct ResumeCursor<S> {
    last: S,
}

impl<S: Snapshot> ResumeCursor<S> {
    /// Id of the document the next page starts after.
    pub fn last_id(&self) -> &str {
        self.last.id()
    }
}

/// One capped fetch.
#[derive(Debug)]
pub struct Page<T, S: Snapshot> {
    pub documents: Vec<DocumentOf<T, S>>,
    /// `None` once the query is exhausted or when only the first batch was
    /// requested.
    pub next_cursor: Option<ResumeCursor<S>>,
}

/// Fetches every document a query matches.
///
/// With batching enabled (the default) any limit on `query` is replaced by
/// `options.batch_size` and the query is paged until a short page comes back.
/// With `disable_batching` the query runs once, exactly as given.
pub async fn get_documents<T, Q>(
    query: &Q,
    options: &QueryOptions,
) -> Result<Vec<DocumentOf<T, Q::Snapshot>>>
where
    T: DeserializeOwned,
    Q: Query,
{
    if options.disable_batching {
        let snapshots = query.get().await?;
        return make_documents(&snapshots);
    }

    let limited = query.limit(options.batch_size.get());

    get_documents_batch(
        &limited,
        options.batch_size,
        options.order_by_field.as_deref(),
        options.limit_to_first_batch,
    )
    .await
}

/// Pages through `query`, which must already be capped at `page_size`, until
/// a page comes back shorter than the cap.
async fn get_documents_batch<T, Q>(
    query: &Q,
    page_size: NonZeroUsize,
    order_by_field: Option<&str>,
    limit_to_first_batch: bool,
) -> Result<Vec<DocumentOf<T, Q::Snapshot>>>
where
    T: DeserializeOwned,
    Q: Query,
{
    if limit_to_first_batch {
        tracing::warn!("Returning only the first batch of documents (limit_to_first_batch = true)");
    }

    let mut results = Vec::new();
    let mut query = query.clone();

    loop {
        let snapshots = query.get().await?;

        let Some(last) = snapshots.last() else {
            break;
        };

        let num_read = snapshots.len();
        let until = order_by_field
            .and_then(|field| last.field(field))
            .unwrap_or_else(|| last.id().to_string());
        verbose_log(format!("Read {} records, until {}", num_read, until));

        let next = (num_read >= page_size.get() && !limit_to_first_batch)
            .then(|| query.start_after(last));

        results.extend(make_documents::<T, _>(&snapshots)?);

        match next {
            Some(next) => query = next,
            None => break,
        }
    }

    Ok(results)
}

/// Fetches one page of at most `options.batch_size` documents, starting after
/// `start_after` when given.
pub async fn get_some_documents<T, Q>(
    query: &Q,
    start_after: Option<&ResumeCursor<Q::Snapshot>>,
    options: &QueryOptions,
) -> Result<Page<T, Q::Snapshot>>
where
    T: DeserializeOwned,
    Q: Query,
{
    if options.limit_to_first_batch {
        tracing::warn!("Fetching only the first batch of documents (limit_to_first_batch = true)");
    }

    let batch_size = options.batch_size.get();
    let limited = query.limit(batch_size);

    let paged = match start_after {
        Some(cursor) => limited.start_after(&cursor.last),
        None => limited,
    };

    let mut snapshots = paged.get().await?;

    if snapshots.is_empty() {
        return Ok(Page {
            documents: Vec::new(),
            next_cursor: None,
        });
    }

    let documents = make_documents(&snapshots)?;

    // A short page is the last page.
    let next_cursor = if documents.len() == batch_size && !options.limit_to_first_batch {
        snapshots.pop().map(|last| ResumeCursor { last })
    } else {
        None
    };

    Ok(Page {
        documents,
        next_cursor,
    })
}

/// Reads all documents of `query` through a transaction.
pub async fn get_documents_from_transaction<T, X>(
    transaction: &mut X,
    query: &X::Query,
) -> Result<Vec<DocumentOf<T, X::Snapshot>>>
where
    T: DeserializeOwned,
    X: Transaction,
{
    let snapshots = transaction.query(query).await?;
    make_documents(&snapshots)
}

/// First document of a (typically sorted) query. `get_documents` replaces any
/// limit set on the query, so this is the way to get "the top one".
pub async fn get_first_document<T, Q>(query: &Q) -> Result<Option<DocumentOf<T, Q::Snapshot>>>
where
    T: DeserializeOwned,
    Q: Query,
{
    let snapshots = query.limit(1).get().await?;

    snapshots
        .first()
        .map(make_document::<T, Q::Snapshot>)
        .transpose()
}
