use super::throttle;
use crate::documents::{get_some_documents, DocumentOf, ResumeCursor};
use crate::error::{ErrorRecord, Result};
use crate::options::ProcessOptions;
use crate::store::Query;
use crate::utils::logging::{verbose_count, verbose_log};
use futures::future::join_all;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use tracing::Instrument;
use uuid::Uuid;

const PAGE_COUNTER: &str = "Processing chunk";

/// Outcome of a sweep over a query.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessReport {
    pub run_id: Uuid,
    /// Non-empty pages handed to the callback.
    pub pages: usize,
    /// Documents handed to the callback, failed ones included.
    pub processed: usize,
    pub errors: Vec<ErrorRecord>,
}

impl ProcessReport {
    fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            pages: 0,
            processed: 0,
            errors: Vec::new(),
        }
    }

    pub fn failed(&self) -> usize {
        self.errors.len()
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    fn finish(&self) {
        verbose_log(format!("Processed {} documents", self.processed));

        for error in &self.errors {
            tracing::error!("{}", error);
        }
    }
}

/// Runs `callback` on every document of `query`, one page at a time.
///
/// Documents of a page are processed concurrently. A failing callback is
/// recorded under the document id and never stops the sweep; failures are
/// logged at the end and returned in the report. A failing fetch ends the run
/// with an error.
pub async fn query_and_process<T, Q, F, Fut>(
    query: &Q,
    callback: F,
    options: &ProcessOptions,
) -> Result<ProcessReport>
where
    T: DeserializeOwned,
    Q: Query,
    F: Fn(DocumentOf<T, Q::Snapshot>) -> Fut,
    Fut: Future<Output = anyhow::Result<()>>,
{
    let mut report = ProcessReport::new();
    let span = tracing::info_span!("query_and_process", run_id = %report.run_id);
    let query_options = options.query_options();

    async move {
        let mut cursor: Option<ResumeCursor<Q::Snapshot>> = None;

        loop {
            verbose_count(PAGE_COUNTER);

            let page = get_some_documents::<T, Q>(query, cursor.as_ref(), &query_options).await?;
            let count = page.documents.len();

            let work = join_all(page.documents.into_iter().map(|document| {
                let id = document.id().to_string();
                let pending = callback(document);
                async move { pending.await.map_err(|e| ErrorRecord::new(Some(id), &e)) }
            }));

            let (results, ()) = tokio::join!(work, throttle(options.throttle()));
            report.errors.extend(results.into_iter().filter_map(|r| r.err()));

            if count > 0 {
                report.pages += 1;
                report.processed += count;
            }

            match page.next_cursor {
                Some(next) if !options.limit_to_first_batch => cursor = Some(next),
                _ => break,
            }
        }

        report.finish();
        Ok(report)
    }
    .instrument(span)
    .await
}

/// Like [`query_and_process`], but `callback` receives each page as a whole.
/// A failing page is recorded without an id.
pub async fn query_and_process_by_chunk<T, Q, F, Fut>(
    query: &Q,
    callback: F,
    options: &ProcessOptions,
) -> Result<ProcessReport>
where
    T: DeserializeOwned,
    Q: Query,
    F: Fn(Vec<DocumentOf<T, Q::Snapshot>>) -> Fut,
    Fut: Future<Output = anyhow::Result<()>>,
{
    let mut report = ProcessReport::new();
    let span = tracing::info_span!("query_and_process_by_chunk", run_id = %report.run_id);
    let query_options = options.query_options();

    async move {
        let mut cursor: Option<ResumeCursor<Q::Snapshot>> = None;

        loop {
            verbose_count(PAGE_COUNTER);

            let page = get_some_documents::<T, Q>(query, cursor.as_ref(), &query_options).await?;

            if page.documents.is_empty() {
                break;
            }

            let count = page.documents.len();
            let (result, ()) =
                tokio::join!(callback(page.documents), throttle(options.throttle()));

            if let Err(err) = result {
                report.errors.push(ErrorRecord::new(None, &err));
            }

            report.pages += 1;
            report.processed += count;

            match page.next_cursor {
                Some(next) if !options.limit_to_first_batch => cursor = Some(next),
                _ => break,
            }
        }

        report.finish();
        Ok(report)
    }
    .instrument(span)
    .await
}
