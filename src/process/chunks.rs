use super::throttle;
use crate::error::{error_message, Error, ErrorRecord, Result};
use crate::options::ChunkingOptions;
use crate::utils::chunk::chunk;
use crate::utils::json::render_messages;
use crate::utils::logging::verbose_log;
use futures::future::join_all;
use std::future::Future;

const MAX_REPORTED_ERRORS: usize = 10;

/// Applies `process` to every item, running the items of one chunk
/// concurrently and the chunks one after another.
///
/// The output has one entry per input item, in input order. A failed item
/// does not affect its siblings; its entry holds an [`ErrorRecord`] whose id is
/// the item's index, and every failure is logged once the run completes.
pub async fn process_in_chunks<I, R, F, Fut>(
    items: Vec<I>,
    process: F,
    options: &ChunkingOptions,
) -> Vec<std::result::Result<R, ErrorRecord>>
where
    F: Fn(I) -> Fut,
    Fut: Future<Output = anyhow::Result<R>>,
{
    let mut all_results = Vec::with_capacity(items.len());
    let chunks = chunk(items, options.chunk_size);
    let total = chunks.len();

    for (index, items) in chunks.into_iter().enumerate() {
        verbose_log(format!("Processing chunk {}/{}", index + 1, total));

        let offset = all_results.len();
        let work = join_all(items.into_iter().enumerate().map(|(i, item)| {
            let pending = process(item);
            async move {
                pending
                    .await
                    .map_err(|e| ErrorRecord::new(Some((offset + i).to_string()), &e))
            }
        }));

        let (results, ()) = tokio::join!(work, throttle(options.throttle()));
        all_results.extend(results);
    }

    let failures: Vec<&ErrorRecord> =
        all_results.iter().filter_map(|r| r.as_ref().err()).collect();
    if !failures.is_empty() {
        tracing::error!("{} of {} items failed", failures.len(), all_results.len());
        for failure in failures {
            tracing::error!("{}", failure);
        }
    }

    all_results
}

/// Same chunking as [`process_in_chunks`], but `process` receives a whole
/// chunk at a time.
///
/// A failing chunk does not stop the remaining chunks. If any chunk failed
/// the call returns [`Error::ChunksFailed`] and the results of the chunks that
/// succeeded are discarded.
pub async fn process_in_chunks_by_chunk<I, R, F, Fut>(
    items: Vec<I>,
    process: F,
    options: &ChunkingOptions,
) -> Result<Vec<R>>
where
    F: Fn(Vec<I>) -> Fut,
    Fut: Future<Output = anyhow::Result<Vec<R>>>,
{
    let chunks = chunk(items, options.chunk_size);
    let total = chunks.len();
    let mut error_messages = Vec::new();
    let mut all_results = Vec::new();

    for (index, items) in chunks.into_iter().enumerate() {
        verbose_log(format!("Processing chunk {}/{}", index + 1, total));

        let (result, ()) = tokio::join!(process(items), throttle(options.throttle()));

        match result {
            Ok(results) => all_results.extend(results),
            Err(err) => {
                tracing::warn!("Chunk {}/{} failed: {:#}", index + 1, total, err);
                error_messages.push(error_message(&err));
            }
        }
    }

    if !error_messages.is_empty() {
        return Err(Error::ChunksFailed {
            failed: error_messages.len(),
            messages: render_messages(&error_messages, MAX_REPORTED_ERRORS),
        });
    }

    Ok(all_results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;
    use std::num::NonZeroUsize;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tokio::time::{sleep, Instant};

    fn options(chunk_size: usize) -> ChunkingOptions {
        ChunkingOptions {
            chunk_size: NonZeroUsize::new(chunk_size).unwrap(),
            ..ChunkingOptions::default()
        }
    }

    #[tokio::test]
    async fn output_order_follows_input_not_completion() {
        let items: Vec<u64> = (0..20).collect();
        let results = process_in_chunks(
            items,
            |i| async move {
                // Later items finish first.
                sleep(Duration::from_millis(2 * (20 - i))).await;
                anyhow::Ok(i * 10)
            },
            &options(8),
        )
        .await;

        let values: Vec<u64> = results.into_iter().map(|r| r.unwrap()).collect();
        assert_eq!(values, (0..20).map(|i| i * 10).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn in_flight_work_is_bounded_by_chunk_size() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let results = process_in_chunks(
            (0..12).collect::<Vec<usize>>(),
            |i| {
                let in_flight = Arc::clone(&in_flight);
                let peak = Arc::clone(&peak);
                async move {
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    sleep(Duration::from_millis(5)).await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                    anyhow::Ok(i)
                }
            },
            &options(5),
        )
        .await;

        assert_eq!(results.len(), 12);
        assert_eq!(peak.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn failed_item_does_not_affect_siblings() {
        let results = process_in_chunks(
            vec!["a", "b", "c", "d", "e"],
            |item| async move {
                if item == "d" {
                    bail!("cannot handle {}", item);
                }
                anyhow::Ok(item.to_uppercase())
            },
            &options(2),
        )
        .await;

        assert_eq!(results[0].as_deref(), Ok("A"));
        assert_eq!(results[4].as_deref(), Ok("E"));
        let failure = results[3].as_ref().unwrap_err();
        assert_eq!(failure.id.as_deref(), Some("3"));
        assert_eq!(failure.message, "cannot handle d");
    }

    #[tokio::test]
    async fn empty_input_yields_empty_output() {
        let results =
            process_in_chunks(Vec::<u8>::new(), |i| async move { anyhow::Ok(i) }, &options(3))
                .await;
        assert!(results.is_empty());

        let results = process_in_chunks_by_chunk(
            Vec::<u8>::new(),
            |c| async move { anyhow::Ok(c) },
            &options(3),
        )
        .await;
        assert!(results.unwrap().is_empty());
    }

    #[tokio::test]
    async fn by_chunk_concatenates_in_chunk_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let results = process_in_chunks_by_chunk(
            (0..7).collect::<Vec<u32>>(),
            |chunk| {
                let seen = Arc::clone(&seen);
                async move {
                    seen.lock().unwrap().push(chunk.len());
                    anyhow::Ok(chunk.into_iter().map(|n| n + 100).collect::<Vec<u32>>())
                }
            },
            &options(3),
        )
        .await
        .unwrap();

        assert_eq!(results, (100..107).collect::<Vec<_>>());
        assert_eq!(*seen.lock().unwrap(), [3, 3, 1]);
    }

    #[tokio::test]
    async fn by_chunk_failure_still_runs_later_chunks_then_rejects() {
        let calls = Arc::new(AtomicUsize::new(0));
        let result = process_in_chunks_by_chunk(
            (0..9).collect::<Vec<u32>>(),
            |chunk| {
                let calls = Arc::clone(&calls);
                async move {
                    let call = calls.fetch_add(1, Ordering::SeqCst) + 1;
                    if call == 2 {
                        bail!("chunk two exploded");
                    }
                    anyhow::Ok(chunk)
                }
            },
            &options(3),
        )
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        match result {
            Err(Error::ChunksFailed { failed, messages }) => {
                assert_eq!(failed, 1);
                assert_eq!(messages, r#"["chunk two exploded"]"#);
            }
            other => panic!("expected aggregate failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn by_chunk_reports_at_most_ten_messages() {
        let result = process_in_chunks_by_chunk(
            (0..12).collect::<Vec<u32>>(),
            |chunk| async move { Err::<Vec<u32>, _>(anyhow::anyhow!("fail {}", chunk[0])) },
            &options(1),
        )
        .await;

        let err = result.unwrap_err();
        let text = err.to_string();
        assert!(matches!(err, Error::ChunksFailed { failed: 12, .. }));
        assert!(text.contains("fail 9"));
        assert!(!text.contains("fail 10"));
        assert!(text.starts_with("Failed to process all chunks successfully"));
    }

    #[tokio::test]
    async fn throttle_runs_alongside_each_chunk() {
        let options = ChunkingOptions {
            chunk_size: NonZeroUsize::new(2).unwrap(),
            throttle_secs: 0.05,
        };

        let started = Instant::now();
        let results = process_in_chunks(
            (0..6).collect::<Vec<u8>>(),
            |i| async move { anyhow::Ok(i) },
            &options,
        )
        .await;
        assert_eq!(results.len(), 6);
        assert!(started.elapsed() >= Duration::from_millis(150));

        // Work longer than the throttle is not extended by it.
        let options = ChunkingOptions {
            chunk_size: NonZeroUsize::new(10).unwrap(),
            throttle_secs: 0.1,
        };
        let started = Instant::now();
        process_in_chunks_by_chunk(
            vec![1u8],
            |chunk| async move {
                sleep(Duration::from_millis(200)).await;
                anyhow::Ok(chunk)
            },
            &options,
        )
        .await
        .unwrap();
        assert!(started.elapsed() < Duration::from_millis(290));
    }
}
