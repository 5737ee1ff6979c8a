//! Collection window orchestration.

use std::future::Future;
use std::time::Duration;

use futures::FutureExt;

use crate::aggregate::Aggregate;
use crate::classifier::Classifier;
use crate::error::{CollectError, SourceError};
use crate::poller::Poller;
use crate::recorder::{Recorder, SealedLog};
use crate::retry::connect_with_retry;
use crate::schedule::Schedule;
use crate::sources::Source;
use crate::types::Record;

/// Timing and concurrency knobs for one collection run.
#[derive(Debug, Clone)]
pub struct CollectionSettings {
    /// Total collection window.
    pub window: Duration,
    /// Cadence between poll cycles.
    pub interval: Duration,
    /// Classifications allowed in flight within one cycle.
    pub classify_concurrency: usize,
    /// Additional handshake attempts on transient errors.
    pub connect_max_retries: u32,
    /// Base delay for the handshake back-off.
    pub connect_backoff_base_ms: u64,
}

impl Default for CollectionSettings {
    fn default() -> Self {
        Self {
            window: Duration::from_secs(30),
            interval: Duration::from_secs(5),
            classify_concurrency: 1,
            connect_max_retries: 3,
            connect_backoff_base_ms: 500,
        }
    }
}

/// Why polling stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    WindowElapsed,
    Interrupted,
}

/// Result of a completed collection window.
#[derive(Debug, Clone)]
pub struct CollectionOutcome {
    pub log: SealedLog,
    pub aggregate: Aggregate,
    pub cycles: u32,
    pub elapsed: Duration,
    pub stop: StopReason,
}

/// Run one collection window against `source`.
///
/// 1. Handshake with the source (retried on transient errors).
/// 2. Every `interval`: snapshot the source, keep only new messages,
///    classify them and append records in observation order.
/// 3. Stop once `window` has elapsed, checked after each full cycle, or
///    when `shutdown` resolves. `shutdown` is raced against the handshake,
///    every snapshot query, every batch and every tick, and is polled
///    before any of them starts. Messages already handed to the recorder
///    are always classified before the window is sealed. An interrupt
///    during the handshake yields an empty, interrupted outcome.
/// 4. Aggregate the sealed log.
///
/// `on_record` is invoked once per appended record, in log order.
///
/// The source is closed on every exit path.
///
/// # Errors
///
/// Returns [`CollectError::SourceUnavailable`] if the handshake fails or the
/// source becomes unusable mid-run. Per-element, per-cycle and
/// classification failures are logged and absorbed.
pub async fn run_collection<S, C, F, P>(
    source: &mut S,
    classifier: &C,
    settings: &CollectionSettings,
    shutdown: F,
    on_record: P,
) -> Result<CollectionOutcome, CollectError>
where
    S: Source,
    C: Classifier,
    F: Future<Output = ()>,
    P: FnMut(&Record),
{
    let result = collect(source, classifier, settings, shutdown, on_record).await;
    source.close().await;
    result
}

async fn collect<S, C, F, P>(
    source: &mut S,
    classifier: &C,
    settings: &CollectionSettings,
    shutdown: F,
    mut on_record: P,
) -> Result<CollectionOutcome, CollectError>
where
    S: Source,
    C: Classifier,
    F: Future<Output = ()>,
    P: FnMut(&Record),
{
    // Polled first in every select: signal handlers must be armed before
    // the source is touched.
    let shutdown = shutdown.fuse();
    tokio::pin!(shutdown);

    let handshake = tokio::select! {
        biased;
        () = &mut shutdown => None,
        result = connect_with_retry(
            source,
            settings.connect_max_retries,
            settings.connect_backoff_base_ms,
        ) => Some(result),
    };
    match handshake {
        Some(result) => result.map_err(|err| CollectError::SourceUnavailable(unavailable(err)))?,
        None => {
            tracing::info!("interrupted during source handshake; nothing collected");
            return Ok(CollectionOutcome {
                log: SealedLog::default(),
                aggregate: Aggregate::default(),
                cycles: 0,
                elapsed: Duration::ZERO,
                stop: StopReason::Interrupted,
            });
        }
    }

    let mut poller = Poller::new();
    let mut recorder = Recorder::new(classifier, settings.classify_concurrency);
    let mut schedule = Schedule::start(settings.interval, settings.window);
    let mut cycles: u32 = 0;
    let mut interrupted = false;

    tracing::info!(
        window_secs = settings.window.as_secs_f64(),
        interval_secs = settings.interval.as_secs_f64(),
        max_cycles = %schedule.max_cycles(),
        "collection window started"
    );

    let stop = loop {
        let snapshot = tokio::select! {
            biased;
            () = &mut shutdown => None,
            result = poller.poll(source) => Some(result),
        };
        let Some(snapshot) = snapshot else {
            tracing::info!(cycles, "interrupted while querying source; closing collection window");
            break StopReason::Interrupted;
        };
        let fresh = snapshot.map_err(CollectError::SourceUnavailable)?;
        let new_count = fresh.len();

        // An interrupt here still lets the batch finish: these messages
        // were already emitted as new and must reach the log.
        let appended = {
            let batch = recorder.record_batch(fresh, &mut on_record);
            tokio::pin!(batch);
            tokio::select! {
                biased;
                () = &mut shutdown => {
                    interrupted = true;
                    tracing::info!(pending = new_count, "interrupted; finishing classification of this cycle");
                    batch.await
                }
                appended = &mut batch => appended,
            }
        };
        cycles += 1;

        tracing::debug!(
            cycle = cycles,
            new = new_count,
            recorded = appended,
            total = recorder.log().len(),
            elapsed_ms = u64::try_from(schedule.elapsed().as_millis()).unwrap_or(u64::MAX),
            "poll cycle complete"
        );

        if interrupted {
            break StopReason::Interrupted;
        }

        tokio::select! {
            biased;
            () = &mut shutdown => {
                tracing::info!(cycles, "interrupted; closing collection window early");
                break StopReason::Interrupted;
            }
            () = schedule.tick() => {}
        }

        if schedule.window_closed() {
            break StopReason::WindowElapsed;
        }
    };

    let elapsed = schedule.elapsed();
    let log = recorder.finish();
    let aggregate = log.aggregate();

    tracing::info!(
        cycles,
        records = log.len(),
        distinct_seen = poller.seen_count(),
        stop = ?stop,
        "collection window closed"
    );

    Ok(CollectionOutcome {
        log,
        aggregate,
        cycles,
        elapsed,
        stop,
    })
}

fn unavailable(err: SourceError) -> SourceError {
    match err {
        SourceError::Unavailable(_) => err,
        other => SourceError::Unavailable(format!("handshake failed: {other}")),
    }
}
