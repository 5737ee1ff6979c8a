//! Integration tests for `run_collection`.
//!
//! Every test runs on tokio's paused clock, so collection windows of tens
//! of seconds complete instantly and cycle timing is exact. Sources and
//! classifiers are scripted in-memory fakes.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chatpulse_sentiment::{
    run_collection, Classifier, ClassifierError, CollectError, CollectionSettings, Message,
    Record, Sentiment, Source, SourceError, SourceItem, StopReason,
    MAX_CONSECUTIVE_FAILED_SNAPSHOTS,
};

/// What the fake source answers on one query.
#[derive(Clone)]
enum Cycle {
    Snapshot(Vec<&'static str>),
    Transient,
    Fatal,
}

/// Replays one scripted answer per query; repeats the last one afterwards.
struct ScriptedSource {
    script: Vec<Cycle>,
    queries: usize,
    connect_fails: bool,
    connect_delay: Duration,
    closed: bool,
    /// Set by the shutdown future on its first poll.
    shutdown_armed: Option<Arc<AtomicBool>>,
    armed_at_connect: Option<bool>,
    armed_at_first_query: Option<bool>,
}

impl ScriptedSource {
    fn new(script: Vec<Cycle>) -> Self {
        Self {
            script,
            queries: 0,
            connect_fails: false,
            connect_delay: Duration::ZERO,
            closed: false,
            shutdown_armed: None,
            armed_at_connect: None,
            armed_at_first_query: None,
        }
    }

    fn armed(&self) -> Option<bool> {
        self.shutdown_armed
            .as_ref()
            .map(|flag| flag.load(Ordering::SeqCst))
    }

    /// A feed that shows one more message every time it is queried.
    fn growing() -> Self {
        const MESSAGES: [&str; 12] = [
            "m0", "m1", "m2", "m3", "m4", "m5", "m6", "m7", "m8", "m9", "m10", "m11",
        ];
        let script = (1..=MESSAGES.len())
            .map(|n| Cycle::Snapshot(MESSAGES[..n].to_vec()))
            .collect();
        Self::new(script)
    }
}

impl Source for ScriptedSource {
    async fn connect(&mut self) -> Result<(), SourceError> {
        self.armed_at_connect = self.armed();
        if !self.connect_delay.is_zero() {
            tokio::time::sleep(self.connect_delay).await;
        }
        if self.connect_fails {
            return Err(SourceError::Unavailable("chat frame never loaded".to_owned()));
        }
        Ok(())
    }

    async fn current_messages(&mut self) -> Result<Vec<SourceItem>, SourceError> {
        if self.queries == 0 {
            self.armed_at_first_query = self.armed();
        }
        let index = self.queries.min(self.script.len() - 1);
        self.queries += 1;
        match self.script[index].clone() {
            Cycle::Snapshot(texts) => Ok(texts.into_iter().map(|t| Ok(Message::new(t))).collect()),
            Cycle::Transient => Err(SourceError::Malformed("half-rendered page".to_owned())),
            Cycle::Fatal => Err(SourceError::Unavailable("stream ended".to_owned())),
        }
    }

    async fn close(&mut self) {
        self.closed = true;
    }
}

/// Labels by exact text with optional per-text latency. Unscripted text
/// gets `LABEL_1`; text listed in `failing` raises.
#[derive(Default)]
struct FakeClassifier {
    labels: HashMap<&'static str, &'static str>,
    latency: HashMap<&'static str, Duration>,
    default_latency: Duration,
    failing: Vec<&'static str>,
}

impl Classifier for FakeClassifier {
    async fn classify(&self, text: &str) -> Result<String, ClassifierError> {
        let latency = self
            .latency
            .get(text)
            .copied()
            .unwrap_or(self.default_latency);
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        if self.failing.contains(&text) {
            return Err(ClassifierError::InvalidInput(format!("cannot score {text}")));
        }
        Ok(self.labels.get(text).copied().unwrap_or("LABEL_1").to_owned())
    }
}

fn settings(window_secs: u64, interval_secs: u64) -> CollectionSettings {
    CollectionSettings {
        window: Duration::from_secs(window_secs),
        interval: Duration::from_secs(interval_secs),
        classify_concurrency: 1,
        connect_max_retries: 0,
        connect_backoff_base_ms: 0,
    }
}

/// A shutdown future that never fires but records that it has been polled,
/// the point at which real signal handlers get installed.
fn armed_shutdown(flag: Arc<AtomicBool>) -> impl Future<Output = ()> {
    async move {
        flag.store(true, Ordering::SeqCst);
        std::future::pending::<()>().await;
    }
}

fn contents(records: &[Record]) -> Vec<&str> {
    records.iter().map(Record::content).collect()
}

// ---------------------------------------------------------------------------
// Deduplication and ordering
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn overlapping_snapshots_record_each_message_once() {
    let mut source = ScriptedSource::new(vec![
        Cycle::Snapshot(vec!["gg"]),
        Cycle::Snapshot(vec!["gg", "nice"]),
    ]);
    let classifier = FakeClassifier::default();

    let outcome = run_collection(
        &mut source,
        &classifier,
        &settings(30, 5),
        std::future::pending(),
        |_| {},
    )
    .await
    .unwrap();

    assert_eq!(contents(outcome.log.records()), vec!["gg", "nice"]);
    assert_eq!(outcome.aggregate.total(), 2);
}

#[tokio::test(start_paused = true)]
async fn log_order_ignores_classification_latency() {
    let mut source = ScriptedSource::new(vec![Cycle::Snapshot(vec!["slow", "fast", "medium"])]);
    let classifier = FakeClassifier {
        latency: HashMap::from([
            ("slow", Duration::from_millis(900)),
            ("fast", Duration::from_millis(10)),
            ("medium", Duration::from_millis(300)),
        ]),
        ..FakeClassifier::default()
    };
    let mut cfg = settings(10, 5);
    cfg.classify_concurrency = 3;

    let mut printed = Vec::new();
    let outcome = run_collection(
        &mut source,
        &classifier,
        &cfg,
        std::future::pending(),
        |r: &Record| printed.push(r.content().to_owned()),
    )
    .await
    .unwrap();

    assert_eq!(contents(outcome.log.records()), vec!["slow", "fast", "medium"]);
    assert_eq!(printed, vec!["slow", "fast", "medium"]);
    let seqs: Vec<u64> = outcome.log.records().iter().map(Record::seq).collect();
    assert_eq!(seqs, vec![0, 1, 2]);
}

// ---------------------------------------------------------------------------
// Deadline handling
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn thirty_second_window_at_five_second_cadence_runs_six_cycles() {
    let mut source = ScriptedSource::growing();
    let classifier = FakeClassifier::default();

    let outcome = run_collection(
        &mut source,
        &classifier,
        &settings(30, 5),
        std::future::pending(),
        |_| {},
    )
    .await
    .unwrap();

    assert_eq!(outcome.cycles, 6);
    assert_eq!(source.queries, 6);
    assert_eq!(outcome.log.len(), 6);
    assert_eq!(outcome.stop, StopReason::WindowElapsed);
    assert_eq!(outcome.elapsed, Duration::from_secs(30));
}

#[tokio::test(start_paused = true)]
async fn slow_classification_finishes_in_flight_messages_and_stops_polling() {
    let mut source = ScriptedSource::growing();
    let classifier = FakeClassifier {
        default_latency: Duration::from_secs(12),
        ..FakeClassifier::default()
    };

    let outcome = run_collection(
        &mut source,
        &classifier,
        &settings(30, 5),
        std::future::pending(),
        |_| {},
    )
    .await
    .unwrap();

    assert!(outcome.cycles <= 6, "ran {} cycles", outcome.cycles);
    assert_eq!(source.queries, outcome.cycles as usize);
    // Every message emitted as new was classified before sealing.
    assert_eq!(outcome.log.len(), outcome.cycles as usize);
    assert!(outcome.elapsed >= Duration::from_secs(30));
}

#[tokio::test(start_paused = true)]
async fn shutdown_signal_closes_window_early() {
    let mut source = ScriptedSource::growing();
    let classifier = FakeClassifier::default();

    let outcome = run_collection(
        &mut source,
        &classifier,
        &settings(30, 5),
        tokio::time::sleep(Duration::from_secs(12)),
        |_| {},
    )
    .await
    .unwrap();

    // Cycles at t=0, 5 and 10; the signal fires while waiting for t=15.
    assert_eq!(outcome.cycles, 3);
    assert_eq!(outcome.stop, StopReason::Interrupted);
    assert_eq!(outcome.log.len(), 3);
    assert!(source.closed);
}

#[tokio::test(start_paused = true)]
async fn interrupt_mid_batch_finishes_classifying_emitted_messages() {
    let mut source = ScriptedSource::new(vec![Cycle::Snapshot(vec!["gg", "nice", "lag", "pog"])]);
    let classifier = FakeClassifier {
        default_latency: Duration::from_secs(3),
        ..FakeClassifier::default()
    };

    let outcome = run_collection(
        &mut source,
        &classifier,
        &settings(30, 5),
        tokio::time::sleep(Duration::from_secs(1)),
        |_| {},
    )
    .await
    .unwrap();

    assert_eq!(outcome.stop, StopReason::Interrupted);
    assert_eq!(outcome.cycles, 1);
    assert_eq!(source.queries, 1);
    assert_eq!(
        contents(outcome.log.records()),
        vec!["gg", "nice", "lag", "pog"]
    );
    assert_eq!(outcome.aggregate.total(), 4);
    assert!(source.closed);
}

#[tokio::test(start_paused = true)]
async fn shutdown_is_armed_before_handshake_and_first_query() {
    let flag = Arc::new(AtomicBool::new(false));
    let mut source = ScriptedSource::new(vec![Cycle::Snapshot(vec!["gg"])]);
    source.shutdown_armed = Some(Arc::clone(&flag));
    let classifier = FakeClassifier::default();

    run_collection(
        &mut source,
        &classifier,
        &settings(5, 5),
        armed_shutdown(flag),
        |_| {},
    )
    .await
    .unwrap();

    assert_eq!(source.armed_at_connect, Some(true));
    assert_eq!(source.armed_at_first_query, Some(true));
}

#[tokio::test(start_paused = true)]
async fn interrupt_during_handshake_returns_empty_outcome_and_releases_source() {
    let mut source = ScriptedSource::new(vec![Cycle::Snapshot(vec!["gg"])]);
    source.connect_delay = Duration::from_secs(20);
    let classifier = FakeClassifier::default();

    let outcome = run_collection(
        &mut source,
        &classifier,
        &settings(30, 5),
        tokio::time::sleep(Duration::from_secs(2)),
        |_| {},
    )
    .await
    .unwrap();

    assert_eq!(outcome.stop, StopReason::Interrupted);
    assert_eq!(outcome.cycles, 0);
    assert!(outcome.log.is_empty());
    assert_eq!(source.queries, 0);
    assert!(source.closed);
}

// ---------------------------------------------------------------------------
// Classification and aggregation
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn aggregate_counts_positive_positive_negative() {
    let mut source = ScriptedSource::new(vec![Cycle::Snapshot(vec!["gg", "pog", "lag"])]);
    let classifier = FakeClassifier {
        labels: HashMap::from([("gg", "LABEL_2"), ("pog", "LABEL_2"), ("lag", "LABEL_0")]),
        ..FakeClassifier::default()
    };

    let outcome = run_collection(
        &mut source,
        &classifier,
        &settings(5, 5),
        std::future::pending(),
        |_| {},
    )
    .await
    .unwrap();

    let agg = &outcome.aggregate;
    assert_eq!(agg.total(), 3);
    assert_eq!(agg.counts().len(), 2);
    assert_eq!(agg.count(Sentiment::Positive), 2);
    assert_eq!(agg.count(Sentiment::Negative), 1);
    assert_eq!(agg.counts().values().sum::<usize>(), outcome.log.len());
}

#[tokio::test(start_paused = true)]
async fn classifier_failure_drops_only_that_message() {
    let mut source = ScriptedSource::new(vec![Cycle::Snapshot(vec!["gg", "\u{0}", "nice"])]);
    let classifier = FakeClassifier {
        failing: vec!["\u{0}"],
        ..FakeClassifier::default()
    };

    let outcome = run_collection(
        &mut source,
        &classifier,
        &settings(10, 5),
        std::future::pending(),
        |_| {},
    )
    .await
    .unwrap();

    assert_eq!(contents(outcome.log.records()), vec!["gg", "nice"]);
}

#[tokio::test(start_paused = true)]
async fn unmapped_labels_are_recorded_as_unknown() {
    let mut source = ScriptedSource::new(vec![Cycle::Snapshot(vec!["hmm"])]);
    let classifier = FakeClassifier {
        labels: HashMap::from([("hmm", "LABEL_7")]),
        ..FakeClassifier::default()
    };

    let outcome = run_collection(
        &mut source,
        &classifier,
        &settings(5, 5),
        std::future::pending(),
        |_| {},
    )
    .await
    .unwrap();

    assert_eq!(outcome.log.records()[0].sentiment(), Sentiment::Unknown);
    assert_eq!(outcome.aggregate.count(Sentiment::Unknown), 1);
}

#[tokio::test(start_paused = true)]
async fn empty_feed_aggregates_to_zero_total() {
    let mut source = ScriptedSource::new(vec![Cycle::Snapshot(vec![])]);
    let classifier = FakeClassifier::default();

    let outcome = run_collection(
        &mut source,
        &classifier,
        &settings(30, 5),
        std::future::pending(),
        |_| {},
    )
    .await
    .unwrap();

    assert!(outcome.log.is_empty());
    assert_eq!(outcome.aggregate.total(), 0);
    assert!(outcome.aggregate.counts().is_empty());
    assert_eq!(outcome.aggregate.proportion(Sentiment::Positive), None);
}

// ---------------------------------------------------------------------------
// Source failures
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn transient_snapshot_failure_skips_only_that_cycle() {
    let mut source = ScriptedSource::new(vec![
        Cycle::Snapshot(vec!["gg"]),
        Cycle::Transient,
        Cycle::Snapshot(vec!["gg", "nice"]),
    ]);
    let classifier = FakeClassifier::default();

    let outcome = run_collection(
        &mut source,
        &classifier,
        &settings(15, 5),
        std::future::pending(),
        |_| {},
    )
    .await
    .unwrap();

    assert_eq!(outcome.cycles, 3);
    assert_eq!(contents(outcome.log.records()), vec!["gg", "nice"]);
}

#[tokio::test(start_paused = true)]
async fn persistent_snapshot_failures_end_the_run() {
    let mut source = ScriptedSource::new(vec![Cycle::Snapshot(vec!["gg"]), Cycle::Transient]);
    let classifier = FakeClassifier::default();

    let result = run_collection(
        &mut source,
        &classifier,
        &settings(60, 5),
        std::future::pending(),
        |_| {},
    )
    .await;

    assert!(matches!(
        result,
        Err(CollectError::SourceUnavailable(SourceError::Unavailable(_)))
    ));
    assert_eq!(source.queries, 1 + MAX_CONSECUTIVE_FAILED_SNAPSHOTS as usize);
    assert!(source.closed);
}

#[tokio::test(start_paused = true)]
async fn failed_handshake_aborts_before_polling() {
    let mut source = ScriptedSource::new(vec![Cycle::Snapshot(vec!["gg"])]);
    source.connect_fails = true;
    let classifier = FakeClassifier::default();

    let result = run_collection(
        &mut source,
        &classifier,
        &settings(30, 5),
        std::future::pending(),
        |_| {},
    )
    .await;

    assert!(matches!(result, Err(CollectError::SourceUnavailable(_))));
    assert_eq!(source.queries, 0);
    assert!(source.closed, "source must be released on the error path");
}

#[tokio::test(start_paused = true)]
async fn source_lost_mid_run_is_fatal_and_releases_source() {
    let mut source = ScriptedSource::new(vec![Cycle::Snapshot(vec!["gg"]), Cycle::Fatal]);
    let classifier = FakeClassifier::default();

    let result = run_collection(
        &mut source,
        &classifier,
        &settings(30, 5),
        std::future::pending(),
        |_| {},
    )
    .await;

    assert!(matches!(
        result,
        Err(CollectError::SourceUnavailable(SourceError::Unavailable(_)))
    ));
    assert_eq!(source.queries, 2);
    assert!(source.closed);
}

#[tokio::test(start_paused = true)]
async fn source_is_released_after_normal_completion() {
    let mut source = ScriptedSource::new(vec![Cycle::Snapshot(vec!["gg"])]);
    let classifier = FakeClassifier::default();

    run_collection(
        &mut source,
        &classifier,
        &settings(5, 5),
        std::future::pending(),
        |_| {},
    )
    .await
    .unwrap();

    assert!(source.closed);
}
