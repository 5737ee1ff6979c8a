//! Classification of new messages into the run's record log.

use chrono::{DateTime, Local};
use futures::StreamExt;

use crate::aggregate::{aggregate, Aggregate};
use crate::classifier::Classifier;
use crate::error::ClassifierError;
use crate::types::{Observed, Record, Sentiment};

/// Append-only record log for one collection window.
///
/// Only the [`Recorder`] appends. [`RecordLog::seal`] ends the window and
/// yields a read-only [`SealedLog`].
#[derive(Debug, Default)]
pub struct RecordLog {
    records: Vec<Record>,
}

impl RecordLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn append(&mut self, record: Record) -> &Record {
        debug_assert!(
            self.records.last().is_none_or(|last| last.seq() < record.seq()),
            "records must be appended in observation order"
        );
        self.records.push(record);
        &self.records[self.records.len() - 1]
    }

    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn seal(self) -> SealedLog {
        SealedLog {
            records: self.records,
        }
    }
}

/// The finished, read-only log of a collection window.
#[derive(Debug, Clone, Default)]
pub struct SealedLog {
    records: Vec<Record>,
}

impl SealedLog {
    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Recompute the per-label aggregate for this log.
    #[must_use]
    pub fn aggregate(&self) -> Aggregate {
        aggregate(&self.records)
    }
}

/// Classifies observed messages and appends the resulting records.
pub struct Recorder<'a, C> {
    classifier: &'a C,
    concurrency: usize,
    log: RecordLog,
}

impl<'a, C: Classifier> Recorder<'a, C> {
    /// `concurrency` is the number of classifications allowed in flight at
    /// once within a batch; values below 1 are treated as 1.
    #[must_use]
    pub fn new(classifier: &'a C, concurrency: usize) -> Self {
        Self {
            classifier,
            concurrency: concurrency.max(1),
            log: RecordLog::new(),
        }
    }

    #[must_use]
    pub fn log(&self) -> &RecordLog {
        &self.log
    }

    /// Classify one message and append its record, timestamped with `now`.
    ///
    /// # Errors
    ///
    /// Returns the classifier error; nothing is appended in that case.
    pub async fn record(
        &mut self,
        observed: Observed,
        now: DateTime<Local>,
    ) -> Result<&Record, ClassifierError> {
        let raw = self.classifier.classify(&observed.message.text).await?;
        Ok(self.append(observed, &now, &raw))
    }

    /// Classify a batch of newly observed messages.
    ///
    /// Up to `concurrency` classifications run at once, but records are
    /// appended in batch order. Each message is timestamped when its
    /// classification starts. A message whose classification fails is
    /// dropped with a warning. `on_record` sees every appended record.
    ///
    /// Returns the number of records appended.
    pub async fn record_batch<F>(&mut self, batch: Vec<Observed>, mut on_record: F) -> usize
    where
        F: FnMut(&Record),
    {
        let classifier = self.classifier;
        let mut outcomes = futures::stream::iter(batch)
            .map(move |observed| async move {
                let now = Local::now();
                let outcome = classifier.classify(&observed.message.text).await;
                (observed, now, outcome)
            })
            .buffered(self.concurrency);

        let mut appended = 0;
        while let Some((observed, now, outcome)) = outcomes.next().await {
            match outcome {
                Ok(raw) => {
                    on_record(self.append(observed, &now, &raw));
                    appended += 1;
                }
                Err(err) => {
                    tracing::warn!(
                        seq = observed.seq,
                        content = %observed.message.text,
                        error = %err,
                        "classification failed; dropping message"
                    );
                }
            }
        }
        appended
    }

    /// End the window and hand over the sealed log.
    #[must_use]
    pub fn finish(self) -> SealedLog {
        self.log.seal()
    }

    fn append(&mut self, observed: Observed, now: &DateTime<Local>, raw: &str) -> &Record {
        let sentiment = Sentiment::from_raw_label(raw);
        if sentiment == Sentiment::Unknown {
            tracing::warn!(
                seq = observed.seq,
                raw_label = raw,
                "unrecognized classifier label; recording as Unknown"
            );
        }
        let record = Record::new(observed.seq, now, observed.message.text, sentiment);
        self.log.append(record)
    }
}
