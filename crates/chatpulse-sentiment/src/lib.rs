//! Live-chat sentiment collection.
//!
//! Polls a live message feed on a fixed cadence for a bounded window,
//! forwards only messages it has not seen before, classifies each one
//! with a pluggable classifier, and accumulates timestamped records in an
//! append-only log. When the window closes the log is sealed and
//! aggregated into per-sentiment counts.

pub mod aggregate;
pub mod classifier;
pub mod error;
pub mod pipeline;
pub mod poller;
pub mod recorder;
pub mod schedule;
pub mod sources;
pub mod types;

mod retry;

pub use aggregate::{aggregate, Aggregate};
pub use classifier::{Classifier, HttpClassifier, LexiconClassifier};
pub use error::{ClassifierError, CollectError, SourceError};
pub use pipeline::{run_collection, CollectionOutcome, CollectionSettings, StopReason};
pub use poller::{Poller, MAX_CONSECUTIVE_FAILED_SNAPSHOTS};
pub use recorder::{RecordLog, Recorder, SealedLog};
pub use schedule::Schedule;
pub use sources::{FileSource, HttpFeedSource, Source, SourceItem};
pub use types::{Message, Observed, Record, Sentiment};
