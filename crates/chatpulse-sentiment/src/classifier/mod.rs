//! Classifier contract and the bundled implementations.

mod http;
mod lexicon;

use std::future::Future;

use crate::error::ClassifierError;

pub use http::HttpClassifier;
pub use lexicon::{lexicon_score, LexiconClassifier};

/// Maps message text to a raw sentiment label.
///
/// The raw label is mapped onto the fixed label set by
/// [`Sentiment::from_raw_label`](crate::Sentiment::from_raw_label), so an
/// implementation may return any string. Returning `Err` drops that one
/// message from the run.
pub trait Classifier: Send + Sync {
    fn classify(&self, text: &str)
        -> impl Future<Output = Result<String, ClassifierError>> + Send;
}
