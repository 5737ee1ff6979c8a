use thiserror::Error;

/// Failures raised while talking to a live message source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The feed cannot be queried at all. Always fatal to the run.
    #[error("source unavailable: {0}")]
    Unavailable(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {status} from {url}")]
    UnexpectedStatus { url: String, status: u16 },

    #[error("I/O error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed feed payload: {0}")]
    Malformed(String),

    /// A single element of a snapshot could not be read this cycle.
    #[error("unreadable element at position {position}: {reason}")]
    Element { position: usize, reason: String },
}

impl SourceError {
    /// `true` when the source can no longer be used and the run must stop.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, SourceError::Unavailable(_))
    }
}

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("classifier returned status {0}")]
    Status(u16),

    #[error("classifier response parse error: {0}")]
    Parse(String),

    #[error("classifier rejected input: {0}")]
    InvalidInput(String),
}

/// Errors that abort a collection run.
#[derive(Debug, Error)]
pub enum CollectError {
    #[error("source unavailable: {0}")]
    SourceUnavailable(#[source] SourceError),
}
