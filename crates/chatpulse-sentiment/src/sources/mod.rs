//! Live message source abstractions.

mod file;
mod http_feed;

use std::future::Future;

use crate::error::SourceError;
use crate::types::Message;

pub use file::FileSource;
pub use http_feed::HttpFeedSource;

/// One element of a snapshot: a readable message, or a per-element
/// failure that is skipped for this cycle.
pub type SourceItem = Result<Message, SourceError>;

/// A live feed queried by re-snapshotting its currently visible messages.
///
/// Sources are not incremental: every call to [`Source::current_messages`]
/// returns the full visible set, in display order. Deduplication is the
/// poller's job.
pub trait Source: Send {
    /// Initial handshake. An error here means the feed cannot be queried.
    fn connect(&mut self) -> impl Future<Output = Result<(), SourceError>> + Send;

    /// Snapshot of everything currently visible.
    ///
    /// An outer `Err` fails the whole cycle; [`SourceError::Unavailable`]
    /// is fatal, anything else skips the cycle.
    fn current_messages(
        &mut self,
    ) -> impl Future<Output = Result<Vec<SourceItem>, SourceError>> + Send;

    /// Release any resources held by the source. Called on every exit path.
    fn close(&mut self) -> impl Future<Output = ()> + Send;
}
