//! New-message detection over full feed snapshots.
//!
//! Sources return everything currently visible on every query, so the
//! poller keeps a seen-set and forwards only messages it has not emitted
//! before. Identity is the element's stable handle when the source has
//! one; otherwise it is the message text plus its occurrence ordinal
//! among identical texts in the same snapshot. Two equal texts visible at
//! the same time are two messages. An equal text that replaces an older
//! one after it scrolls out of view is indistinguishable from the
//! original and is not emitted again.

use std::collections::{HashMap, HashSet};

use crate::error::SourceError;
use crate::sources::{Source, SourceItem};
use crate::types::{Message, Observed};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum MessageKey {
    Handle(String),
    Content { text: String, ordinal: usize },
}

/// Consecutive failed snapshot queries after which the source is treated as
/// lost. At the default 5 s cadence this is 15 s of silence.
pub const MAX_CONSECUTIVE_FAILED_SNAPSHOTS: u32 = 3;

/// Tracks already-emitted messages and assigns observation sequence numbers.
#[derive(Debug, Default)]
pub struct Poller {
    seen: HashSet<MessageKey>,
    next_seq: u64,
    failed_snapshots: u32,
}

impl Poller {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct messages emitted so far.
    #[must_use]
    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }

    /// Query `source` once and return the messages that are new this cycle.
    ///
    /// Unreadable elements and transient snapshot failures are logged and
    /// skipped; an element skipped now is picked up on a later cycle if it
    /// is still visible.
    ///
    /// # Errors
    ///
    /// Returns the source error when it is fatal
    /// ([`SourceError::is_fatal`]), or [`SourceError::Unavailable`] once
    /// [`MAX_CONSECUTIVE_FAILED_SNAPSHOTS`] queries in a row have failed.
    pub async fn poll<S: Source>(&mut self, source: &mut S) -> Result<Vec<Observed>, SourceError> {
        match source.current_messages().await {
            Ok(snapshot) => {
                self.failed_snapshots = 0;
                Ok(self.detect_new(snapshot))
            }
            Err(err) if err.is_fatal() => Err(err),
            Err(err) => {
                self.failed_snapshots += 1;
                if self.failed_snapshots >= MAX_CONSECUTIVE_FAILED_SNAPSHOTS {
                    return Err(SourceError::Unavailable(format!(
                        "{} consecutive snapshot queries failed; last error: {err}",
                        self.failed_snapshots
                    )));
                }
                tracing::warn!(
                    error = %err,
                    failed_in_a_row = self.failed_snapshots,
                    "snapshot query failed; skipping cycle"
                );
                Ok(Vec::new())
            }
        }
    }

    /// Filter a snapshot down to messages not seen in any earlier snapshot,
    /// preserving snapshot order.
    pub fn detect_new(&mut self, snapshot: Vec<SourceItem>) -> Vec<Observed> {
        let mut ordinals: HashMap<String, usize> = HashMap::new();
        let mut fresh = Vec::new();

        for item in snapshot {
            let message = match item {
                Ok(message) => message,
                Err(err) => {
                    tracing::warn!(error = %err, "skipping unreadable chat element");
                    continue;
                }
            };

            let key = Self::key_for(&message, &mut ordinals);
            if self.seen.insert(key) {
                fresh.push(Observed {
                    seq: self.next_seq,
                    message,
                });
                self.next_seq += 1;
            }
        }

        fresh
    }

    fn key_for(message: &Message, ordinals: &mut HashMap<String, usize>) -> MessageKey {
        if let Some(handle) = &message.handle {
            return MessageKey::Handle(handle.clone());
        }
        let ordinal = ordinals.entry(message.text.clone()).or_insert(0);
        let key = MessageKey::Content {
            text: message.text.clone(),
            ordinal: *ordinal,
        };
        *ordinal += 1;
        key
    }
}
