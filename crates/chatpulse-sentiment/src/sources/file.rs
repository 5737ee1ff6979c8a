//! Append-only chat transcript source.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::SourceError;
use crate::sources::{Source, SourceItem};
use crate::types::Message;

/// Treats each non-empty line of a transcript file as one visible message.
///
/// The file is re-read on every cycle. A line that is not valid UTF-8 is
/// reported as an unreadable element and may be picked up on a later cycle
/// once the writer has finished it.
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> SourceError {
        if source.kind() == ErrorKind::NotFound {
            return SourceError::Unavailable(format!("{} not found", self.path.display()));
        }
        SourceError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }
}

impl Source for FileSource {
    async fn connect(&mut self) -> Result<(), SourceError> {
        let metadata = tokio::fs::metadata(&self.path)
            .await
            .map_err(|e| self.io_error(e))?;
        if !metadata.is_file() {
            return Err(SourceError::Unavailable(format!(
                "{} is not a regular file",
                self.path.display()
            )));
        }
        tracing::debug!(path = %self.path.display(), "opened chat transcript");
        Ok(())
    }

    async fn current_messages(&mut self) -> Result<Vec<SourceItem>, SourceError> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|e| self.io_error(e))?;
        Ok(split_transcript(&bytes))
    }

    async fn close(&mut self) {
        tracing::debug!(path = %self.path.display(), "chat transcript source closed");
    }
}

fn split_transcript(bytes: &[u8]) -> Vec<SourceItem> {
    bytes
        .split(|b| *b == b'\n')
        .enumerate()
        .filter_map(|(position, line)| match std::str::from_utf8(line) {
            Ok(text) => {
                let text = text.trim_end_matches('\r').trim();
                (!text.is_empty()).then(|| Ok(Message::new(text)))
            }
            Err(e) => Some(Err(SourceError::Element {
                position,
                reason: format!("invalid UTF-8: {e}"),
            })),
        })
        .collect()
}
