use chrono::{DateTime, TimeZone};
use serde::Serialize;

/// Timestamp layout for records: `HH:MM:SS:mmm`.
pub const TIMESTAMP_FORMAT: &str = "%H:%M:%S:%3f";

/// One message as currently visible in a live feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Display text of the message.
    pub text: String,
    /// Stable per-element identity, when the source exposes one.
    pub handle: Option<String>,
}

impl Message {
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            handle: None,
        }
    }

    #[must_use]
    pub fn with_handle(text: impl Into<String>, handle: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            handle: Some(handle.into()),
        }
    }
}

/// A message the poller has recognized as new, tagged with its
/// observation sequence number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observed {
    pub seq: u64,
    pub message: Message,
}

/// Coarse sentiment label attached to every record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
    Unknown,
}

impl Sentiment {
    pub const ALL: [Sentiment; 4] = [
        Sentiment::Positive,
        Sentiment::Neutral,
        Sentiment::Negative,
        Sentiment::Unknown,
    ];

    /// Map a raw classifier label onto the fixed label set.
    ///
    /// Accepts the `LABEL_0`/`LABEL_1`/`LABEL_2` ids emitted by three-class
    /// sentiment models and the plain `negative`/`neutral`/`positive` names
    /// (any case). Everything else is [`Sentiment::Unknown`].
    #[must_use]
    pub fn from_raw_label(raw: &str) -> Self {
        let raw = raw.trim();
        match raw {
            "LABEL_0" => Sentiment::Negative,
            "LABEL_1" => Sentiment::Neutral,
            "LABEL_2" => Sentiment::Positive,
            _ if raw.eq_ignore_ascii_case("negative") => Sentiment::Negative,
            _ if raw.eq_ignore_ascii_case("neutral") => Sentiment::Neutral,
            _ if raw.eq_ignore_ascii_case("positive") => Sentiment::Positive,
            _ => Sentiment::Unknown,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Sentiment::Positive => "Positive",
            Sentiment::Neutral => "Neutral",
            Sentiment::Negative => "Negative",
            Sentiment::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for Sentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One classified, timestamped observation of a message.
///
/// Fields are private so a record cannot change after it is created.
/// Serializes with the `Time`/`Content`/`Sentiment` column names used by
/// exports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    #[serde(skip)]
    seq: u64,
    #[serde(rename = "Time")]
    timestamp: String,
    #[serde(rename = "Content")]
    content: String,
    #[serde(rename = "Sentiment")]
    sentiment: Sentiment,
}

impl Record {
    #[must_use]
    pub fn new<Tz>(seq: u64, now: &DateTime<Tz>, content: String, sentiment: Sentiment) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        Self {
            seq,
            timestamp: now.format(TIMESTAMP_FORMAT).to_string(),
            content,
            sentiment,
        }
    }

    #[must_use]
    pub fn seq(&self) -> u64 {
        self.seq
    }

    #[must_use]
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    #[must_use]
    pub fn sentiment(&self) -> Sentiment {
        self.sentiment
    }
}
