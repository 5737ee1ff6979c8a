//! HTTP JSON chat feed source.

use std::time::Duration;

use serde_json::Value;

use crate::error::SourceError;
use crate::sources::{Source, SourceItem};
use crate::types::Message;

/// Polls an HTTP endpoint that returns the currently visible chat messages.
///
/// Accepted payloads:
/// - a JSON array of strings or `{ "id"?, "text" }` objects;
/// - an object with a `messages` (or `items`) array of the same.
///
/// `message` is accepted as an alias for `text`. A missing or non-string
/// text makes that single element unreadable for the cycle.
pub struct HttpFeedSource {
    client: reqwest::Client,
    url: String,
}

impl HttpFeedSource {
    /// Creates an `HttpFeedSource` with a request timeout and `User-Agent`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(url: &str, timeout_secs: u64, user_agent: &str) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(timeout_secs.min(10)))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            url: url.to_owned(),
        })
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    async fn fetch(&self) -> Result<Vec<SourceItem>, SourceError> {
        let response = self
            .client
            .get(&self.url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND || status == reqwest::StatusCode::GONE {
            return Err(SourceError::Unavailable(format!(
                "feed {} returned {status}",
                self.url
            )));
        }
        if !status.is_success() {
            return Err(SourceError::UnexpectedStatus {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        parse_feed(&body)
    }
}

impl Source for HttpFeedSource {
    async fn connect(&mut self) -> Result<(), SourceError> {
        let items = self.fetch().await?;
        tracing::debug!(url = %self.url, visible = items.len(), "connected to chat feed");
        Ok(())
    }

    async fn current_messages(&mut self) -> Result<Vec<SourceItem>, SourceError> {
        self.fetch().await
    }

    async fn close(&mut self) {
        tracing::debug!(url = %self.url, "chat feed source closed");
    }
}

fn parse_feed(body: &str) -> Result<Vec<SourceItem>, SourceError> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| SourceError::Malformed(format!("invalid JSON: {e}")))?;

    let elements = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("messages").or_else(|| map.remove("items")) {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(SourceError::Malformed(
                    "expected a `messages` array".to_owned(),
                ))
            }
        },
        _ => {
            return Err(SourceError::Malformed(
                "expected an array or object".to_owned(),
            ))
        }
    };

    Ok(elements
        .into_iter()
        .enumerate()
        .map(|(position, element)| parse_element(position, element))
        .collect())
}

fn parse_element(position: usize, element: Value) -> SourceItem {
    match element {
        Value::String(text) => Ok(Message::new(text)),
        Value::Object(map) => {
            let text = map
                .get("text")
                .or_else(|| map.get("message"))
                .and_then(Value::as_str)
                .ok_or_else(|| SourceError::Element {
                    position,
                    reason: "missing text".to_owned(),
                })?;
            let handle = match map.get("id") {
                Some(Value::String(id)) => Some(id.clone()),
                Some(Value::Number(id)) => Some(id.to_string()),
                _ => None,
            };
            Ok(Message {
                text: text.to_owned(),
                handle,
            })
        }
        other => Err(SourceError::Element {
            position,
            reason: format!("unsupported element {other}"),
        }),
    }
}
