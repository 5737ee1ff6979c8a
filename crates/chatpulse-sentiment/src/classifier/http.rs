//! Client for a remote text-classification inference endpoint.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::classifier::Classifier;
use crate::error::ClassifierError;

/// Classifies text by POSTing `{"inputs": text}` to a text-classification
/// endpoint (TEI `/predict`, Hugging Face inference and compatible servers).
///
/// The label with the highest score wins.
pub struct HttpClassifier {
    client: reqwest::Client,
    url: String,
    token: Option<String>,
}

#[derive(Serialize)]
struct PredictRequest<'a> {
    inputs: &'a str,
}

#[derive(Debug, Deserialize)]
struct LabelScore {
    label: String,
    score: f64,
}

/// Servers return either a flat list or a list nested once per input.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PredictResponse {
    Flat(Vec<LabelScore>),
    Nested(Vec<Vec<LabelScore>>),
}

impl HttpClassifier {
    /// Create a new `HttpClassifier`.
    ///
    /// # Errors
    ///
    /// Returns [`ClassifierError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        url: &str,
        token: Option<String>,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, ClassifierError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            url: url.to_owned(),
            token,
        })
    }
}

impl Classifier for HttpClassifier {
    async fn classify(&self, text: &str) -> Result<String, ClassifierError> {
        let mut request = self
            .client
            .post(&self.url)
            .json(&PredictRequest { inputs: text });
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClassifierError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        top_label(&body)
    }
}

fn top_label(body: &str) -> Result<String, ClassifierError> {
    let parsed: PredictResponse = serde_json::from_str(body)
        .map_err(|e| ClassifierError::Parse(format!("unexpected response body: {e}")))?;

    let candidates = match parsed {
        PredictResponse::Flat(scores) => scores,
        PredictResponse::Nested(batches) => batches.into_iter().next().unwrap_or_default(),
    };

    candidates
        .into_iter()
        .max_by(|a, b| a.score.total_cmp(&b.score))
        .map(|best| best.label)
        .ok_or_else(|| ClassifierError::Parse("response contained no labels".to_owned()))
}
