//! Retry with exponential back-off and jitter for the source handshake.
//!
//! Live feeds are often not ready the instant a run starts (the chat
//! frame is still loading, the transcript writer has not flushed yet).
//! [`connect_with_retry`] re-attempts the handshake on transient errors
//! and gives up immediately on errors that will not change.

use std::time::Duration;

use crate::error::SourceError;
use crate::sources::Source;

/// Returns `true` for errors that are worth retrying after a back-off delay.
///
/// **Retriable:**
/// - Network-level failures: timeout, connection refused/reset.
/// - HTTP 429 and 5xx responses.
/// - I/O errors other than a missing file.
///
/// **Not retriable:**
/// - [`SourceError::Unavailable`]: the feed is gone.
/// - [`SourceError::Malformed`]: the feed answers, but not with chat data.
/// - Other 4xx statuses.
pub(crate) fn is_retriable(err: &SourceError) -> bool {
    match err {
        SourceError::Http(e) => {
            e.is_timeout()
                || e.is_connect()
                || e.status()
                    .is_some_and(|s| s.is_server_error() || s.as_u16() == 429)
        }
        SourceError::UnexpectedStatus { status, .. } => *status == 429 || *status >= 500,
        SourceError::Io { .. } => true,
        SourceError::Unavailable(_)
        | SourceError::Malformed(_)
        | SourceError::Element { .. } => false,
    }
}

/// Delay before retry number `attempt` (1-based): `base × 2^(attempt-1)`,
/// capped at 30 s, with ±25 % jitter.
fn backoff_delay(attempt: u32, backoff_base_ms: u64) -> Duration {
    const MAX_DELAY_MS: u64 = 30_000;
    let computed = backoff_base_ms.saturating_mul(1u64 << attempt.saturating_sub(1).min(10));
    let capped = computed.min(MAX_DELAY_MS);
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let delay_ms = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
    Duration::from_millis(delay_ms)
}

/// Handshake with `source`, retrying up to `max_retries` additional times
/// on transient errors.
///
/// Back-off schedule with `backoff_base_ms = 500`:
///
/// | Attempt | Sleep before next attempt    |
/// |---------|------------------------------|
/// | 1       | 500 ms × 2⁰ ± 25 % jitter    |
/// | 2       | 500 ms × 2¹ ± 25 % jitter    |
/// | 3       | 500 ms × 2² ± 25 % jitter    |
///
/// Non-retriable errors are returned immediately.
pub(crate) async fn connect_with_retry<S: Source>(
    source: &mut S,
    max_retries: u32,
    backoff_base_ms: u64,
) -> Result<(), SourceError> {
    let mut attempt = 0u32;
    loop {
        match source.connect().await {
            Ok(()) => return Ok(()),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }
                attempt += 1;
                let delay = backoff_delay(attempt, backoff_base_ms);
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    error = %err,
                    "source handshake failed; retrying after back-off"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}
