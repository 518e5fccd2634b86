//! Bounded retry for collaborator calls.
//!
//! Only transport failures and 5xx responses are retried. Anything the
//! upstream service answered deliberately is returned on the first attempt.

use std::future::Future;
use std::time::Duration;

use crate::error::AgentError;

pub(crate) fn is_retriable(err: &AgentError) -> bool {
    match err {
        AgentError::Http(e) => {
            e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
        }
        AgentError::Api(_)
        | AgentError::Deserialize { .. }
        | AgentError::InvalidBaseUrl { .. }
        | AgentError::NotConfigured(_) => false,
    }
}

/// Runs `operation`, retrying up to `max_retries` times on transient errors.
///
/// The delay doubles per attempt from `backoff_base_ms`, jittered by ±25 %
/// and capped at 30 s.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, AgentError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AgentError>>,
{
    const MAX_DELAY_MS: u64 = 30_000;
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }
                attempt += 1;
                let computed = backoff_base_ms.saturating_mul(1u64 << (attempt - 1).min(10));
                let capped = computed.min(MAX_DELAY_MS);
                #[allow(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    clippy::cast_precision_loss
                )]
                let delay_ms = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_ms,
                    error = %err,
                    "collaborator call failed; retrying after back-off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}
