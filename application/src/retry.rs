//! Retry policies for LLM-backed operations.
//!
//! Two policies cover the orchestration core: a transient policy for any
//! gateway failure, and a parse policy that retries only when the model
//! returned malformed JSON. Both use the same fixed wait schedule of
//! 1s, 2s and 5s across three attempts.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::agents::AgentError;

/// Waits applied after the first and second failed attempts.
const WAIT_SCHEDULE: [Duration; 2] = [Duration::from_secs(1), Duration::from_secs(2)];
/// Wait applied after any further failed attempt.
const MAX_WAIT: Duration = Duration::from_secs(5);
/// Total attempts before the last error is returned.
pub const MAX_ATTEMPTS: usize = 3;

fn wait_for(attempt: usize) -> Duration {
    WAIT_SCHEDULE.get(attempt - 1).copied().unwrap_or(MAX_WAIT)
}

/// Retry an operation when the error matches the policy's predicate.
async fn retry_if<T, F, Fut, P>(what: &str, mut op: F, should_retry: P) -> Result<T, AgentError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AgentError>>,
    P: Fn(&AgentError) -> bool,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < MAX_ATTEMPTS && should_retry(&err) => {
                let wait = wait_for(attempt);
                warn!(
                    operation = what,
                    attempt,
                    wait_secs = wait.as_secs(),
                    error = %err,
                    "retrying after failure"
                );
                tokio::time::sleep(wait).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

/// Retry on any failure. Used for plain completions where the gateway is
/// the only thing that can fail.
pub async fn retry_transient<T, F, Fut>(what: &str, op: F) -> Result<T, AgentError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AgentError>>,
{
    retry_if(what, op, |_| true).await
}

/// Retry only when the model produced unparseable JSON. Any other failure
/// (gateway, unknown tool) is returned on the first occurrence.
pub async fn retry_on_json_error<T, F, Fut>(what: &str, op: F) -> Result<T, AgentError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AgentError>>,
{
    retry_if(what, op, AgentError::is_json_error).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn json_err() -> AgentError {
        AgentError::MalformedJson("expected value at line 1".into())
    }

    fn gateway_err() -> AgentError {
        AgentError::Gateway(crate::ports::llm_gateway::GatewayError::Timeout)
    }

    #[tokio::test(start_paused = true)]
    async fn transient_policy_recovers_on_second_attempt() {
        let calls = AtomicUsize::new(0);
        let result = retry_transient("completion", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Err(gateway_err())
                } else {
                    Ok("recovered")
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), "recovered");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn transient_policy_gives_up_after_three_attempts() {
        let calls = AtomicUsize::new(0);
        let result: Result<(), _> = retry_transient("completion", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(gateway_err()) }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), MAX_ATTEMPTS);
    }

    #[tokio::test(start_paused = true)]
    async fn json_policy_retries_parse_failures() {
        let calls = AtomicUsize::new(0);
        let result = retry_on_json_error("tool arguments", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(json_err())
                } else {
                    Ok(serde_json::json!({"city": "Tokyo"}))
                }
            }
        })
        .await;
        assert!(result.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn json_policy_passes_through_gateway_errors() {
        let calls = AtomicUsize::new(0);
        let result: Result<(), _> = retry_on_json_error("tool arguments", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(gateway_err()) }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn wait_schedule_is_one_two_five() {
        let start = tokio::time::Instant::now();
        let _: Result<(), _> = retry_transient("completion", || async { Err(gateway_err()) }).await;
        assert_eq!(start.elapsed(), Duration::from_secs(3));
    }
}
