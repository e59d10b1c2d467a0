use std::future::Future;
use std::sync::LazyLock;
use std::time::Duration;

use anyhow::Result;
use rand::Rng;
use regex::Regex;

/// Failure taxonomy: retryable failures are presumed transient and safe to
/// retry with backoff; terminal failures cannot succeed on retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Retryable,
    Terminal,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Retryable => f.write_str("retryable"),
            ErrorCategory::Terminal => f.write_str("terminal"),
        }
    }
}

/// Classification of a raw failure. Never mutated once created.
#[derive(Debug, Clone)]
pub struct ClassifiedError {
    pub category: ErrorCategory,
    pub message: String,
}

// Authorization, not-found, anti-automation, and business-finality signals.
// Checked first: terminal wins when a message matches both sets.
static TERMINAL_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"401",
        r"403",
        r"404",
        r"(?i)not found",
        r"(?i)unauthorized",
        r"(?i)forbidden",
        r"(?i)captcha",
        r"(?i)blocked",
        r"(?i)application.*closed",
        r"(?i)position.*filled",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

// Transient network and availability conditions.
static RETRYABLE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"ECONNRESET",
        r"ECONNREFUSED",
        r"ETIMEDOUT",
        r"ENOTFOUND",
        r"fetch failed",
        r"socket hang up",
        r"(?i)timeout",
        r"(?i)rate.?limit",
        r"(?i)too many requests",
        r"429",
        r"502",
        r"503",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// Classify an error message as retryable or terminal. Unknown failures
/// default to retryable, trading wasted retries on genuinely permanent
/// errors for resilience against transient glitches.
pub fn classify_message(message: &str) -> ClassifiedError {
    if TERMINAL_PATTERNS.iter().any(|p| p.is_match(message)) {
        return ClassifiedError {
            category: ErrorCategory::Terminal,
            message: message.to_string(),
        };
    }
    if RETRYABLE_PATTERNS.iter().any(|p| p.is_match(message)) {
        return ClassifiedError {
            category: ErrorCategory::Retryable,
            message: message.to_string(),
        };
    }
    ClassifiedError {
        category: ErrorCategory::Retryable,
        message: message.to_string(),
    }
}

pub fn classify_error(error: &anyhow::Error) -> ClassifiedError {
    classify_message(&error.to_string())
}

/// Exponential backoff with full jitter: a uniform random integer in
/// `[0, min(max_delay_ms, base_delay_ms * 2^attempt))`.
pub fn compute_backoff_ms(attempt: u32, base_delay_ms: u64, max_delay_ms: u64) -> u64 {
    let exponential = base_delay_ms.saturating_mul(2u64.saturating_pow(attempt));
    let cap = exponential.min(max_delay_ms);
    if cap == 0 {
        return 0;
    }
    rand::rng().random_range(0..cap)
}

/// Bounds for the retry loop. Total attempts = `max_retries + 1`.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

/// Execute `f` under the retry policy. Terminal errors propagate
/// immediately; retryable errors back off and retry until the attempt
/// ceiling, after which the original error is returned unwrapped so
/// callers can match on the real failure.
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, f: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    with_retry_notify(policy, |_, _, _| {}, f).await
}

/// Like [`with_retry`], invoking `on_retry(attempt, delay_ms, error)`
/// before each backoff sleep. Not invoked for the final failed attempt.
pub async fn with_retry_notify<T, F, Fut, N>(
    policy: &RetryPolicy,
    mut on_retry: N,
    mut f: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
    N: FnMut(u32, u64, &ClassifiedError),
{
    let mut last_error = None;

    for attempt in 0..=policy.max_retries {
        match f().await {
            Ok(value) => return Ok(value),
            Err(error) => {
                let classified = classify_error(&error);
                if classified.category == ErrorCategory::Terminal {
                    return Err(error);
                }

                let exhausted = attempt == policy.max_retries;
                last_error = Some(error);

                if !exhausted {
                    let delay_ms =
                        compute_backoff_ms(attempt, policy.base_delay_ms, policy.max_delay_ms);
                    on_retry(attempt, delay_ms, &classified);
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                }
            }
        }
    }

    Err(last_error.unwrap_or_else(|| anyhow::anyhow!("All retries exhausted")))
}
