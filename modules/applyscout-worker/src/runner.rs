use std::sync::{Arc, LazyLock};

use regex::Regex;

use applyscout_common::{ApplyInput, ApplyOutcome, ApplyStatus, RunnerConfig};

use crate::adapter::ApplyAdapter;
use crate::retry::{classify_error, with_retry_notify, RetryPolicy};
use crate::throttle::DomainThrottle;

static BLOCKED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)captcha|blocked").unwrap());

/// Drives one apply task end to end: domain throttling, submit-flag
/// resolution, retry with backoff, and mapping exhausted or terminal
/// failures into an outcome. [`run`](ApplyRunner::run) never returns an
/// error; every failure becomes a FAILED or BLOCKED outcome the caller
/// can persist.
pub struct ApplyRunner {
    adapter: Arc<dyn ApplyAdapter>,
    config: RunnerConfig,
    throttle: DomainThrottle,
}

impl ApplyRunner {
    pub fn new(adapter: Arc<dyn ApplyAdapter>, config: RunnerConfig) -> Self {
        let throttle = DomainThrottle::new(config.domain_throttle_ms);
        Self {
            adapter,
            config,
            throttle,
        }
    }

    pub fn adapter_name(&self) -> &str {
        self.adapter.name()
    }

    pub async fn run(&self, input: &ApplyInput) -> ApplyOutcome {
        let throttled = self.throttle.throttle(&input.job_url).await;
        if throttled.waited_ms > 0 {
            tracing::debug!(
                domain = %throttled.domain,
                waited_ms = throttled.waited_ms,
                "Throttled before dispatch"
            );
        }

        // Per-task override wins; otherwise safe mode means prefill only.
        let submit = input.submit.unwrap_or(!self.config.safe_mode);

        let policy = RetryPolicy {
            max_retries: self.config.max_retries,
            base_delay_ms: self.config.base_delay_ms,
            max_delay_ms: self.config.max_delay_ms,
        };

        let result = with_retry_notify(
            &policy,
            |attempt, delay_ms, error| {
                tracing::warn!(
                    job_url = %input.job_url,
                    attempt,
                    delay_ms,
                    error = %error.message,
                    "Apply attempt failed, retrying"
                );
            },
            || self.adapter.fill_and_submit(input, submit),
        )
        .await;

        match result {
            Ok(outcome) => {
                tracing::info!(
                    job_url = %input.job_url,
                    status = %outcome.status,
                    adapter = self.adapter.name(),
                    safe_mode = self.config.safe_mode,
                    "Apply task finished"
                );
                outcome
            }
            Err(error) => {
                let classified = classify_error(&error);
                tracing::error!(
                    job_url = %input.job_url,
                    category = %classified.category,
                    error = %classified.message,
                    "Apply task failed"
                );

                let status = if BLOCKED_RE.is_match(&classified.message) {
                    ApplyStatus::Blocked
                } else {
                    ApplyStatus::Failed
                };
                ApplyOutcome {
                    status,
                    notes: format!("{}: {}", classified.category, classified.message),
                    screenshots: Vec::new(),
                }
            }
        }
    }
}
