use anyhow::Result;
use async_trait::async_trait;

use applyscout_common::{ApplyInput, ApplyOutcome, ApplyStatus};

/// Boundary to the external browser-automation provider.
///
/// The live implementation drives a cloud browser through the Yutori API;
/// the stub lets the runner and pipelines operate deterministically with
/// no network. Selected by configuration, never by inheritance.
#[async_trait]
pub trait ApplyAdapter: Send + Sync {
    /// Navigate to the job URL, fill the application form, and optionally
    /// submit it. When `submit` is false, stop before submission.
    async fn fill_and_submit(&self, input: &ApplyInput, submit: bool) -> Result<ApplyOutcome>;

    fn name(&self) -> &str;
}

/// Deterministic adapter for tests and offline operation: always succeeds,
/// PREFILLED or SUBMITTED depending on the submit flag.
pub struct StubAdapter;

#[async_trait]
impl ApplyAdapter for StubAdapter {
    async fn fill_and_submit(&self, input: &ApplyInput, submit: bool) -> Result<ApplyOutcome> {
        let action = if submit { "submit" } else { "prefill" };
        Ok(ApplyOutcome {
            status: if submit {
                ApplyStatus::Submitted
            } else {
                ApplyStatus::Prefilled
            },
            notes: format!("Stub: would {action} application at {}", input.job_url),
            screenshots: Vec::new(),
        })
    }

    fn name(&self) -> &str {
        "stub"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::make_input;

    #[tokio::test]
    async fn stub_prefills_when_submit_is_false() {
        let result = StubAdapter
            .fill_and_submit(&make_input("https://example.com/job/42"), false)
            .await
            .unwrap();
        assert_eq!(result.status, ApplyStatus::Prefilled);
        assert!(result.notes.contains("prefill"));
        assert!(result.notes.contains("https://example.com/job/42"));
        assert!(result.screenshots.is_empty());
    }

    #[tokio::test]
    async fn stub_submits_when_submit_is_true() {
        let result = StubAdapter
            .fill_and_submit(&make_input("https://example.com/job/42"), true)
            .await
            .unwrap();
        assert_eq!(result.status, ApplyStatus::Submitted);
        assert!(result.notes.contains("submit"));
    }
}
