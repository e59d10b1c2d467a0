use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tokio::time::Instant;

use applyscout_common::{ApplyInput, ApplyOutcome, ApplyStatus};
use yutori_client::{CreateTaskRequest, StructuredStatus, TaskState, YutoriClient};

use crate::adapter::ApplyAdapter;

/// How much resume text goes into the task prompt.
const RESUME_SNIPPET_CHARS: usize = 500;

#[derive(Debug, Clone)]
pub struct YutoriOptions {
    pub max_steps: u32,
    pub poll_interval_ms: u64,
    /// Absolute deadline from task creation. On expiry the adapter returns
    /// a FAILED outcome naming the remote task id instead of blocking.
    pub poll_timeout_ms: u64,
}

impl Default for YutoriOptions {
    fn default() -> Self {
        Self {
            max_steps: 50,
            poll_interval_ms: 3_000,
            poll_timeout_ms: 300_000,
        }
    }
}

/// Live adapter: runs a cloud browser task through the Yutori browsing
/// API, polls it to completion, and maps the result into the runner's
/// status vocabulary.
pub struct YutoriApplyAdapter {
    client: YutoriClient,
    options: YutoriOptions,
}

/// Schema the agent is asked to fill into `structured_result`.
fn output_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "status": {
                "type": "string",
                "enum": ["prefilled", "submitted", "needs_otp", "blocked", "failed"],
            },
            "notes": {
                "type": "string",
                "description": "Brief description of what happened",
            },
        },
        "required": ["status", "notes"],
    })
}

fn map_structured_status(status: StructuredStatus) -> ApplyStatus {
    match status {
        StructuredStatus::Prefilled => ApplyStatus::Prefilled,
        StructuredStatus::Submitted => ApplyStatus::Submitted,
        StructuredStatus::NeedsOtp => ApplyStatus::NeedsOtp,
        StructuredStatus::Blocked => ApplyStatus::Blocked,
        StructuredStatus::Failed => ApplyStatus::Failed,
    }
}

/// Infer a status from free text when no structured result came back.
fn status_from_text(text: &str) -> ApplyStatus {
    let lower = text.to_lowercase();
    if lower.contains("submitted") {
        ApplyStatus::Submitted
    } else if lower.contains("captcha") || lower.contains("blocked") {
        ApplyStatus::Blocked
    } else if lower.contains("otp") || lower.contains("verification") {
        ApplyStatus::NeedsOtp
    } else {
        ApplyStatus::Failed
    }
}

fn build_task_prompt(input: &ApplyInput, submit: bool) -> String {
    let snippet: String = if input.resume_text.chars().count() > RESUME_SNIPPET_CHARS {
        let truncated: String = input.resume_text.chars().take(RESUME_SNIPPET_CHARS).collect();
        format!("{truncated}...")
    } else {
        input.resume_text.clone()
    };

    let mut lines = vec![
        "Fill out the job application form on this page.".to_string(),
        "Use the following information:".to_string(),
        format!("- Full Name: {}", input.user_profile.name),
        format!("- Email: {}", input.user_profile.email),
    ];
    if let Some(phone) = &input.user_profile.phone {
        lines.push(format!("- Phone: {phone}"));
    }
    lines.push(format!(
        "- Resume/Cover Letter: paste this text where applicable: \"{snippet}\""
    ));
    lines.push(if submit {
        "After filling all fields, click Submit/Apply.".to_string()
    } else {
        "Fill all fields but DO NOT click Submit. Stop before submission.".to_string()
    });
    lines.push("If you encounter a CAPTCHA or are blocked, stop and report it.".to_string());
    lines.push("If an OTP or verification code is requested, stop and report it.".to_string());
    lines.join("\n")
}

impl YutoriApplyAdapter {
    pub fn new(client: YutoriClient, options: YutoriOptions) -> Self {
        Self { client, options }
    }

    /// Best-effort fetch of the last 3 screenshots from the execution
    /// trace. Failures here never affect the returned status or notes.
    async fn fetch_screenshots(&self, task_id: &str) -> Vec<String> {
        match self.client.get_trajectory(task_id).await {
            Ok(trajectory) => {
                let shots: Vec<String> = trajectory
                    .steps
                    .into_iter()
                    .filter_map(|step| step.screenshot.filter(|s| !s.is_empty()))
                    .collect();
                let skip = shots.len().saturating_sub(3);
                shots.into_iter().skip(skip).collect()
            }
            Err(error) => {
                tracing::debug!(task_id, error = %error, "Trajectory fetch failed, continuing without screenshots");
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl ApplyAdapter for YutoriApplyAdapter {
    async fn fill_and_submit(&self, input: &ApplyInput, submit: bool) -> Result<ApplyOutcome> {
        let request = CreateTaskRequest {
            task: build_task_prompt(input, submit),
            start_url: input.job_url.clone(),
            max_steps: self.options.max_steps,
            output_schema: output_schema(),
        };

        let task_id = self.client.create_task(&request).await?;
        tracing::info!(task_id = %task_id, job_url = %input.job_url, submit, "Yutori task created, polling");

        let deadline = Instant::now() + Duration::from_millis(self.options.poll_timeout_ms);
        let terminal = loop {
            if Instant::now() >= deadline {
                return Ok(ApplyOutcome {
                    status: ApplyStatus::Failed,
                    notes: format!("Timed out waiting for Yutori task {task_id}"),
                    screenshots: Vec::new(),
                });
            }

            let status = self.client.get_task(&task_id).await?;
            if status.status.is_terminal() {
                break status;
            }
            tracing::debug!(task_id = %task_id, state = ?status.status, "Yutori task still running");
            tokio::time::sleep(Duration::from_millis(self.options.poll_interval_ms)).await;
        };

        if terminal.status == TaskState::Failed {
            let text = terminal.result.unwrap_or_default();
            let status = status_from_text(&text);
            return Ok(ApplyOutcome {
                status,
                notes: if text.is_empty() {
                    "Yutori task failed".to_string()
                } else {
                    text
                },
                screenshots: Vec::new(),
            });
        }

        let (status, notes) = match terminal.structured_result {
            Some(structured) => (
                map_structured_status(structured.status),
                structured
                    .notes
                    .or(terminal.result)
                    .unwrap_or_else(|| "Application task completed.".to_string()),
            ),
            None => {
                let text = terminal.result.unwrap_or_default();
                let status = status_from_text(&text);
                let notes = if text.is_empty() {
                    "Application task completed.".to_string()
                } else {
                    text
                };
                (status, notes)
            }
        };

        let screenshots = self.fetch_screenshots(&task_id).await;
        Ok(ApplyOutcome {
            status,
            notes,
            screenshots,
        })
    }

    fn name(&self) -> &str {
        "yutori"
    }
}
