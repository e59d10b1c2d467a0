use anyhow::Result;

use applyscout_common::{ApplyInput, ApplyPreferences, TaskStatus, UserProfile};

use crate::runner::ApplyRunner;
use crate::store::{ClaimedTask, JobStore};

/// Counters for one apply pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ApplyStats {
    pub claimed: usize,
    pub submitted: usize,
    pub prefilled: usize,
    pub needs_otp: usize,
    pub failed: usize,
    pub skipped_no_resume: usize,
}

fn build_apply_input(task: &ClaimedTask, resume_text: String) -> ApplyInput {
    let profile = &task.profile;
    // No display name on file; the email local part is the best stand-in.
    let name = profile
        .email
        .split_once('@')
        .map(|(local, _)| local.to_string())
        .unwrap_or_else(|| profile.email.clone());

    ApplyInput {
        job_url: task.lead.url.clone(),
        user_profile: UserProfile {
            name,
            email: profile.email.clone(),
            phone: None,
        },
        resume_text,
        preferences: ApplyPreferences {
            title: profile.title.clone(),
            location: profile.location.clone(),
            min_salary: profile.min_salary,
            keywords: profile.keywords.clone(),
        },
        // Submit decision stays with the runner's safe-mode config.
        submit: None,
    }
}

/// One apply pass: claim up to `batch_size` queued tasks, run each
/// through the runner, and persist the narrowed status. Tasks on
/// profiles without resume text are released back to the queue; they
/// run once a resume is on file.
pub async fn run_apply_pass(
    store: &dyn JobStore,
    runner: &ApplyRunner,
    batch_size: usize,
) -> Result<ApplyStats> {
    let started = std::time::Instant::now();
    let mut stats = ApplyStats::default();
    let tasks = store.claim_queued(batch_size).await?;
    stats.claimed = tasks.len();
    if tasks.is_empty() {
        tracing::debug!("No queued apply tasks");
        return Ok(stats);
    }
    tracing::info!(claimed = tasks.len(), adapter = runner.adapter_name(), "Starting apply pass");

    for task in tasks {
        let Some(resume_text) = task.profile.resume_text.clone() else {
            tracing::warn!(
                task_id = %task.id,
                profile = %task.profile.email,
                "Profile has no resume text, skipping task"
            );
            store.release_task(task.id).await?;
            stats.skipped_no_resume += 1;
            continue;
        };

        let input = build_apply_input(&task, resume_text);
        let outcome = runner.run(&input).await;

        let status = TaskStatus::from_apply_status(outcome.status);
        match status {
            TaskStatus::Submitted => stats.submitted += 1,
            TaskStatus::Prefilled => stats.prefilled += 1,
            TaskStatus::NeedsOtp => stats.needs_otp += 1,
            TaskStatus::Failed => stats.failed += 1,
            _ => {}
        }
        let error_note = (status == TaskStatus::Failed).then(|| outcome.notes.clone());
        store.finish_task(task.id, status, error_note).await?;
    }

    tracing::info!(
        claimed = stats.claimed,
        submitted = stats.submitted,
        prefilled = stats.prefilled,
        needs_otp = stats.needs_otp,
        failed = stats.failed,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Apply pass complete"
    );
    Ok(stats)
}
