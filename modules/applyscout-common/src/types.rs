use serde::{Deserialize, Serialize};

/// Search preferences derived from a user preference record.
/// Immutable input to the query builder.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchPreferences {
    pub title: Option<String>,
    pub location: Option<String>,
    pub salary_min: Option<u32>,
    pub remote_ok: bool,
    pub include_keywords: Vec<String>,
    pub exclude_keywords: Vec<String>,
}

/// One hit from one search query call. The provider-supplied score is
/// unbounded and optional.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawSearchResult {
    pub title: String,
    pub url: String,
    pub content: String,
    pub score: Option<f64>,
}

/// All results produced by a single query.
#[derive(Debug, Clone)]
pub struct QueryBatch {
    pub query: String,
    pub results: Vec<RawSearchResult>,
}

/// A deduplicated, scored candidate posting — the unit persisted as a lead.
/// One per unique canonical URL; `sources` lists every contributing query
/// in order of first appearance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedResult {
    pub title: String,
    pub url: String,
    pub content: String,
    pub score: f64,
    pub sources: Vec<String>,
    pub dedupe_hash: String,
}

/// Applicant identity used to fill application forms.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

/// Preference filters carried alongside an apply task.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApplyPreferences {
    pub title: Option<String>,
    pub location: Option<String>,
    pub min_salary: Option<u32>,
    pub keywords: Vec<String>,
}

/// Everything the runner needs to execute one apply task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplyInput {
    pub job_url: String,
    pub user_profile: UserProfile,
    pub resume_text: String,
    pub preferences: ApplyPreferences,
    /// When set, overrides the runner's safe-mode-derived submit flag.
    pub submit: Option<bool>,
}

/// Runner-level outcome vocabulary. `Blocked` never reaches storage —
/// see [`TaskStatus::from_apply_status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApplyStatus {
    Prefilled,
    Submitted,
    NeedsOtp,
    Blocked,
    Failed,
}

impl std::fmt::Display for ApplyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ApplyStatus::Prefilled => "PREFILLED",
            ApplyStatus::Submitted => "SUBMITTED",
            ApplyStatus::NeedsOtp => "NEEDS_OTP",
            ApplyStatus::Blocked => "BLOCKED",
            ApplyStatus::Failed => "FAILED",
        };
        f.write_str(s)
    }
}

/// Result of one apply-task execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplyOutcome {
    pub status: ApplyStatus,
    pub notes: String,
    pub screenshots: Vec<String>,
}

/// Persisted apply-task status. `Confirmed`/`Rejected` are reached only
/// through later human/inbox confirmation flows, never by the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Queued,
    Prefilled,
    Submitted,
    NeedsOtp,
    Failed,
    Confirmed,
    Rejected,
}

impl TaskStatus {
    /// Narrow a runner outcome into the persisted vocabulary. There is no
    /// terminal BLOCKED storage state: the runner's notes carry the reason
    /// and the task lands as Failed, eligible for manual re-queue.
    pub fn from_apply_status(status: ApplyStatus) -> Self {
        match status {
            ApplyStatus::Prefilled => TaskStatus::Prefilled,
            ApplyStatus::Submitted => TaskStatus::Submitted,
            ApplyStatus::NeedsOtp => TaskStatus::NeedsOtp,
            ApplyStatus::Blocked | ApplyStatus::Failed => TaskStatus::Failed,
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TaskStatus::Queued => "QUEUED",
            TaskStatus::Prefilled => "PREFILLED",
            TaskStatus::Submitted => "SUBMITTED",
            TaskStatus::NeedsOtp => "NEEDS_OTP",
            TaskStatus::Failed => "FAILED",
            TaskStatus::Confirmed => "CONFIRMED",
            TaskStatus::Rejected => "REJECTED",
        };
        f.write_str(s)
    }
}
