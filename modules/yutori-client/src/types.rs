use serde::{Deserialize, Serialize};

/// Body for `POST /tasks`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateTaskRequest {
    /// Natural-language instructions for the cloud browser agent.
    pub task: String,
    pub start_url: String,
    pub max_steps: u32,
    /// JSON schema the agent fills into `structured_result`.
    pub output_schema: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub struct CreateTaskResponse {
    #[serde(default)]
    pub task_id: Option<String>,
}

/// Remote task lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    Queued,
    Running,
    Succeeded,
    Failed,
}

impl TaskState {
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskState::Succeeded | TaskState::Failed)
    }
}

/// Structured outcome vocabulary the agent is asked to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructuredStatus {
    Prefilled,
    Submitted,
    NeedsOtp,
    Blocked,
    Failed,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StructuredResult {
    pub status: StructuredStatus,
    pub notes: Option<String>,
}

/// Response for `GET /tasks/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskStatusResponse {
    pub task_id: String,
    pub status: TaskState,
    /// Free-text result summary, present on most terminal tasks.
    pub result: Option<String>,
    /// Structured result matching the requested output schema, when the
    /// agent managed to produce one.
    pub structured_result: Option<StructuredResult>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrajectoryStep {
    pub screenshot: Option<String>,
}

/// Response for `GET /tasks/{id}/trajectory`.
#[derive(Debug, Clone, Deserialize)]
pub struct TrajectoryResponse {
    pub task_id: String,
    #[serde(default)]
    pub steps: Vec<TrajectoryStep>,
}
