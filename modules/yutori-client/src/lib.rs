pub mod error;
pub mod types;

pub use error::{Result, YutoriError};
pub use types::{
    CreateTaskRequest, StructuredResult, StructuredStatus, TaskState, TaskStatusResponse,
    TrajectoryResponse, TrajectoryStep,
};

use types::CreateTaskResponse;

const BASE_URL: &str = "https://api.yutori.com/v1/browsing";

/// Client for the Yutori browsing API. Holds one task primitive per
/// endpoint; polling policy lives with the caller.
pub struct YutoriClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl YutoriClient {
    pub fn new(api_key: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.to_string(),
            base_url: BASE_URL.to_string(),
        }
    }

    /// Point the client at a different endpoint (test servers).
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Start a browsing task. Returns immediately with the remote task id.
    pub async fn create_task(&self, request: &CreateTaskRequest) -> Result<String> {
        let url = format!("{}/tasks", self.base_url);
        let resp = self
            .client
            .post(&url)
            .header("X-API-Key", &self.api_key)
            .json(request)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(YutoriError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: CreateTaskResponse = resp.json().await?;
        let task_id = body.task_id.ok_or(YutoriError::MissingTaskId)?;
        tracing::debug!(task_id = %task_id, "Yutori task created");
        Ok(task_id)
    }

    /// Fetch the current status of a task.
    pub async fn get_task(&self, task_id: &str) -> Result<TaskStatusResponse> {
        let url = format!("{}/tasks/{}", self.base_url, task_id);
        let resp = self
            .client
            .get(&url)
            .header("X-API-Key", &self.api_key)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(YutoriError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(resp.json().await?)
    }

    /// Fetch the execution trace (screenshots per step) of a task.
    pub async fn get_trajectory(&self, task_id: &str) -> Result<TrajectoryResponse> {
        let url = format!("{}/tasks/{}/trajectory", self.base_url, task_id);
        let resp = self
            .client
            .get(&url)
            .header("X-API-Key", &self.api_key)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(YutoriError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(resp.json().await?)
    }
}
