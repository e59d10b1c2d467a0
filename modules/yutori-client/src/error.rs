use thiserror::Error;

pub type Result<T> = std::result::Result<T, YutoriError>;

#[derive(Debug, Error)]
pub enum YutoriError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Task creation did not return a task_id")]
    MissingTaskId,
}

impl From<reqwest::Error> for YutoriError {
    fn from(err: reqwest::Error) -> Self {
        YutoriError::Network(err.to_string())
    }
}
