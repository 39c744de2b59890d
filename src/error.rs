use thiserror::Error;

#[derive(Error, Debug)]
pub enum HarvestError {
    #[error("GitHub API request failed (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed response from {endpoint}: {reason}")]
    MalformedResponse { endpoint: String, reason: String },

    #[error("No workflow found with name: {0}")]
    WorkflowNotFound(String),
}

pub type Result<T> = std::result::Result<T, HarvestError>;
