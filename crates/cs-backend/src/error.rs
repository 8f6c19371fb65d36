use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("HTTP error! status: {}", .status.as_u16())]
    Status { status: StatusCode, body: String },
    #[error("HTTP error! status: 401 (missing or expired token)")]
    Unauthorized,
    #[error("stream error: {0}")]
    Transport(String),
    #[error("stream aborted")]
    Aborted,
}

impl ChatError {
    /// Classify a non-success response.
    pub fn from_status(status: StatusCode, body: String) -> Self {
        if status == StatusCode::UNAUTHORIZED {
            ChatError::Unauthorized
        } else {
            ChatError::Status { status, body }
        }
    }
}

impl From<std::io::Error> for ChatError {
    fn from(err: std::io::Error) -> Self {
        ChatError::Transport(err.to_string())
    }
}
