//! Request types for the chat endpoint.

use serde::{Deserialize, Serialize};

/// Body of a chat request. The endpoint accepts exactly one field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatRequest {
    pub message: String,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
