use serde::{Deserialize, Serialize};

/// Body of `POST /ask`. A missing `prompt` decodes as empty and is rejected
/// later as missing input.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub prompt: String,
}

/// Body of every response the service writes, errors included.
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub answer: String,
}

impl ChatResponse {
    pub fn new(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
        }
    }
}
