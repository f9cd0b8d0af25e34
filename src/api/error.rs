use axum::{
    extract::rejection::BytesRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::upstream::UpstreamError;

use super::models::ChatResponse;

#[derive(Debug, Error)]
pub enum AskError {
    #[error("Invalid request body: {0}")]
    Body(BytesRejection),
    #[error("Invalid JSON input: {0}")]
    MalformedInput(#[from] serde_json::Error),
    #[error("Prompt cannot be empty")]
    MissingPrompt,
    #[error("Server Misconfiguration: Missing API Key")]
    MissingApiKey,
    #[error("Groq is busy or your key is invalid. Error: {0}")]
    Upstream(#[from] UpstreamError),
}

impl AskError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Body(rejection) => rejection.status(),
            Self::MalformedInput(_) | Self::MissingPrompt => StatusCode::BAD_REQUEST,
            Self::MissingApiKey | Self::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AskError {
    fn into_response(self) -> Response {
        (self.status(), Json(ChatResponse::new(self.to_string()))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_validation_failures_are_client_errors() {
        let malformed = serde_json::from_str::<serde_json::Value>("{").unwrap_err();

        assert_eq!(
            AskError::MalformedInput(malformed).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AskError::MissingPrompt.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn upstream_failure_embeds_the_upstream_text() {
        let err = AskError::from(UpstreamError::NoChoices);

        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            err.to_string(),
            "Groq is busy or your key is invalid. Error: upstream returned no completion choices"
        );
    }

    #[test]
    fn missing_key_is_a_server_error() {
        assert_eq!(
            AskError::MissingApiKey.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
