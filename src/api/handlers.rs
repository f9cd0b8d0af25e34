use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{error, info, warn};

use crate::upstream::{ChatCompletionRequest, ChatCompletionResponse};
use crate::AppState;

use super::error::AskError;
use super::models::{ChatRequest, ChatResponse};

// The body is decoded by hand so that any content type is accepted and every
// read or decode failure still answers with a JSON body.
pub async fn ask(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<ChatResponse>, AskError> {
    let body = body.map_err(|rejection| {
        warn!(error = %rejection, "failed to read ask body");
        AskError::Body(rejection)
    })?;

    let payload: ChatRequest = serde_json::from_slice(&body).map_err(|err| {
        warn!(error = %err, "rejecting malformed ask body");
        AskError::MalformedInput(err)
    })?;

    let prompt = payload.prompt.as_str();
    if prompt.is_empty() {
        return Err(AskError::MissingPrompt);
    }

    info!(prompt, "prompt received");

    let api_key = state.config.api_key.as_deref().ok_or_else(|| {
        error!("GROQ_API_KEY is not configured");
        AskError::MissingApiKey
    })?;

    let request =
        ChatCompletionRequest::new(&state.config.model, &state.config.system_prompt, prompt);

    let answer = state
        .chat_client
        .complete(api_key, &request)
        .await
        .and_then(ChatCompletionResponse::first_answer)
        .map_err(|err| {
            error!(error = %err, model = %request.model, "upstream completion failed");
            AskError::Upstream(err)
        })?;

    info!(answer_len = answer.len(), "answer sent");
    Ok(Json(ChatResponse::new(answer)))
}

pub async fn preflight() -> StatusCode {
    StatusCode::OK
}

pub async fn method_not_allowed() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(ChatResponse::new("Method not allowed")),
    )
        .into_response()
}

pub async fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(ChatResponse::new("Not found"))).into_response()
}
