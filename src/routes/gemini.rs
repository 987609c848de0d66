use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::AppError;
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct PromptRequest {
    pub prompt: Option<String>,
}

#[derive(Serialize)]
pub struct PromptResponse {
    pub text: String,
}

pub async fn generate(
    State(state): State<SharedState>,
    payload: Result<Json<PromptRequest>, JsonRejection>,
) -> Result<Json<PromptResponse>, AppError> {
    let prompt = payload
        .ok()
        .and_then(|Json(req)| req.prompt)
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AppError::BadRequest("Prompt is required".to_string()))?;

    let text = state.generator.generate(&prompt).await?;
    Ok(Json(PromptResponse { text }))
}

pub async fn method_not_allowed() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        [(header::ALLOW, "POST")],
        Json(json!({ "error": "Method Not Allowed" })),
    )
        .into_response()
}
