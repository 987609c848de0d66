use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::extractor::AuthenticatedUser;
use crate::error::AppError;
use crate::state::SharedState;
use crate::uploads;

#[derive(Deserialize)]
pub struct DownloadParams {
    pub file: Option<String>,
}

/// Lists the caller's uploads, or downloads one when `?file=<filename>` is
/// given.
pub async fn list(
    auth: AuthenticatedUser,
    State(state): State<SharedState>,
    Query(params): Query<DownloadParams>,
) -> Result<Response, AppError> {
    if let Some(filename) = params.file {
        let content = uploads::latest_content(&state.pool, auth.user_id(), &filename)
            .await?
            .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;

        return Ok((
            [
                (header::CONTENT_TYPE, HeaderValue::from_static("text/csv")),
                (header::CONTENT_DISPOSITION, attachment(&filename)),
            ],
            content,
        )
            .into_response());
    }

    let uploads = uploads::list_for_user(&state.pool, auth.user_id()).await?;
    Ok(Json(json!({ "uploads": uploads })).into_response())
}

/// `attachment; filename="..."` with anything outside printable ASCII, and
/// quotes and backslashes, replaced by `_`.
fn attachment(filename: &str) -> HeaderValue {
    let safe: String = filename
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii_graphic() || c == ' ' => c,
            _ => '_',
        })
        .collect();
    HeaderValue::from_str(&format!("attachment; filename=\"{safe}\""))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}

pub async fn create(
    auth: AuthenticatedUser,
    State(state): State<SharedState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let body = body.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge("File is too large".to_string())
        } else {
            AppError::BadRequest(rejection.body_text())
        }
    })?;
    let file = uploads::extract_file(&headers, body).await?;
    let upload = uploads::store(&state.pool, auth.user_id(), &file).await?;
    Ok((StatusCode::CREATED, Json(json!({ "upload": upload }))))
}

pub async fn method_not_allowed(method: Method) -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        [(header::ALLOW, "GET, POST")],
        Json(json!({ "error": format!("Method {method} Not Allowed") })),
    )
        .into_response()
}
