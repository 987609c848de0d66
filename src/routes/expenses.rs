use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::auth::extractor::AuthenticatedUser;
use crate::error::AppError;
use crate::expenses::{self, CreateExpense};
use crate::models::Expense;
use crate::state::SharedState;

pub async fn list(
    auth: AuthenticatedUser,
    State(state): State<SharedState>,
) -> Result<Json<Vec<Expense>>, AppError> {
    let expenses = expenses::list_for_user(&state.pool, auth.user_id()).await?;
    Ok(Json(expenses))
}

pub async fn create(
    auth: AuthenticatedUser,
    State(state): State<SharedState>,
    payload: Result<Json<CreateExpense>, JsonRejection>,
) -> Result<(StatusCode, Json<Expense>), AppError> {
    let Json(req) = payload?;
    let expense = expenses::create(&state.pool, &auth.user, req).await?;
    Ok((StatusCode::CREATED, Json(expense)))
}

pub async fn method_not_allowed(method: Method) -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        [(header::ALLOW, "GET, POST")],
        Json(json!({ "error": format!("Method {method} Not Allowed") })),
    )
        .into_response()
}
