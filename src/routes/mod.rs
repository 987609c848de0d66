pub mod expenses;
pub mod gemini;
pub mod session;
pub mod uploads;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;

use crate::state::SharedState;

pub fn api_routes(max_upload_size: usize) -> Router<SharedState> {
    Router::new()
        // Session
        .route("/api/auth/session", get(session::current))
        // Expenses
        .route(
            "/api/expenses",
            get(expenses::list)
                .post(expenses::create)
                .fallback(expenses::method_not_allowed),
        )
        // Uploads
        .route(
            "/api/upload",
            get(uploads::list)
                .post(uploads::create)
                .fallback(uploads::method_not_allowed)
                .layer(DefaultBodyLimit::max(max_upload_size)),
        )
        // Gemini relay
        .route(
            "/api/gemini",
            post(gemini::generate).fallback(gemini::method_not_allowed),
        )
}
