use axum::Json;
use serde_json::{json, Value};

use crate::auth::extractor::AuthenticatedUser;

pub async fn current(auth: AuthenticatedUser) -> Json<Value> {
    Json(json!({
        "user": {
            "id": auth.user.id,
            "email": auth.user.email,
            "name": auth.user.name,
        }
    }))
}
