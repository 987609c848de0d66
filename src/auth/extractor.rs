use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::extract::CookieJar;
use uuid::Uuid;

use crate::auth::session::{self, SESSION_COOKIE};
use crate::directory;
use crate::error::AppError;
use crate::models::User;
use crate::state::SharedState;

/// A verified session: the email asserted by the identity provider.
#[derive(Debug, Clone)]
pub struct SessionIdentity {
    pub email: String,
}

impl FromRequestParts<SharedState> for SessionIdentity {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        // Bearer token first, then the session cookie
        if let Some(auth_header) = parts.headers.get("authorization") {
            let auth_str = auth_header
                .to_str()
                .map_err(|_| AppError::Unauthorized("Unauthorized".to_string()))?;

            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                return verify(token, &state.config.session_secret);
            }
        }

        let jar = CookieJar::from_headers(&parts.headers);
        if let Some(cookie) = jar.get(SESSION_COOKIE) {
            return verify(cookie.value(), &state.config.session_secret);
        }

        Err(AppError::Unauthorized("Unauthorized".to_string()))
    }
}

fn verify(token: &str, secret: &str) -> Result<SessionIdentity, AppError> {
    let claims = session::verify_token(token, secret).map_err(|e| {
        tracing::debug!("Rejected session token: {e}");
        AppError::Unauthorized("Unauthorized".to_string())
    })?;
    Ok(SessionIdentity {
        email: claims.email().to_string(),
    })
}

/// A verified session resolved to its persisted user row.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user: User,
}

impl AuthenticatedUser {
    pub fn user_id(&self) -> Uuid {
        self.user.id
    }
}

impl FromRequestParts<SharedState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        let identity = SessionIdentity::from_request_parts(parts, state).await?;

        let user = directory::resolve_user(&state.pool, &identity.email)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        Ok(AuthenticatedUser { user })
    }
}
