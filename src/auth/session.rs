use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Cookie carrying the session token minted by the sign-in flow.
pub const SESSION_COOKIE: &str = "session_token";

/// Sessions last thirty days, matching the identity provider's default.
const SESSION_TTL_DAYS: i64 = 30;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Email asserted by the identity provider.
    pub sub: String,
    pub exp: i64,
}

impl Claims {
    pub fn new(email: &str) -> Self {
        Self {
            sub: email.to_string(),
            exp: (Utc::now() + Duration::days(SESSION_TTL_DAYS)).timestamp(),
        }
    }

    pub fn email(&self) -> &str {
        &self.sub
    }
}

pub fn issue_token(claims: &Claims, secret: &str) -> Result<String, String> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| format!("Session encode failed: {e}"))
}

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, String> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| format!("Session decode failed: {e}"))
}
