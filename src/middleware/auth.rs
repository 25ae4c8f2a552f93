use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::state::AppState;

/// The authenticated caller, inserted into request extensions by
/// `auth_middleware` and read back by handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser(pub i64);

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User id, rendered as a string.
    pub sub: String,
    /// Expiration (unix timestamp).
    pub exp: i64,
}

/// Validate an HS256 token and extract its claims.
pub fn verify_jwt(token: &str, secret: &str) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::Unauthorized)
}

/// Mint a token for a user id. Real issuance lives in the authentication
/// service; this exists only so tests can produce verifiable tokens.
#[cfg(test)]
pub(crate) fn issue_jwt(user_id: i64, secret: &str, ttl_secs: i64) -> Result<String, AppError> {
    use jsonwebtoken::{encode, EncodingKey, Header};

    let claims = Claims {
        sub: user_id.to_string(),
        exp: chrono::Utc::now().timestamp() + ttl_secs,
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Config(format!("failed to sign token: {e}")))
}

pub fn user_id_from_claims(claims: &Claims) -> Result<i64, AppError> {
    claims
        .sub
        .parse::<i64>()
        .map_err(|_| AppError::BadRequest("invalid user id in token".into()))
}

/// Extract the bearer token, verify it, and stash the caller's id in the
/// request extensions.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(AppError::Unauthorized)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(AppError::Unauthorized)?;

    let claims = verify_jwt(token, &state.config.jwt_secret)?;
    let user_id = user_id_from_claims(&claims)?;

    req.extensions_mut().insert(AuthUser(user_id));
    Ok(next.run(req).await)
}
