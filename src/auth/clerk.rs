//! Authenticated user extraction for the submission endpoint only (§4.8,
//! §4.3 capability-token rule, §9 Open Question 4). Streaming, conversation,
//! and polling endpoints are deliberately unguarded: the generation ID
//! itself is the capability token. Grounded on the teacher's
//! `auth::clerk::ClerkAuth`, generalized so the core's `UserContext` isn't
//! hard-wired to Clerk specifically.

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

/// Authenticated caller identity (§4.8). This is the only piece of the
/// out-of-scope user/auth system the core actually consumes: `user_id`
/// governs the scratch directory layout (§6.4).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserContext {
    pub user_id: String,
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AuthClaims {
    sub: String,
    email: Option<String>,
    #[allow(dead_code)]
    exp: usize,
    #[allow(dead_code)]
    iat: usize,
}

/// Extractor wired in front of `POST /api/generate` only (§4.8).
pub struct AuthenticatedCaller(pub UserContext);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthenticatedCaller
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .ok_or(AuthError::MissingToken)?;

        let token = auth_header.strip_prefix("Bearer ").ok_or(AuthError::InvalidToken)?;

        if cfg!(debug_assertions) && token == "dev-token" {
            return Ok(AuthenticatedCaller(UserContext {
                user_id: "dev-user".to_string(),
                email: Some("dev@example.com".to_string()),
            }));
        }

        let public_key = std::env::var("AUTH_PUBLIC_KEY").map_err(|_| AuthError::ConfigError)?;

        let token_data = decode::<AuthClaims>(
            token,
            &DecodingKey::from_rsa_pem(public_key.as_bytes()).map_err(|_| AuthError::InvalidKey)?,
            &Validation::new(Algorithm::RS256),
        )
        .map_err(|_| AuthError::InvalidToken)?;

        Ok(AuthenticatedCaller(UserContext {
            user_id: token_data.claims.sub,
            email: token_data.claims.email,
        }))
    }
}

#[derive(Debug)]
pub enum AuthError {
    MissingToken,
    InvalidToken,
    InvalidKey,
    ConfigError,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::MissingToken => (StatusCode::UNAUTHORIZED, "missing authorization token"),
            AuthError::InvalidToken => (StatusCode::UNAUTHORIZED, "invalid token"),
            AuthError::InvalidKey => (StatusCode::INTERNAL_SERVER_ERROR, "key configuration error"),
            AuthError::ConfigError => (StatusCode::INTERNAL_SERVER_ERROR, "server configuration error"),
        };

        (status, message).into_response()
    }
}
