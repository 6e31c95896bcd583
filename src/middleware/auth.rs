use crate::{
    config::jwt::JwtConfig,
    error::{AppError, AppResult},
    utils::{
        cookie::{extract_cookie, SESSION_COOKIE},
        jwt::decode_session_token,
    },
};
use axum::{
    extract::{FromRequestParts, Request},
    http::HeaderMap,
    middleware::Next,
    response::Response,
    Extension,
};

/// Verified identity claims attached to the request by `auth_middleware`.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i32,
    pub email: String,
    pub role: String,
}

/// Session authentication middleware.
///
/// Reads the session token from the `token` cookie (falling back to an
/// `Authorization: Bearer` header), verifies it, and attaches the claims to
/// the request extensions. Missing, malformed, tampered and expired tokens
/// are indistinguishable to the caller: all answer 401.
pub async fn auth_middleware(
    Extension(jwt_config): Extension<JwtConfig>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_cookie(&headers, SESSION_COOKIE)
        .or_else(|| extract_bearer_token(&headers))
        .ok_or(AppError::Unauthorized)?;

    let claims =
        decode_session_token(&jwt_config, &token).map_err(|_| AppError::Unauthorized)?;

    let user_id: i32 = claims.sub.parse().map_err(|_| AppError::Unauthorized)?;

    let auth_user = AuthUser {
        user_id,
        email: claims.email,
        role: claims.role,
    };
    request.extensions_mut().insert(auth_user);

    Ok(next.run(request).await)
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let auth_header = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())?;

    let token = auth_header.strip_prefix("Bearer ")?;
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

/// Pure role-set authorization: does the claimed role appear in the allowed
/// set? No request state, no I/O.
pub fn role_allowed(role: &str, allowed: &[&str]) -> bool {
    allowed.contains(&role)
}

/// Handler-level guard for role-restricted endpoints; runs after the
/// middleware has already verified the token.
pub fn require_role(auth_user: &AuthUser, allowed: &[&str]) -> AppResult<()> {
    if role_allowed(&auth_user.role, allowed) {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(AppError::Unauthorized)
    }
}
