//! JWT authentication middleware.
//!
//! Extracts `Authorization: Bearer <token>`, validates it and stores an
//! [`Actor`] in request extensions for module handlers. Public endpoints
//! pass through without a token.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::Method;
use axum::middleware::Next;
use axum::response::Response;
use jsonwebtoken::{DecodingKey, Validation};

use auth::model::Claims;
use desk_core::{Actor, Role, ServiceError};

/// Shared JWT configuration for the middleware.
pub struct JwtState {
    pub decoding_key: DecodingKey,
    pub validation: Validation,
}

/// Validate the bearer token and inject the caller's [`Actor`].
///
/// Requests to public paths pass through untouched; everything else
/// requires a valid token.
pub async fn auth_middleware(
    State(jwt_state): State<Arc<JwtState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ServiceError> {
    let path = request.uri().path().to_string();

    if is_public(&path, request.method()) {
        return Ok(next.run(request).await);
    }

    let token = request
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| ServiceError::Unauthorized("missing authorization token".into()))?;

    let token_data =
        jsonwebtoken::decode::<Claims>(token, &jwt_state.decoding_key, &jwt_state.validation)
            .map_err(|e| ServiceError::Unauthorized(format!("invalid token: {e}")))?;

    let actor = claims_to_actor(&token_data.claims)?;
    request.extensions_mut().insert(actor);

    Ok(next.run(request).await)
}

fn claims_to_actor(claims: &Claims) -> Result<Actor, ServiceError> {
    let role = Role::from_str(&claims.role)
        .ok_or_else(|| ServiceError::Unauthorized(format!("unknown role {:?}", claims.role)))?;
    Ok(Actor {
        principal: claims.sub.clone(),
        role,
        school_code: claims.school_code.clone(),
    })
}

/// Endpoints reachable without a session token.
///
/// Signup submission is public by design; reading or managing requests
/// is not.
fn is_public(path: &str, method: &Method) -> bool {
    matches!(path, "/health" | "/version" | "/auth/login")
        || (path == "/signup/requests" && method == Method::POST)
}
