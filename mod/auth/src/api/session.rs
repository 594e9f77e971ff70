use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};

use desk_core::{Actor, ServiceError};

use crate::model::{LoginRequest, LoginResponse};
use crate::service::AuthService;

type ServiceState = Arc<AuthService>;

pub fn router(service: Arc<AuthService>) -> Router {
    Router::new()
        .route("/login", post(login))
        .route("/me", get(me))
        .with_state(service)
}

// ---------------------------------------------------------------------------
// POST /login
// ---------------------------------------------------------------------------

async fn login(
    State(svc): State<ServiceState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ServiceError> {
    let resp = svc.authenticate(req)?;
    Ok(Json(resp))
}

// ---------------------------------------------------------------------------
// GET /me
// ---------------------------------------------------------------------------

async fn me(
    actor: Option<Extension<Actor>>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let Some(Extension(actor)) = actor else {
        return Err(ServiceError::Unauthorized("missing session".into()));
    };
    Ok(Json(serde_json::json!({
        "username": actor.principal,
        "role": actor.role.as_str(),
        "schoolCode": actor.school_code,
    })))
}
