use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Extension, Json, Router};

use desk_core::{Actor, ServiceError};

use crate::model::{CreateRequestBody, RequestListQuery, SignupRequest, TransitionRequest};
use crate::service::SignupService;

type ServiceState = Arc<SignupService>;

pub fn router(service: Arc<SignupService>) -> Router {
    Router::new()
        .route("/requests", post(create_request).get(list_requests))
        .route("/requests/{id}", get(get_request))
        .route("/requests/{id}/@transition", post(transition_request))
        .with_state(service)
}

// ---------------------------------------------------------------------------
// POST /requests (public submission)
// ---------------------------------------------------------------------------

async fn create_request(
    State(svc): State<ServiceState>,
    Json(body): Json<CreateRequestBody>,
) -> Result<Json<SignupRequest>, ServiceError> {
    let request = svc.create_request(body)?;
    Ok(Json(request))
}

// ---------------------------------------------------------------------------
// GET /requests
// ---------------------------------------------------------------------------

async fn list_requests(
    State(svc): State<ServiceState>,
    actor: Option<Extension<Actor>>,
    Query(query): Query<RequestListQuery>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    require_admin(&actor)?;
    let result = svc.store().list(&query)?;
    Ok(Json(serde_json::json!({
        "items": result.items,
        "total": result.total,
    })))
}

// ---------------------------------------------------------------------------
// GET /requests/:id
// ---------------------------------------------------------------------------

async fn get_request(
    State(svc): State<ServiceState>,
    actor: Option<Extension<Actor>>,
    Path(id): Path<String>,
) -> Result<Json<SignupRequest>, ServiceError> {
    require_admin(&actor)?;
    let request = svc.store().get(&id)?;
    Ok(Json(request))
}

// ---------------------------------------------------------------------------
// POST /requests/:id/@transition
// ---------------------------------------------------------------------------

async fn transition_request(
    State(svc): State<ServiceState>,
    Path(id): Path<String>,
    actor: Option<Extension<Actor>>,
    Json(req): Json<TransitionRequest>,
) -> Result<Json<SignupRequest>, ServiceError> {
    require_admin(&actor)?;
    let request = svc.transition(&id, &req.status, req.notes)?;
    Ok(Json(request))
}

fn require_admin(actor: &Option<Extension<Actor>>) -> Result<(), ServiceError> {
    match actor {
        Some(Extension(a)) if a.is_admin() => Ok(()),
        Some(Extension(a)) => Err(ServiceError::PermissionDenied(format!(
            "{} may not manage signup requests",
            a.principal
        ))),
        None => Err(ServiceError::Unauthorized("missing session".into())),
    }
}
