use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Extension, Json, Router};

use desk_core::{Actor, ServiceError};

use crate::model::{Batch, BatchListQuery, CreateBatchRequest};
use crate::service::DispatchService;

type ServiceState = Arc<DispatchService>;

pub fn router(service: Arc<DispatchService>) -> Router {
    Router::new()
        .route("/batches", post(create_batch).get(list_batches))
        .route("/batches/{id}", get(get_batch))
        .route("/batches/{id}/@receive", post(receive_batch))
        .with_state(service)
}

// ---------------------------------------------------------------------------
// POST /batches
// ---------------------------------------------------------------------------

async fn create_batch(
    State(svc): State<ServiceState>,
    actor: Option<Extension<Actor>>,
    Json(req): Json<CreateBatchRequest>,
) -> Result<Json<Batch>, ServiceError> {
    let actor = require_actor(&actor)?;
    if !actor.is_admin() {
        return Err(ServiceError::PermissionDenied(format!(
            "{} may not create batches",
            actor.principal
        )));
    }
    let batch = svc.create_batch(req)?;
    Ok(Json(batch))
}

// ---------------------------------------------------------------------------
// GET /batches
// ---------------------------------------------------------------------------

async fn list_batches(
    State(svc): State<ServiceState>,
    Query(query): Query<BatchListQuery>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let result = svc.store().list(&query)?;
    Ok(Json(serde_json::json!({
        "items": result.items,
        "total": result.total,
    })))
}

// ---------------------------------------------------------------------------
// GET /batches/:id
// ---------------------------------------------------------------------------

async fn get_batch(
    State(svc): State<ServiceState>,
    Path(id): Path<String>,
) -> Result<Json<Batch>, ServiceError> {
    let batch = svc.store().get(&id)?;
    Ok(Json(batch))
}

// ---------------------------------------------------------------------------
// POST /batches/:id/@receive
// ---------------------------------------------------------------------------

async fn receive_batch(
    State(svc): State<ServiceState>,
    Path(id): Path<String>,
    actor: Option<Extension<Actor>>,
) -> Result<Json<Batch>, ServiceError> {
    let actor = require_actor(&actor)?;
    let batch = svc.receive_batch(&id, actor)?;
    Ok(Json(batch))
}

fn require_actor<'a>(actor: &'a Option<Extension<Actor>>) -> Result<&'a Actor, ServiceError> {
    match actor {
        Some(Extension(a)) => Ok(a),
        None => Err(ServiceError::Unauthorized("missing session".into())),
    }
}
