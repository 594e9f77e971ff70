use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};

use desk_core::{Actor, ServiceError};

use crate::model::{CreateTicketRequest, Ticket, TicketListQuery, TransitionRequest};
use crate::service::HelpdeskService;

type ServiceState = Arc<HelpdeskService>;

pub fn router(service: Arc<HelpdeskService>) -> Router {
    Router::new()
        .route("/tickets", post(create_ticket).get(list_tickets))
        .route("/tickets/{id}", get(get_ticket))
        .route("/tickets/{id}/@transition", post(transition_ticket))
        .route("/tickets/{id}/@archive", post(archive_ticket))
        .route("/tickets/{id}/attachments/{name}", get(get_attachment))
        .with_state(service)
}

// ---------------------------------------------------------------------------
// POST /tickets
// ---------------------------------------------------------------------------

async fn create_ticket(
    State(svc): State<ServiceState>,
    Json(req): Json<CreateTicketRequest>,
) -> Result<Json<Ticket>, ServiceError> {
    let ticket = svc.create_ticket(req)?;
    Ok(Json(ticket))
}

// ---------------------------------------------------------------------------
// GET /tickets
// ---------------------------------------------------------------------------

async fn list_tickets(
    State(svc): State<ServiceState>,
    Query(query): Query<TicketListQuery>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let result = svc.store().list(&query)?;
    Ok(Json(serde_json::json!({
        "items": result.items,
        "total": result.total,
    })))
}

// ---------------------------------------------------------------------------
// GET /tickets/:id
// ---------------------------------------------------------------------------

async fn get_ticket(
    State(svc): State<ServiceState>,
    Path(id): Path<String>,
) -> Result<Json<Ticket>, ServiceError> {
    let ticket = svc.store().get(&id)?;
    Ok(Json(ticket))
}

// ---------------------------------------------------------------------------
// POST /tickets/:id/@transition
// ---------------------------------------------------------------------------

async fn transition_ticket(
    State(svc): State<ServiceState>,
    Path(id): Path<String>,
    actor: Option<Extension<Actor>>,
    Json(req): Json<TransitionRequest>,
) -> Result<Json<Ticket>, ServiceError> {
    require_admin(&actor)?;
    let ticket = svc.transition(&id, &req.status)?;
    Ok(Json(ticket))
}

// ---------------------------------------------------------------------------
// POST /tickets/:id/@archive
// ---------------------------------------------------------------------------

async fn archive_ticket(
    State(svc): State<ServiceState>,
    Path(id): Path<String>,
    actor: Option<Extension<Actor>>,
) -> Result<Json<Ticket>, ServiceError> {
    require_admin(&actor)?;
    let ticket = svc.archive(&id)?;
    Ok(Json(ticket))
}

// ---------------------------------------------------------------------------
// GET /tickets/:id/attachments/:name
// ---------------------------------------------------------------------------

async fn get_attachment(
    State(svc): State<ServiceState>,
    Path((id, name)): Path<(String, String)>,
) -> Result<impl IntoResponse, ServiceError> {
    let bytes = svc.attachment(&id, &name)?;
    Ok((
        [(header::CONTENT_TYPE, "application/octet-stream")],
        bytes,
    ))
}

fn require_admin(actor: &Option<Extension<Actor>>) -> Result<(), ServiceError> {
    match actor {
        Some(Extension(a)) if a.is_admin() => Ok(()),
        Some(Extension(a)) => Err(ServiceError::PermissionDenied(format!(
            "{} may not manage tickets",
            a.principal
        ))),
        None => Err(ServiceError::Unauthorized("missing session".into())),
    }
}
