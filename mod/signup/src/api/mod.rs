mod requests;

use std::sync::Arc;

use axum::Router;

use crate::service::SignupService;

/// Build the complete signup module router.
///
/// Routes:
/// - `POST /requests`                 — submit request (public)
/// - `GET  /requests`                 — list requests (admin)
/// - `GET  /requests/:id`             — get request (admin)
/// - `POST /requests/:id/@transition` — status transition (admin)
pub fn router(service: Arc<SignupService>) -> Router {
    requests::router(service)
}
