mod batches;

use std::sync::Arc;

use axum::Router;

use crate::service::DispatchService;

/// Build the complete dispatch module router.
///
/// Routes:
/// - `POST /batches`              — create batch (admin)
/// - `GET  /batches`              — list batches
/// - `GET  /batches/:id`          — get batch
/// - `POST /batches/:id/@receive` — confirm receipt (owning school/admin)
pub fn router(service: Arc<DispatchService>) -> Router {
    batches::router(service)
}
