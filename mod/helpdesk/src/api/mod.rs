mod tickets;

use std::sync::Arc;

use axum::Router;

use crate::service::HelpdeskService;

/// Build the complete helpdesk module router.
///
/// Routes:
/// - `POST /tickets`                          — create ticket (staff)
/// - `GET  /tickets`                          — list tickets
/// - `GET  /tickets/:id`                      — get ticket
/// - `POST /tickets/:id/@transition`          — status transition (admin)
/// - `POST /tickets/:id/@archive`             — archive (admin)
/// - `GET  /tickets/:id/attachments/:name`    — download attachment
pub fn router(service: Arc<HelpdeskService>) -> Router {
    tickets::router(service)
}
