mod session;

use std::sync::Arc;

use axum::Router;

use crate::service::AuthService;

/// Build the complete auth module router.
///
/// Routes:
/// - `POST /login` — verify credentials and issue a session token (public)
/// - `GET  /me`    — describe the authenticated caller
pub fn router(service: Arc<AuthService>) -> Router {
    session::router(service)
}
