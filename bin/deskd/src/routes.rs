//! Route registration — module routes plus system endpoints.

use std::sync::Arc;

use axum::middleware;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;

use crate::auth_middleware::{self, JwtState};

/// Build the complete router.
///
/// Each module's routes are nested under `/{module_name}`; the JWT
/// middleware wraps everything, letting public paths through.
pub fn build_router(jwt_state: Arc<JwtState>, module_routes: Vec<(&str, Router)>) -> Router {
    let mut app = Router::new()
        .route("/health", get(health))
        .route("/version", get(version));

    for (name, router) in module_routes {
        app = app.nest(&format!("/{name}"), router);
    }

    app.layer(middleware::from_fn_with_state(
        jwt_state,
        auth_middleware::auth_middleware,
    ))
}

async fn health() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "status": "ok",
    }))
}

async fn version() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "name": "deskd",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
