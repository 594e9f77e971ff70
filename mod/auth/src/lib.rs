pub mod api;
pub mod model;
pub mod password;
pub mod service;
pub mod store;
pub mod throttle;

use std::sync::Arc;

use axum::Router;
use desk_core::{Clock, Module};
use desk_sql::SQLStore;

use service::AuthService;
use store::UserStore;

pub use service::TokenConfig;

/// The Auth module — login accounts and session tokens.
///
/// Verifies credentials with a per-username failure throttle and issues
/// JWT session tokens that the server middleware turns into an [`Actor`]
/// for the other modules.
///
/// [`Actor`]: desk_core::Actor
pub struct AuthModule {
    service: Arc<AuthService>,
}

impl AuthModule {
    /// Create the auth module and initialise storage.
    pub fn new(
        db: Arc<dyn SQLStore>,
        clock: Arc<dyn Clock>,
        token: TokenConfig,
    ) -> Result<Self, desk_core::ServiceError> {
        let store = Arc::new(UserStore::new(db)?);
        let service = Arc::new(AuthService::new(store, clock, token));
        Ok(Self { service })
    }

    /// Get a reference to the service for programmatic use.
    pub fn service(&self) -> &Arc<AuthService> {
        &self.service
    }
}

impl Module for AuthModule {
    fn name(&self) -> &str {
        "auth"
    }

    fn routes(&self) -> Router {
        api::router(Arc::clone(&self.service))
    }
}
