pub mod api;
pub mod model;
pub mod service;
pub mod store;

use std::sync::Arc;

use axum::Router;
use desk_core::{Clock, Module};
use desk_sql::SQLStore;

use service::SignupService;
use store::RequestStore;

/// The Signup module — public account and credential-reset requests.
///
/// Anyone can submit a request; administrators disposition them through the
/// request status workflow. Requests are never deleted.
pub struct SignupModule {
    service: Arc<SignupService>,
}

impl SignupModule {
    /// Create the signup module and initialise storage.
    pub fn new(
        db: Arc<dyn SQLStore>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, desk_core::ServiceError> {
        let store = Arc::new(RequestStore::new(db)?);
        let service = Arc::new(SignupService::new(store, clock));
        Ok(Self { service })
    }

    /// Get a reference to the service for programmatic use.
    pub fn service(&self) -> &Arc<SignupService> {
        &self.service
    }
}

impl Module for SignupModule {
    fn name(&self) -> &str {
        "signup"
    }

    fn routes(&self) -> Router {
        api::router(Arc::clone(&self.service))
    }
}
