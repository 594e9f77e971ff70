pub mod api;
pub mod model;
pub mod sequence;
pub mod service;
pub mod store;

use std::sync::Arc;

use axum::Router;
use desk_core::{Clock, Module};
use desk_sql::SQLStore;

use service::DispatchService;
use store::BatchStore;

/// The Dispatch module — device-delivery batches.
///
/// Administrators create batches of devices bound for a school; the school
/// confirms receipt. Batch numbers are strictly sequential per calendar day.
pub struct DispatchModule {
    service: Arc<DispatchService>,
}

impl DispatchModule {
    /// Create the dispatch module and initialise storage.
    pub fn new(
        db: Arc<dyn SQLStore>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, desk_core::ServiceError> {
        let store = Arc::new(BatchStore::new(db)?);
        let service = Arc::new(DispatchService::new(store, clock));
        Ok(Self { service })
    }

    /// Get a reference to the service for programmatic use.
    pub fn service(&self) -> &Arc<DispatchService> {
        &self.service
    }
}

impl Module for DispatchModule {
    fn name(&self) -> &str {
        "dispatch"
    }

    fn routes(&self) -> Router {
        api::router(Arc::clone(&self.service))
    }
}
