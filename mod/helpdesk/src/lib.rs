pub mod api;
pub mod model;
pub mod service;
pub mod store;

use std::sync::Arc;

use axum::Router;
use desk_blob::BlobStore;
use desk_core::{Clock, Module};
use desk_sql::SQLStore;

use service::HelpdeskService;
use store::TicketStore;

/// The Helpdesk module — IT support tickets.
///
/// Staff submit hardware/software requests with optional attachments;
/// administrators work them through the ticket status workflow.
pub struct HelpdeskModule {
    service: Arc<HelpdeskService>,
}

impl HelpdeskModule {
    /// Create the helpdesk module and initialise storage.
    pub fn new(
        db: Arc<dyn SQLStore>,
        blob: Arc<dyn BlobStore>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, desk_core::ServiceError> {
        let store = Arc::new(TicketStore::new(db)?);
        let service = Arc::new(HelpdeskService::new(store, blob, clock));
        Ok(Self { service })
    }

    /// Get a reference to the service for programmatic use.
    pub fn service(&self) -> &Arc<HelpdeskService> {
        &self.service
    }
}

impl Module for HelpdeskModule {
    fn name(&self) -> &str {
        "helpdesk"
    }

    fn routes(&self) -> Router {
        api::router(Arc::clone(&self.service))
    }
}
