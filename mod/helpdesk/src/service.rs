use std::sync::Arc;

use base64::Engine;
use tracing::info;

use desk_blob::BlobStore;
use desk_core::{new_id, seq, Clock, ServiceError, Workflow};

use crate::model::{CreateTicketRequest, Ticket, TicketCategory, TicketStatus};
use crate::store::TicketStore;

/// Ticket lifecycle coordinator.
///
/// Orchestrates validation, attachment storage, ticket-number generation and
/// the status workflow against the store. All mutations go through here.
pub struct HelpdeskService {
    store: Arc<TicketStore>,
    blob: Arc<dyn BlobStore>,
    clock: Arc<dyn Clock>,
}

impl HelpdeskService {
    pub fn new(store: Arc<TicketStore>, blob: Arc<dyn BlobStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, blob, clock }
    }

    /// Access the underlying store.
    pub fn store(&self) -> &Arc<TicketStore> {
        &self.store
    }

    // =======================================================================
    // Create
    // =======================================================================

    /// Create a new ticket with status PENDING.
    ///
    /// Validation failures surface before any blob or store write.
    pub fn create_ticket(&self, req: CreateTicketRequest) -> Result<Ticket, ServiceError> {
        let requestor = required(req.requestor.as_deref(), "requestor")?;
        let category_str = required(req.category.as_deref(), "category")?;
        let request = required(req.request.as_deref(), "request")?;

        let category = TicketCategory::from_str(category_str).ok_or_else(|| {
            ServiceError::Validation(format!(
                "unknown category {category_str:?}, expected HARDWARE or SOFTWARE"
            ))
        })?;

        // Decode every attachment up front so a bad payload rejects the
        // whole submission before anything is stored.
        let mut decoded: Vec<(String, Vec<u8>)> = Vec::with_capacity(req.attachments.len());
        for upload in &req.attachments {
            let bytes = base64::engine::general_purpose::STANDARD
                .decode(&upload.content)
                .map_err(|e| {
                    ServiceError::Validation(format!(
                        "attachment {:?} is not valid base64: {e}",
                        upload.name
                    ))
                })?;
            decoded.push((upload.name.clone(), bytes));
        }

        let id = new_id();
        let mut attachments = Vec::with_capacity(decoded.len());
        for (name, bytes) in &decoded {
            let stored = self
                .blob
                .store_upload(&format!("attachments/{id}"), name, bytes)
                .map_err(|e| ServiceError::Upload(format!("storing {name:?}: {e}")))?;
            attachments.push(stored);
        }

        let ticket = Ticket {
            id,
            ticket_number: seq::ticket_number(),
            requestor: requestor.to_string(),
            category,
            request: request.to_string(),
            comments: req.comments.unwrap_or_default(),
            attachments,
            status: TicketStatus::Pending,
            created_at: self.clock.now().to_rfc3339(),
            closed_at: None,
        };

        if let Err(e) = self.store.create(&ticket) {
            // The insert failed, so nothing references the uploads; remove
            // them best-effort rather than leaving orphans behind.
            for name in &ticket.attachments {
                let _ = self.blob.delete(&format!("attachments/{}/{name}", ticket.id));
            }
            return Err(e);
        }
        info!(ticket = %ticket.ticket_number, requestor = %ticket.requestor, "ticket created");
        Ok(ticket)
    }

    // =======================================================================
    // Workflow
    // =======================================================================

    /// Transition a ticket to `target`, stamping `closed_at` when the target
    /// closes the ticket. The status and timestamp are written atomically.
    pub fn transition(&self, id: &str, target: &str) -> Result<Ticket, ServiceError> {
        let target = TicketStatus::from_str(target)
            .ok_or_else(|| ServiceError::Validation(format!("unknown status {target:?}")))?;

        // ARCHIVED has its own operation with its own rules.
        if target == TicketStatus::Archived {
            return Err(ServiceError::InvalidTransition(
                "use @archive to archive a ticket".into(),
            ));
        }

        let current = self.store.get(id)?;
        if !current.status.can_transition(target) {
            return Err(ServiceError::InvalidTransition(format!(
                "ticket {id}: {} -> {} not allowed",
                current.status, target
            )));
        }

        let mut updated = current.clone();
        updated.status = target;
        if target.closes_ticket() {
            updated.closed_at = Some(self.clock.now().to_rfc3339());
        }

        if !self.store.transition(&updated, current.status)? {
            // Someone got there first; report against the fresh state.
            let fresh = self.store.get(id)?;
            return Err(ServiceError::InvalidTransition(format!(
                "ticket {id}: {} -> {} not allowed (changed concurrently)",
                fresh.status, target
            )));
        }

        info!(ticket = %updated.ticket_number, status = %target, "ticket transitioned");
        Ok(updated)
    }

    /// Archive (soft-delete) a ticket.
    ///
    /// Refused with ARCHIVE_BLOCKED while the ticket is being worked
    /// (IN_PROGRESS or ON_HOLD); terminal tickets cannot be archived either.
    pub fn archive(&self, id: &str) -> Result<Ticket, ServiceError> {
        let current = self.store.get(id)?;

        match current.status {
            TicketStatus::InProgress | TicketStatus::OnHold => {
                return Err(ServiceError::ArchiveBlocked(format!(
                    "ticket {id} is {} and cannot be archived",
                    current.status
                )));
            }
            s if s.is_terminal() => {
                return Err(ServiceError::InvalidTransition(format!(
                    "ticket {id} is already {}",
                    current.status
                )));
            }
            _ => {}
        }

        let mut updated = current.clone();
        updated.status = TicketStatus::Archived;

        if !self.store.transition(&updated, current.status)? {
            let fresh = self.store.get(id)?;
            return Err(ServiceError::InvalidTransition(format!(
                "ticket {id} changed concurrently (now {})",
                fresh.status
            )));
        }

        info!(ticket = %updated.ticket_number, "ticket archived");
        Ok(updated)
    }

    // =======================================================================
    // Attachments
    // =======================================================================

    /// Fetch an attachment's bytes. The name must be one of the ticket's
    /// stored attachment references.
    pub fn attachment(&self, id: &str, name: &str) -> Result<Vec<u8>, ServiceError> {
        let ticket = self.store.get(id)?;
        if !ticket.attachments.iter().any(|a| a == name) {
            return Err(ServiceError::NotFound(format!(
                "ticket {id} has no attachment {name:?}"
            )));
        }

        let data = self
            .blob
            .get(&format!("attachments/{id}/{name}"))
            .map_err(|e| ServiceError::Upload(e.to_string()))?;

        data.ok_or_else(|| ServiceError::NotFound(format!("attachment {name:?} missing from blob store")))
    }
}

fn required<'a>(value: Option<&'a str>, field: &str) -> Result<&'a str, ServiceError> {
    match value {
        Some(s) if !s.trim().is_empty() => Ok(s),
        _ => Err(ServiceError::Validation(format!("missing required field '{field}'"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AttachmentUpload;
    use desk_blob::FileStore;
    use desk_core::clock::ManualClock;
    use desk_sql::SqliteStore;

    fn service() -> (tempfile::TempDir, Arc<ManualClock>, HelpdeskService) {
        let dir = tempfile::tempdir().unwrap();
        let db = Arc::new(SqliteStore::open_in_memory().unwrap());
        let blob = Arc::new(FileStore::open(dir.path()).unwrap());
        let clock = Arc::new(ManualClock::at(
            "2024-05-01T09:00:00Z".parse().unwrap(),
        ));
        let svc = HelpdeskService::new(
            Arc::new(TicketStore::new(db).unwrap()),
            blob,
            Arc::clone(&clock) as Arc<dyn Clock>,
        );
        (dir, clock, svc)
    }

    fn valid_request() -> CreateTicketRequest {
        CreateTicketRequest {
            requestor: Some("jdoe".into()),
            category: Some("HARDWARE".into()),
            request: Some("replace cracked screen".into()),
            comments: None,
            attachments: vec![],
        }
    }

    #[test]
    fn create_assigns_number_and_pending() {
        let (_d, _c, svc) = service();
        let t = svc.create_ticket(valid_request()).unwrap();
        assert!(t.ticket_number.starts_with("TKT-"));
        assert_eq!(t.status, TicketStatus::Pending);
        assert!(t.closed_at.is_none());
    }

    #[test]
    fn create_missing_field_is_validation_error() {
        let (_d, _c, svc) = service();
        for missing in ["requestor", "category", "request"] {
            let mut req = valid_request();
            match missing {
                "requestor" => req.requestor = None,
                "category" => req.category = Some("  ".into()),
                _ => req.request = None,
            }
            let err = svc.create_ticket(req).unwrap_err();
            assert!(matches!(err, ServiceError::Validation(_)), "{missing}: {err:?}");
        }
        // Nothing was written.
        let all = svc.store().list(&Default::default()).unwrap();
        assert_eq!(all.total, 0);
    }

    #[test]
    fn create_stores_attachments() {
        let (_d, _c, svc) = service();
        let mut req = valid_request();
        req.attachments = vec![AttachmentUpload {
            name: "photo.jpg".into(),
            content: base64::engine::general_purpose::STANDARD.encode(b"jpegdata"),
        }];
        let t = svc.create_ticket(req).unwrap();
        assert_eq!(t.attachments.len(), 1);
        assert!(t.attachments[0].ends_with("-photo.jpg"));

        let bytes = svc.attachment(&t.id, &t.attachments[0]).unwrap();
        assert_eq!(bytes, b"jpegdata");
    }

    #[test]
    fn failed_insert_cleans_up_uploads() {
        use desk_sql::SQLStore;

        fn file_count(p: &std::path::Path) -> usize {
            if !p.exists() {
                return 0;
            }
            std::fs::read_dir(p)
                .unwrap()
                .map(|e| {
                    let path = e.unwrap().path();
                    if path.is_dir() { file_count(&path) } else { 1 }
                })
                .sum()
        }

        let dir = tempfile::tempdir().unwrap();
        let db = Arc::new(SqliteStore::open_in_memory().unwrap());
        let blob = Arc::new(FileStore::open(dir.path()).unwrap());
        let clock = Arc::new(ManualClock::at("2024-05-01T09:00:00Z".parse().unwrap()));
        let svc = HelpdeskService::new(
            Arc::new(TicketStore::new(Arc::clone(&db) as Arc<dyn SQLStore>).unwrap()),
            blob,
            clock,
        );

        // Break the table out from under the service so the insert fails
        // after the attachment upload.
        db.exec("DROP TABLE tickets", &[]).unwrap();

        let mut req = valid_request();
        req.attachments = vec![AttachmentUpload {
            name: "photo.jpg".into(),
            content: base64::engine::general_purpose::STANDARD.encode(b"jpegdata"),
        }];
        assert!(matches!(
            svc.create_ticket(req).unwrap_err(),
            ServiceError::Storage(_)
        ));

        assert_eq!(file_count(&dir.path().join("attachments")), 0);
    }

    #[test]
    fn bad_base64_rejects_whole_submission() {
        let (_d, _c, svc) = service();
        let mut req = valid_request();
        req.attachments = vec![AttachmentUpload {
            name: "photo.jpg".into(),
            content: "!!! not base64 !!!".into(),
        }];
        assert!(matches!(
            svc.create_ticket(req).unwrap_err(),
            ServiceError::Validation(_)
        ));
        assert_eq!(svc.store().list(&Default::default()).unwrap().total, 0);
    }

    #[test]
    fn complete_sets_closed_at() {
        let (_d, clock, svc) = service();
        let t = svc.create_ticket(valid_request()).unwrap();
        svc.transition(&t.id, "IN_PROGRESS").unwrap();

        clock.advance_secs(3600);
        let done = svc.transition(&t.id, "COMPLETED").unwrap();
        assert_eq!(done.status, TicketStatus::Completed);
        let closed_at = done.closed_at.unwrap();
        assert!(closed_at.starts_with("2024-05-01T10:00:00"));
    }

    #[test]
    fn invalid_transition_leaves_state_unchanged() {
        let (_d, _c, svc) = service();
        let t = svc.create_ticket(valid_request()).unwrap();
        svc.transition(&t.id, "IN_PROGRESS").unwrap();
        svc.transition(&t.id, "COMPLETED").unwrap();

        let err = svc.transition(&t.id, "IN_PROGRESS").unwrap_err();
        assert!(matches!(err, ServiceError::InvalidTransition(_)));

        let fresh = svc.store().get(&t.id).unwrap();
        assert_eq!(fresh.status, TicketStatus::Completed);
        assert!(fresh.closed_at.is_some());
    }

    #[test]
    fn completed_directly_from_pending_sets_closed_at() {
        let (_d, clock, svc) = service();
        let t = svc.create_ticket(valid_request()).unwrap();

        clock.advance_secs(300);
        let done = svc.transition(&t.id, "COMPLETED").unwrap();
        assert_eq!(done.status, TicketStatus::Completed);
        assert!(done.closed_at.unwrap().starts_with("2024-05-01T09:05:00"));
    }

    #[test]
    fn rejected_sets_closed_at_from_pending() {
        let (_d, _c, svc) = service();
        let t = svc.create_ticket(valid_request()).unwrap();
        let rejected = svc.transition(&t.id, "REJECTED").unwrap();
        assert!(rejected.closed_at.is_some());
    }

    #[test]
    fn archive_blocked_while_worked() {
        let (_d, _c, svc) = service();
        let t = svc.create_ticket(valid_request()).unwrap();
        svc.transition(&t.id, "IN_PROGRESS").unwrap();

        let err = svc.archive(&t.id).unwrap_err();
        assert!(matches!(err, ServiceError::ArchiveBlocked(_)));
        assert_eq!(
            svc.store().get(&t.id).unwrap().status,
            TicketStatus::InProgress
        );

        svc.transition(&t.id, "ON_HOLD").unwrap();
        let err = svc.archive(&t.id).unwrap_err();
        assert!(matches!(err, ServiceError::ArchiveBlocked(_)));
    }

    #[test]
    fn archive_pending_ticket() {
        let (_d, _c, svc) = service();
        let t = svc.create_ticket(valid_request()).unwrap();
        let archived = svc.archive(&t.id).unwrap();
        assert_eq!(archived.status, TicketStatus::Archived);
        assert!(archived.closed_at.is_none());

        // Terminal now — cannot archive again.
        assert!(matches!(
            svc.archive(&t.id).unwrap_err(),
            ServiceError::InvalidTransition(_)
        ));
    }

    #[test]
    fn archived_is_not_a_plain_transition_target() {
        let (_d, _c, svc) = service();
        let t = svc.create_ticket(valid_request()).unwrap();
        assert!(matches!(
            svc.transition(&t.id, "ARCHIVED").unwrap_err(),
            ServiceError::InvalidTransition(_)
        ));
    }
}
