use std::sync::Arc;

use tracing::info;

use desk_core::{new_id, seq, Clock, ServiceError, Workflow};

use crate::model::{CreateRequestBody, RequestKind, RequestStatus, SignupRequest};
use crate::store::RequestStore;

/// Account/reset request coordinator.
///
/// Validates public submissions, assigns request numbers and drives the
/// request workflow against the store.
pub struct SignupService {
    store: Arc<RequestStore>,
    clock: Arc<dyn Clock>,
}

impl SignupService {
    pub fn new(store: Arc<RequestStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Access the underlying store.
    pub fn store(&self) -> &Arc<RequestStore> {
        &self.store
    }

    // =======================================================================
    // Create
    // =======================================================================

    /// Accept a public submission with status PENDING.
    pub fn create_request(&self, body: CreateRequestBody) -> Result<SignupRequest, ServiceError> {
        let kind_str = required(body.kind.as_deref(), "kind")?;
        let applicant_name = required(body.applicant_name.as_deref(), "applicantName")?;
        let email = required(body.email.as_deref(), "email")?;

        let kind = RequestKind::from_str(kind_str).ok_or_else(|| {
            ServiceError::Validation(format!(
                "unknown kind {kind_str:?}, expected ACCOUNT or RESET"
            ))
        })?;

        if !email.contains('@') {
            return Err(ServiceError::Validation(format!(
                "email {email:?} is not a valid address"
            )));
        }

        let request = SignupRequest {
            id: new_id(),
            request_number: seq::request_number(kind.seq_kind()),
            kind,
            applicant_name: applicant_name.to_string(),
            email: email.to_string(),
            school_name: body.school_name.filter(|s| !s.trim().is_empty()),
            details: body.details.filter(|s| !s.trim().is_empty()),
            status: RequestStatus::Pending,
            notes: None,
            created_at: self.clock.now().to_rfc3339(),
            completed_at: None,
        };

        self.store.create(&request)?;
        info!(request = %request.request_number, kind = %kind.as_str(), "request submitted");
        Ok(request)
    }

    // =======================================================================
    // Workflow
    // =======================================================================

    /// Transition a request to `target`, optionally attaching notes and
    /// stamping `completed_at` when the target is COMPLETED.
    pub fn transition(
        &self,
        id: &str,
        target: &str,
        notes: Option<String>,
    ) -> Result<SignupRequest, ServiceError> {
        let target = RequestStatus::from_str(target)
            .ok_or_else(|| ServiceError::Validation(format!("unknown status {target:?}")))?;

        let current = self.store.get(id)?;
        if !current.status.can_transition(target) {
            return Err(ServiceError::InvalidTransition(format!(
                "request {id}: {} -> {} not allowed",
                current.status, target
            )));
        }

        let mut updated = current.clone();
        updated.status = target;
        if let Some(n) = notes.filter(|n| !n.trim().is_empty()) {
            updated.notes = Some(n);
        }
        if target == RequestStatus::Completed {
            updated.completed_at = Some(self.clock.now().to_rfc3339());
        }

        if !self.store.transition(&updated, current.status)? {
            let fresh = self.store.get(id)?;
            return Err(ServiceError::InvalidTransition(format!(
                "request {id}: {} -> {} not allowed (changed concurrently)",
                fresh.status, target
            )));
        }

        info!(request = %updated.request_number, status = %target, "request transitioned");
        Ok(updated)
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
    use desk_core::clock::ManualClock;
    use desk_sql::SqliteStore;

    fn service() -> (Arc<ManualClock>, SignupService) {
        let db = Arc::new(SqliteStore::open_in_memory().unwrap());
        let clock = Arc::new(ManualClock::at("2024-05-01T09:00:00Z".parse().unwrap()));
        let svc = SignupService::new(
            Arc::new(RequestStore::new(db).unwrap()),
            Arc::clone(&clock) as Arc<dyn Clock>,
        );
        (clock, svc)
    }

    fn valid_body() -> CreateRequestBody {
        CreateRequestBody {
            kind: Some("ACCOUNT".into()),
            applicant_name: Some("Dana Smith".into()),
            email: Some("dana@example.org".into()),
            school_name: Some("Lincoln High School".into()),
            details: Some("new hire, starts Monday".into()),
        }
    }

    #[test]
    fn create_assigns_prefixed_number() {
        let (_c, svc) = service();
        let r = svc.create_request(valid_body()).unwrap();
        assert!(r.request_number.starts_with("REQ-"));
        assert_eq!(r.status, RequestStatus::Pending);

        let mut body = valid_body();
        body.kind = Some("RESET".into());
        let r = svc.create_request(body).unwrap();
        assert!(r.request_number.starts_with("RST-"));
    }

    #[test]
    fn create_missing_field_is_validation_error() {
        let (_c, svc) = service();
        for missing in ["kind", "applicantName", "email"] {
            let mut body = valid_body();
            match missing {
                "kind" => body.kind = None,
                "applicantName" => body.applicant_name = Some("  ".into()),
                _ => body.email = None,
            }
            let err = svc.create_request(body).unwrap_err();
            assert!(matches!(err, ServiceError::Validation(_)), "{missing}: {err:?}");
        }
        assert_eq!(svc.store().list(&Default::default()).unwrap().total, 0);
    }

    #[test]
    fn create_rejects_bad_kind_and_email() {
        let (_c, svc) = service();

        let mut body = valid_body();
        body.kind = Some("DELETE".into());
        assert!(matches!(
            svc.create_request(body).unwrap_err(),
            ServiceError::Validation(_)
        ));

        let mut body = valid_body();
        body.email = Some("not-an-address".into());
        assert!(matches!(
            svc.create_request(body).unwrap_err(),
            ServiceError::Validation(_)
        ));
    }

    #[test]
    fn complete_sets_completed_at_and_notes() {
        let (clock, svc) = service();
        let r = svc.create_request(valid_body()).unwrap();

        clock.advance_secs(120);
        let done = svc
            .transition(&r.id, "COMPLETED", Some("account provisioned".into()))
            .unwrap();
        assert_eq!(done.status, RequestStatus::Completed);
        assert_eq!(done.notes.as_deref(), Some("account provisioned"));
        assert!(done.completed_at.unwrap().starts_with("2024-05-01T09:02:00"));
    }

    #[test]
    fn reject_does_not_set_completed_at() {
        let (_c, svc) = service();
        let r = svc.create_request(valid_body()).unwrap();
        let rejected = svc
            .transition(&r.id, "REJECTED", Some("duplicate request".into()))
            .unwrap();
        assert_eq!(rejected.status, RequestStatus::Rejected);
        assert!(rejected.completed_at.is_none());
    }

    #[test]
    fn terminal_requests_stay_terminal() {
        let (_c, svc) = service();
        let r = svc.create_request(valid_body()).unwrap();
        svc.transition(&r.id, "COMPLETED", None).unwrap();

        let err = svc.transition(&r.id, "IN_PROGRESS", None).unwrap_err();
        assert!(matches!(err, ServiceError::InvalidTransition(_)));
        assert_eq!(
            svc.store().get(&r.id).unwrap().status,
            RequestStatus::Completed
        );
    }

    #[test]
    fn hold_then_complete() {
        let (_c, svc) = service();
        let r = svc.create_request(valid_body()).unwrap();
        svc.transition(&r.id, "ON_HOLD", Some("waiting on HR".into()))
            .unwrap();
        let done = svc.transition(&r.id, "COMPLETED", None).unwrap();
        // Earlier notes survive a transition that carries none.
        assert_eq!(done.notes.as_deref(), Some("waiting on HR"));
    }
}
