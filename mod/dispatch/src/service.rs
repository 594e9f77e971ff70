use std::sync::{Arc, Mutex};

use tracing::info;

use desk_core::{new_id, Actor, Clock, ServiceError, Workflow};

use crate::model::{Batch, BatchStatus, CreateBatchRequest, Device};
use crate::sequence;
use crate::store::{BatchStore, InsertOutcome};

/// Batch lifecycle coordinator.
///
/// Creation reserves a per-day batch number and inserts the batch with its
/// device rows as one transaction. The reserve-and-insert section is
/// serialized behind `seq_guard` — the system runs as a single authoritative
/// process, so an in-process mutex is sufficient to keep the per-day counter
/// gapless. The UNIQUE constraint on batch_number plus one retry backs this
/// up should the store ever be shared out-of-process.
pub struct DispatchService {
    store: Arc<BatchStore>,
    clock: Arc<dyn Clock>,
    seq_guard: Mutex<()>,
}

impl DispatchService {
    pub fn new(store: Arc<BatchStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            seq_guard: Mutex::new(()),
        }
    }

    /// Access the underlying store.
    pub fn store(&self) -> &Arc<BatchStore> {
        &self.store
    }

    // =======================================================================
    // Create
    // =======================================================================

    /// Create a batch with a freshly reserved batch number.
    pub fn create_batch(&self, req: CreateBatchRequest) -> Result<Batch, ServiceError> {
        let school_code = required(req.school_code.as_deref(), "schoolCode")?;
        let school_name = required(req.school_name.as_deref(), "schoolName")?;
        let send_date = required(req.send_date.as_deref(), "sendDate")?;

        if req.devices.is_empty() {
            return Err(ServiceError::Validation(
                "a batch must contain at least one device".into(),
            ));
        }
        let mut devices = Vec::with_capacity(req.devices.len());
        for (i, d) in req.devices.iter().enumerate() {
            let device_type = required(d.device_type.as_deref(), "deviceType")
                .map_err(|_| ServiceError::Validation(format!("device {i}: missing deviceType")))?;
            let serial_number = required(d.serial_number.as_deref(), "serialNumber")
                .map_err(|_| ServiceError::Validation(format!("device {i}: missing serialNumber")))?;
            devices.push(Device {
                device_type: device_type.to_string(),
                serial_number: serial_number.to_string(),
            });
        }

        let now = self.clock.now();
        let day = sequence::day_prefix(now);

        let guard = self
            .seq_guard
            .lock()
            .map_err(|_| ServiceError::Internal("sequence guard poisoned".into()))?;

        // One retry: a collision means an out-of-band writer took the number
        // between our read and insert.
        for attempt in 0..2 {
            let batch_number = sequence::next_batch_number(self.store.db(), &day)?;
            let batch = Batch {
                id: new_id(),
                batch_number,
                school_code: school_code.to_string(),
                school_name: school_name.to_string(),
                send_date: send_date.to_string(),
                status: BatchStatus::Pending,
                received_date: None,
                devices: devices.clone(),
                created_at: now.to_rfc3339(),
            };

            match self.store.insert(&batch)? {
                InsertOutcome::Inserted => {
                    drop(guard);
                    info!(batch = %batch.batch_number, school = %batch.school_code, "batch created");
                    return Ok(batch);
                }
                InsertOutcome::NumberTaken if attempt == 0 => continue,
                InsertOutcome::NumberTaken => break,
            }
        }

        Err(ServiceError::SequenceConflict(format!(
            "could not reserve a batch number for day {day}"
        )))
    }

    // =======================================================================
    // Receive
    // =======================================================================

    /// Confirm receipt of a batch, stamping `received_date`.
    ///
    /// Only the owning school (or an administrator) may confirm; the batch
    /// must still be PENDING.
    pub fn receive_batch(&self, id: &str, actor: &Actor) -> Result<Batch, ServiceError> {
        let current = self.store.get(id)?;

        if !actor.owns_school(&current.school_code) {
            return Err(ServiceError::PermissionDenied(format!(
                "{} may not receive batches for school {}",
                actor.principal, current.school_code
            )));
        }

        if !current.status.can_transition(BatchStatus::Received) {
            return Err(ServiceError::InvalidTransition(format!(
                "batch {id} is already {}",
                current.status
            )));
        }

        let mut updated = current.clone();
        updated.status = BatchStatus::Received;
        updated.received_date = Some(self.clock.now().to_rfc3339());

        if !self.store.transition(&updated, current.status)? {
            return Err(ServiceError::InvalidTransition(format!(
                "batch {id} was received concurrently"
            )));
        }

        info!(batch = %updated.batch_number, "batch received");
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
    use crate::model::DeviceInput;
    use desk_core::clock::ManualClock;
    use desk_core::Role;
    use desk_sql::SqliteStore;

    fn service_at(start: &str) -> (Arc<ManualClock>, DispatchService) {
        let db = Arc::new(SqliteStore::open_in_memory().unwrap());
        let clock = Arc::new(ManualClock::at(start.parse().unwrap()));
        let svc = DispatchService::new(
            Arc::new(BatchStore::new(db).unwrap()),
            Arc::clone(&clock) as Arc<dyn Clock>,
        );
        (clock, svc)
    }

    fn valid_request() -> CreateBatchRequest {
        CreateBatchRequest {
            school_code: Some("LHS".into()),
            school_name: Some("Lincoln High School".into()),
            send_date: Some("2024-05-01".into()),
            devices: vec![DeviceInput {
                device_type: Some("Laptop".into()),
                serial_number: Some("A1".into()),
            }],
        }
    }

    fn admin() -> Actor {
        Actor {
            principal: "it-admin".into(),
            role: Role::Admin,
            school_code: None,
        }
    }

    fn school(code: &str) -> Actor {
        Actor {
            principal: format!("{code}-office"),
            role: Role::School,
            school_code: Some(code.into()),
        }
    }

    #[test]
    fn first_two_batches_of_a_day() {
        let (_c, svc) = service_at("2024-05-01T08:00:00Z");
        let b1 = svc.create_batch(valid_request()).unwrap();
        assert_eq!(b1.batch_number, "20240501-0001");
        assert_eq!(b1.status, BatchStatus::Pending);

        let b2 = svc.create_batch(valid_request()).unwrap();
        assert_eq!(b2.batch_number, "20240501-0002");
    }

    #[test]
    fn day_rollover_restarts_numbering() {
        let (clock, svc) = service_at("2024-05-01T23:59:00Z");
        let b1 = svc.create_batch(valid_request()).unwrap();
        assert_eq!(b1.batch_number, "20240501-0001");

        clock.advance_secs(120);
        let b2 = svc.create_batch(valid_request()).unwrap();
        assert_eq!(b2.batch_number, "20240502-0001");
    }

    #[test]
    fn concurrent_creations_get_distinct_contiguous_numbers() {
        let (_c, svc) = service_at("2024-05-01T08:00:00Z");
        let svc = Arc::new(svc);

        let mut handles = Vec::new();
        for _ in 0..8 {
            let svc = Arc::clone(&svc);
            handles.push(std::thread::spawn(move || {
                svc.create_batch(valid_request()).unwrap().batch_number
            }));
        }
        let mut numbers: Vec<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        numbers.sort();

        let expected: Vec<String> = (1..=8).map(|n| format!("20240501-{n:04}")).collect();
        assert_eq!(numbers, expected);
    }

    #[test]
    fn validation_failures_write_nothing() {
        let (_c, svc) = service_at("2024-05-01T08:00:00Z");

        let mut req = valid_request();
        req.devices.clear();
        assert!(matches!(
            svc.create_batch(req).unwrap_err(),
            ServiceError::Validation(_)
        ));

        let mut req = valid_request();
        req.devices.push(DeviceInput {
            device_type: Some("Tablet".into()),
            serial_number: None,
        });
        assert!(matches!(
            svc.create_batch(req).unwrap_err(),
            ServiceError::Validation(_)
        ));

        let mut req = valid_request();
        req.school_code = None;
        assert!(matches!(
            svc.create_batch(req).unwrap_err(),
            ServiceError::Validation(_)
        ));

        assert_eq!(svc.store().list(&Default::default()).unwrap().total, 0);
    }

    #[test]
    fn receive_stamps_received_date() {
        let (clock, svc) = service_at("2024-05-01T08:00:00Z");
        let b = svc.create_batch(valid_request()).unwrap();

        clock.advance_secs(3600);
        let received = svc.receive_batch(&b.id, &school("LHS")).unwrap();
        assert_eq!(received.status, BatchStatus::Received);
        assert!(received.received_date.unwrap().starts_with("2024-05-01T09:00:00"));
    }

    #[test]
    fn receive_is_terminal() {
        let (_c, svc) = service_at("2024-05-01T08:00:00Z");
        let b = svc.create_batch(valid_request()).unwrap();
        svc.receive_batch(&b.id, &admin()).unwrap();

        assert!(matches!(
            svc.receive_batch(&b.id, &admin()).unwrap_err(),
            ServiceError::InvalidTransition(_)
        ));
    }

    #[test]
    fn wrong_school_cannot_receive() {
        let (_c, svc) = service_at("2024-05-01T08:00:00Z");
        let b = svc.create_batch(valid_request()).unwrap();

        let err = svc.receive_batch(&b.id, &school("WMS")).unwrap_err();
        assert!(matches!(err, ServiceError::PermissionDenied(_)));
        assert_eq!(svc.store().get(&b.id).unwrap().status, BatchStatus::Pending);
    }
}
