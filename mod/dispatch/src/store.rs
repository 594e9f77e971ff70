use std::sync::Arc;

use desk_core::{ListResult, ServiceError};
use desk_sql::{Row, SQLStore, Statement, Value};

use crate::model::{Batch, BatchListQuery, BatchStatus};

/// SQL schema for batches and their device rows.
const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS batches (
    id            TEXT PRIMARY KEY,
    data          TEXT NOT NULL,
    batch_number  TEXT NOT NULL UNIQUE,
    school_code   TEXT NOT NULL,
    status        TEXT NOT NULL,
    send_date     TEXT NOT NULL,
    created_at    TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_batch_status ON batches(status);
CREATE INDEX IF NOT EXISTS idx_batch_school ON batches(school_code);
CREATE TABLE IF NOT EXISTS batch_devices (
    batch_id       TEXT NOT NULL,
    position       INTEGER NOT NULL,
    device_type    TEXT NOT NULL,
    serial_number  TEXT NOT NULL,
    PRIMARY KEY (batch_id, position)
);
";

/// Whether an insert landed or lost the batch-number race.
#[derive(Debug, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// The UNIQUE constraint on batch_number fired — a concurrent creation
    /// took this number first. The caller may reserve a fresh number and retry.
    NumberTaken,
}

/// Persistent storage for batches, backed by SQLStore (SQLite).
pub struct BatchStore {
    db: Arc<dyn SQLStore>,
}

impl BatchStore {
    /// Create a new BatchStore and initialise the schema.
    pub fn new(db: Arc<dyn SQLStore>) -> Result<Self, ServiceError> {
        db.exec(SCHEMA, &[])
            .map_err(|e| ServiceError::Storage(format!("batch schema init: {e}")))?;
        Ok(Self { db })
    }

    /// Raw store handle, for sequence reservation.
    pub fn db(&self) -> &dyn SQLStore {
        self.db.as_ref()
    }

    /// Insert a batch and all of its device rows in one transaction.
    ///
    /// All-or-nothing: if any device insert fails the batch row is rolled
    /// back with it, so a half-written batch is never observable.
    pub fn insert(&self, batch: &Batch) -> Result<InsertOutcome, ServiceError> {
        let data =
            serde_json::to_string(batch).map_err(|e| ServiceError::Internal(e.to_string()))?;

        let mut stmts = vec![Statement::new(
            "INSERT INTO batches (id, data, batch_number, school_code, status, send_date, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            vec![
                Value::Text(batch.id.clone()),
                Value::Text(data),
                Value::Text(batch.batch_number.clone()),
                Value::Text(batch.school_code.clone()),
                Value::Text(batch.status.as_str().to_string()),
                Value::Text(batch.send_date.clone()),
                Value::Text(batch.created_at.clone()),
            ],
        )];

        for (position, device) in batch.devices.iter().enumerate() {
            stmts.push(Statement::new(
                "INSERT INTO batch_devices (batch_id, position, device_type, serial_number) \
                 VALUES (?1, ?2, ?3, ?4)",
                vec![
                    Value::Text(batch.id.clone()),
                    Value::Integer(position as i64),
                    Value::Text(device.device_type.clone()),
                    Value::Text(device.serial_number.clone()),
                ],
            ));
        }

        match self.db.exec_all(&stmts) {
            Ok(_) => Ok(InsertOutcome::Inserted),
            Err(e) if e.is_constraint() => Ok(InsertOutcome::NumberTaken),
            Err(e) => Err(ServiceError::Storage(e.to_string())),
        }
    }

    /// Get a batch by ID.
    pub fn get(&self, id: &str) -> Result<Batch, ServiceError> {
        let rows = self
            .db
            .query(
                "SELECT data FROM batches WHERE id = ?1",
                &[Value::Text(id.to_string())],
            )
            .map_err(|e| ServiceError::Storage(e.to_string()))?;

        let row = rows
            .first()
            .ok_or_else(|| ServiceError::NotFound(format!("batch {id}")))?;

        row_to_batch(row)
    }

    /// Atomically move a batch from `expected` status to the status recorded
    /// in `batch`. Returns `false` if a concurrent update won.
    pub fn transition(&self, batch: &Batch, expected: BatchStatus) -> Result<bool, ServiceError> {
        let data =
            serde_json::to_string(batch).map_err(|e| ServiceError::Internal(e.to_string()))?;

        let affected = self
            .db
            .exec(
                "UPDATE batches SET data = ?1, status = ?2 WHERE id = ?3 AND status = ?4",
                &[
                    Value::Text(data),
                    Value::Text(batch.status.as_str().to_string()),
                    Value::Text(batch.id.clone()),
                    Value::Text(expected.as_str().to_string()),
                ],
            )
            .map_err(|e| ServiceError::Storage(e.to_string()))?;

        Ok(affected > 0)
    }

    /// List batches with optional filters.
    pub fn list(&self, query: &BatchListQuery) -> Result<ListResult<Batch>, ServiceError> {
        let limit = query.limit.unwrap_or(50);
        let offset = query.offset.unwrap_or(0);

        let mut where_clauses: Vec<String> = Vec::new();
        let mut params: Vec<Value> = Vec::new();
        let mut idx = 1;

        if let Some(ref s) = query.status {
            where_clauses.push(format!("status = ?{idx}"));
            params.push(Value::Text(s.clone()));
            idx += 1;
        }
        if let Some(ref c) = query.school_code {
            where_clauses.push(format!("school_code = ?{idx}"));
            params.push(Value::Text(c.clone()));
            idx += 1;
        }

        let where_sql = if where_clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", where_clauses.join(" AND "))
        };

        let count_sql = format!("SELECT COUNT(*) as cnt FROM batches {where_sql}");
        let count_rows = self
            .db
            .query(&count_sql, &params)
            .map_err(|e| ServiceError::Storage(e.to_string()))?;
        let total = count_rows
            .first()
            .and_then(|r| r.get_i64("cnt"))
            .unwrap_or(0) as usize;

        let select_sql = format!(
            "SELECT data FROM batches {where_sql} ORDER BY batch_number DESC LIMIT ?{idx} OFFSET ?{}",
            idx + 1
        );
        let mut select_params = params;
        select_params.push(Value::Integer(limit as i64));
        select_params.push(Value::Integer(offset as i64));

        let rows = self
            .db
            .query(&select_sql, &select_params)
            .map_err(|e| ServiceError::Storage(e.to_string()))?;

        let items = rows
            .iter()
            .map(row_to_batch)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ListResult { items, total })
    }

    /// Count device rows for a batch (consistency check for tests/ops).
    pub fn device_count(&self, batch_id: &str) -> Result<u32, ServiceError> {
        let rows = self
            .db
            .query(
                "SELECT COUNT(*) as cnt FROM batch_devices WHERE batch_id = ?1",
                &[Value::Text(batch_id.to_string())],
            )
            .map_err(|e| ServiceError::Storage(e.to_string()))?;

        Ok(rows.first().and_then(|r| r.get_i64("cnt")).unwrap_or(0) as u32)
    }
}

/// Deserialize a Batch from a row's `data` JSON column.
fn row_to_batch(row: &Row) -> Result<Batch, ServiceError> {
    let json = row
        .get_str("data")
        .ok_or_else(|| ServiceError::Storage("missing data column".into()))?;
    serde_json::from_str(json).map_err(|e| ServiceError::Storage(format!("bad batch json: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Device;
    use desk_sql::SqliteStore;

    fn test_store() -> BatchStore {
        let db = Arc::new(SqliteStore::open_in_memory().unwrap());
        BatchStore::new(db).unwrap()
    }

    fn make_batch(id: &str, number: &str) -> Batch {
        Batch {
            id: id.into(),
            batch_number: number.into(),
            school_code: "LHS".into(),
            school_name: "Lincoln High School".into(),
            send_date: "2024-05-01".into(),
            status: BatchStatus::Pending,
            received_date: None,
            devices: vec![
                Device {
                    device_type: "Laptop".into(),
                    serial_number: "A1".into(),
                },
                Device {
                    device_type: "Charger".into(),
                    serial_number: "C9".into(),
                },
            ],
            created_at: desk_core::now_rfc3339(),
        }
    }

    #[test]
    fn insert_writes_batch_and_devices() {
        let store = test_store();
        let outcome = store.insert(&make_batch("b1", "20240501-0001")).unwrap();
        assert_eq!(outcome, InsertOutcome::Inserted);

        let got = store.get("b1").unwrap();
        assert_eq!(got.batch_number, "20240501-0001");
        assert_eq!(got.devices.len(), 2);
        assert_eq!(store.device_count("b1").unwrap(), 2);
    }

    #[test]
    fn duplicate_number_reports_number_taken() {
        let store = test_store();
        store.insert(&make_batch("b1", "20240501-0001")).unwrap();
        let outcome = store.insert(&make_batch("b2", "20240501-0001")).unwrap();
        assert_eq!(outcome, InsertOutcome::NumberTaken);

        // Loser's device rows rolled back with it.
        assert_eq!(store.device_count("b2").unwrap(), 0);
        assert!(store.get("b2").is_err());
    }

    #[test]
    fn cas_receive() {
        let store = test_store();
        store.insert(&make_batch("b1", "20240501-0001")).unwrap();

        let mut b = store.get("b1").unwrap();
        b.status = BatchStatus::Received;
        b.received_date = Some(desk_core::now_rfc3339());
        assert!(store.transition(&b, BatchStatus::Pending).unwrap());

        // Second confirmation finds no PENDING row.
        assert!(!store.transition(&b, BatchStatus::Pending).unwrap());
        assert_eq!(store.get("b1").unwrap().status, BatchStatus::Received);
    }

    #[test]
    fn list_by_school() {
        let store = test_store();
        store.insert(&make_batch("b1", "20240501-0001")).unwrap();
        let mut other = make_batch("b2", "20240501-0002");
        other.school_code = "WMS".into();
        store.insert(&other).unwrap();

        let result = store
            .list(&BatchListQuery {
                school_code: Some("LHS".into()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(result.total, 1);
        assert_eq!(result.items[0].id, "b1");
    }
}
