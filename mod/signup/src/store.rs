use std::sync::Arc;

use desk_core::{ListResult, ServiceError};
use desk_sql::{Row, SQLStore, Value};

use crate::model::{RequestListQuery, RequestStatus, SignupRequest};

/// SQL schema for the requests table.
const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS signup_requests (
    id              TEXT PRIMARY KEY,
    data            TEXT NOT NULL,
    request_number  TEXT NOT NULL UNIQUE,
    kind            TEXT NOT NULL,
    status          TEXT NOT NULL,
    created_at      TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_request_kind ON signup_requests(kind);
CREATE INDEX IF NOT EXISTS idx_request_status ON signup_requests(status);
CREATE INDEX IF NOT EXISTS idx_request_create_at ON signup_requests(created_at);
";

/// Persistent storage for account/reset requests, backed by SQLStore (SQLite).
pub struct RequestStore {
    db: Arc<dyn SQLStore>,
}

impl RequestStore {
    /// Create a new RequestStore and initialise the schema.
    pub fn new(db: Arc<dyn SQLStore>) -> Result<Self, ServiceError> {
        db.exec(SCHEMA, &[])
            .map_err(|e| ServiceError::Storage(format!("signup schema init: {e}")))?;
        Ok(Self { db })
    }

    /// Insert a new request.
    pub fn create(&self, request: &SignupRequest) -> Result<(), ServiceError> {
        let data =
            serde_json::to_string(request).map_err(|e| ServiceError::Internal(e.to_string()))?;

        self.db
            .exec(
                "INSERT INTO signup_requests (id, data, request_number, kind, status, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                &[
                    Value::Text(request.id.clone()),
                    Value::Text(data),
                    Value::Text(request.request_number.clone()),
                    Value::Text(request.kind.as_str().to_string()),
                    Value::Text(request.status.as_str().to_string()),
                    Value::Text(request.created_at.clone()),
                ],
            )
            .map_err(|e| ServiceError::Storage(e.to_string()))?;

        Ok(())
    }

    /// Get a request by ID.
    pub fn get(&self, id: &str) -> Result<SignupRequest, ServiceError> {
        let rows = self
            .db
            .query(
                "SELECT data FROM signup_requests WHERE id = ?1",
                &[Value::Text(id.to_string())],
            )
            .map_err(|e| ServiceError::Storage(e.to_string()))?;

        let row = rows
            .first()
            .ok_or_else(|| ServiceError::NotFound(format!("request {id}")))?;

        row_to_request(row)
    }

    /// Atomically move a request from `expected` to the status recorded in
    /// `request`. Returns `false` if the stored status no longer matches
    /// `expected`; nothing is written in that case.
    pub fn transition(
        &self,
        request: &SignupRequest,
        expected: RequestStatus,
    ) -> Result<bool, ServiceError> {
        let data =
            serde_json::to_string(request).map_err(|e| ServiceError::Internal(e.to_string()))?;

        let affected = self
            .db
            .exec(
                "UPDATE signup_requests SET data = ?1, status = ?2 WHERE id = ?3 AND status = ?4",
                &[
                    Value::Text(data),
                    Value::Text(request.status.as_str().to_string()),
                    Value::Text(request.id.clone()),
                    Value::Text(expected.as_str().to_string()),
                ],
            )
            .map_err(|e| ServiceError::Storage(e.to_string()))?;

        Ok(affected > 0)
    }

    /// List requests with optional filters, newest first.
    pub fn list(&self, query: &RequestListQuery) -> Result<ListResult<SignupRequest>, ServiceError> {
        let limit = query.limit.unwrap_or(50);
        let offset = query.offset.unwrap_or(0);

        let mut where_clauses: Vec<String> = Vec::new();
        let mut params: Vec<Value> = Vec::new();
        let mut idx = 1;

        if let Some(ref k) = query.kind {
            where_clauses.push(format!("kind = ?{idx}"));
            params.push(Value::Text(k.clone()));
            idx += 1;
        }
        if let Some(ref s) = query.status {
            where_clauses.push(format!("status = ?{idx}"));
            params.push(Value::Text(s.clone()));
            idx += 1;
        }

        let where_sql = if where_clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", where_clauses.join(" AND "))
        };

        // Count total
        let count_sql = format!("SELECT COUNT(*) as cnt FROM signup_requests {where_sql}");
        let count_rows = self
            .db
            .query(&count_sql, &params)
            .map_err(|e| ServiceError::Storage(e.to_string()))?;
        let total = count_rows
            .first()
            .and_then(|r| r.get_i64("cnt"))
            .unwrap_or(0) as usize;

        // Fetch page
        let select_sql = format!(
            "SELECT data FROM signup_requests {where_sql} ORDER BY created_at DESC LIMIT ?{idx} OFFSET ?{}",
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
            .map(row_to_request)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ListResult { items, total })
    }
}

/// Deserialize a SignupRequest from a row's `data` JSON column.
fn row_to_request(row: &Row) -> Result<SignupRequest, ServiceError> {
    let json = row
        .get_str("data")
        .ok_or_else(|| ServiceError::Storage("missing data column".into()))?;
    serde_json::from_str(json).map_err(|e| ServiceError::Storage(format!("bad request json: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RequestKind;
    use desk_sql::SqliteStore;

    fn test_store() -> RequestStore {
        let db = Arc::new(SqliteStore::open_in_memory().unwrap());
        RequestStore::new(db).unwrap()
    }

    fn make_request(id: &str, number: &str, kind: RequestKind) -> SignupRequest {
        SignupRequest {
            id: id.into(),
            request_number: number.into(),
            kind,
            applicant_name: "Dana Smith".into(),
            email: "dana@example.org".into(),
            school_name: Some("Lincoln High School".into()),
            details: None,
            status: RequestStatus::Pending,
            notes: None,
            created_at: desk_core::now_rfc3339(),
            completed_at: None,
        }
    }

    #[test]
    fn create_and_get() {
        let store = test_store();
        store
            .create(&make_request("r1", "REQ-AAA00000001", RequestKind::Account))
            .unwrap();

        let got = store.get("r1").unwrap();
        assert_eq!(got.request_number, "REQ-AAA00000001");
        assert_eq!(got.status, RequestStatus::Pending);
    }

    #[test]
    fn request_number_is_unique() {
        let store = test_store();
        store
            .create(&make_request("r1", "REQ-AAA00000001", RequestKind::Account))
            .unwrap();
        assert!(store
            .create(&make_request("r2", "REQ-AAA00000001", RequestKind::Account))
            .is_err());
    }

    #[test]
    fn cas_transition() {
        let store = test_store();
        store
            .create(&make_request("r1", "RST-AAA00000001", RequestKind::Reset))
            .unwrap();

        let mut r = store.get("r1").unwrap();
        r.status = RequestStatus::Completed;
        assert!(store.transition(&r, RequestStatus::Pending).unwrap());

        // Stale expectation after the first transition wins.
        r.status = RequestStatus::Rejected;
        assert!(!store.transition(&r, RequestStatus::Pending).unwrap());

        assert_eq!(store.get("r1").unwrap().status, RequestStatus::Completed);
    }

    #[test]
    fn list_with_filters() {
        let store = test_store();
        store
            .create(&make_request("a", "REQ-AAA00000001", RequestKind::Account))
            .unwrap();
        store
            .create(&make_request("b", "RST-AAA00000001", RequestKind::Reset))
            .unwrap();
        store
            .create(&make_request("c", "REQ-AAA00000002", RequestKind::Account))
            .unwrap();

        let result = store
            .list(&RequestListQuery {
                kind: Some("ACCOUNT".into()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(result.total, 2);

        let result = store
            .list(&RequestListQuery {
                kind: Some("RESET".into()),
                status: Some("PENDING".into()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(result.total, 1);
        assert_eq!(result.items[0].id, "b");
    }
}
