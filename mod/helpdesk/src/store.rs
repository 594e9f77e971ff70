use std::sync::Arc;

use desk_core::{ListResult, ServiceError};
use desk_sql::{Row, SQLStore, Value};

use crate::model::{Ticket, TicketListQuery, TicketStatus};

/// SQL schema for the tickets table.
const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS tickets (
    id             TEXT PRIMARY KEY,
    data           TEXT NOT NULL,
    ticket_number  TEXT NOT NULL UNIQUE,
    status         TEXT NOT NULL,
    category       TEXT NOT NULL,
    requestor      TEXT NOT NULL,
    created_at     TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_ticket_status ON tickets(status);
CREATE INDEX IF NOT EXISTS idx_ticket_category ON tickets(category);
CREATE INDEX IF NOT EXISTS idx_ticket_requestor ON tickets(requestor);
CREATE INDEX IF NOT EXISTS idx_ticket_create_at ON tickets(created_at);
";

/// Persistent storage for tickets, backed by SQLStore (SQLite).
pub struct TicketStore {
    db: Arc<dyn SQLStore>,
}

impl TicketStore {
    /// Create a new TicketStore and initialise the schema.
    pub fn new(db: Arc<dyn SQLStore>) -> Result<Self, ServiceError> {
        db.exec(SCHEMA, &[])
            .map_err(|e| ServiceError::Storage(format!("ticket schema init: {e}")))?;
        Ok(Self { db })
    }

    /// Insert a new ticket.
    pub fn create(&self, ticket: &Ticket) -> Result<(), ServiceError> {
        let data =
            serde_json::to_string(ticket).map_err(|e| ServiceError::Internal(e.to_string()))?;

        self.db
            .exec(
                "INSERT INTO tickets (id, data, ticket_number, status, category, requestor, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                &[
                    Value::Text(ticket.id.clone()),
                    Value::Text(data),
                    Value::Text(ticket.ticket_number.clone()),
                    Value::Text(ticket.status.as_str().to_string()),
                    Value::Text(ticket.category.as_str().to_string()),
                    Value::Text(ticket.requestor.clone()),
                    Value::Text(ticket.created_at.clone()),
                ],
            )
            .map_err(|e| ServiceError::Storage(e.to_string()))?;

        Ok(())
    }

    /// Get a ticket by ID.
    pub fn get(&self, id: &str) -> Result<Ticket, ServiceError> {
        let rows = self
            .db
            .query(
                "SELECT data FROM tickets WHERE id = ?1",
                &[Value::Text(id.to_string())],
            )
            .map_err(|e| ServiceError::Storage(e.to_string()))?;

        let row = rows
            .first()
            .ok_or_else(|| ServiceError::NotFound(format!("ticket {id}")))?;

        row_to_ticket(row)
    }

    /// Atomically move a ticket from `expected` to the status recorded in
    /// `ticket`, writing the JSON and status column together.
    ///
    /// Returns `false` if the stored status no longer matches `expected`
    /// (a concurrent transition won); nothing is written in that case.
    pub fn transition(&self, ticket: &Ticket, expected: TicketStatus) -> Result<bool, ServiceError> {
        let data =
            serde_json::to_string(ticket).map_err(|e| ServiceError::Internal(e.to_string()))?;

        let affected = self
            .db
            .exec(
                "UPDATE tickets SET data = ?1, status = ?2 WHERE id = ?3 AND status = ?4",
                &[
                    Value::Text(data),
                    Value::Text(ticket.status.as_str().to_string()),
                    Value::Text(ticket.id.clone()),
                    Value::Text(expected.as_str().to_string()),
                ],
            )
            .map_err(|e| ServiceError::Storage(e.to_string()))?;

        Ok(affected > 0)
    }

    /// List tickets with optional filters.
    pub fn list(&self, query: &TicketListQuery) -> Result<ListResult<Ticket>, ServiceError> {
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
        if let Some(ref c) = query.category {
            where_clauses.push(format!("category = ?{idx}"));
            params.push(Value::Text(c.clone()));
            idx += 1;
        }
        if let Some(ref r) = query.requestor {
            where_clauses.push(format!("requestor = ?{idx}"));
            params.push(Value::Text(r.clone()));
            idx += 1;
        }

        let where_sql = if where_clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", where_clauses.join(" AND "))
        };

        // Count total
        let count_sql = format!("SELECT COUNT(*) as cnt FROM tickets {where_sql}");
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
            "SELECT data FROM tickets {where_sql} ORDER BY created_at DESC LIMIT ?{idx} OFFSET ?{}",
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
            .map(row_to_ticket)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ListResult { items, total })
    }
}

/// Deserialize a Ticket from a row's `data` JSON column.
fn row_to_ticket(row: &Row) -> Result<Ticket, ServiceError> {
    let json = row
        .get_str("data")
        .ok_or_else(|| ServiceError::Storage("missing data column".into()))?;
    serde_json::from_str(json).map_err(|e| ServiceError::Storage(format!("bad ticket json: {e}")))
}
