use std::sync::Arc;

use desk_core::ServiceError;
use desk_sql::{Row, SQLStore, Value};

use crate::model::User;

/// SQL schema for the users table.
///
/// The password hash lives in its own column rather than the JSON blob,
/// keeping it out of every serialized view of the user.
const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS users (
    id             TEXT PRIMARY KEY,
    data           TEXT NOT NULL,
    username       TEXT NOT NULL UNIQUE,
    password_hash  TEXT NOT NULL,
    role           TEXT NOT NULL,
    active         INTEGER NOT NULL DEFAULT 1,
    created_at     TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_user_role ON users(role);
";

/// Persistent storage for login accounts, backed by SQLStore (SQLite).
pub struct UserStore {
    db: Arc<dyn SQLStore>,
}

impl UserStore {
    /// Create a new UserStore and initialise the schema.
    pub fn new(db: Arc<dyn SQLStore>) -> Result<Self, ServiceError> {
        db.exec(SCHEMA, &[])
            .map_err(|e| ServiceError::Storage(format!("user schema init: {e}")))?;
        Ok(Self { db })
    }

    /// Insert a new user. Fails on a duplicate username.
    pub fn create(&self, user: &User) -> Result<(), ServiceError> {
        let data =
            serde_json::to_string(user).map_err(|e| ServiceError::Internal(e.to_string()))?;

        self.db
            .exec(
                "INSERT INTO users (id, data, username, password_hash, role, active, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                &[
                    Value::Text(user.id.clone()),
                    Value::Text(data),
                    Value::Text(user.username.clone()),
                    Value::Text(user.password_hash.clone()),
                    Value::Text(user.role.as_str().to_string()),
                    Value::Integer(i64::from(user.active)),
                    Value::Text(user.created_at.clone()),
                ],
            )
            .map_err(|e| ServiceError::Storage(e.to_string()))?;

        Ok(())
    }

    /// Look a user up by username.
    pub fn get_by_username(&self, username: &str) -> Result<Option<User>, ServiceError> {
        let rows = self
            .db
            .query(
                "SELECT data, password_hash FROM users WHERE username = ?1",
                &[Value::Text(username.to_string())],
            )
            .map_err(|e| ServiceError::Storage(e.to_string()))?;

        rows.first().map(row_to_user).transpose()
    }
}

/// Deserialize a User from a row, restoring the hash from its column.
fn row_to_user(row: &Row) -> Result<User, ServiceError> {
    let json = row
        .get_str("data")
        .ok_or_else(|| ServiceError::Storage("missing data column".into()))?;
    let mut user: User = serde_json::from_str(json)
        .map_err(|e| ServiceError::Storage(format!("bad user json: {e}")))?;
    user.password_hash = row
        .get_str("password_hash")
        .ok_or_else(|| ServiceError::Storage("missing password_hash column".into()))?
        .to_string();
    Ok(user)
}
