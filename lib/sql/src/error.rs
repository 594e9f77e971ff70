use thiserror::Error;

#[derive(Error, Debug)]
pub enum SQLError {
    #[error("query error: {0}")]
    Query(String),

    #[error("execution error: {0}")]
    Execution(String),

    /// A UNIQUE/CHECK constraint was violated. Surfaced distinctly so
    /// callers can treat duplicate-key collisions as retryable (batch
    /// number reservation) rather than fatal.
    #[error("constraint violation: {0}")]
    Constraint(String),

    #[error("connection error: {0}")]
    Connection(String),
}

impl SQLError {
    /// Whether this error is a constraint (duplicate key) violation.
    pub fn is_constraint(&self) -> bool {
        matches!(self, SQLError::Constraint(_))
    }
}
