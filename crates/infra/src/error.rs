use thiserror::Error;

use catalog_core::DomainError;

/// Failure of a store or query-service operation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Deterministic domain failure (validation, not found, contract misuse).
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("database error in {operation}: {message}")]
    Database {
        operation: &'static str,
        message: String,
    },

    /// A persisted row could not be mapped back to a product.
    #[error("corrupt product row: {0}")]
    Decode(String),

    #[error("product store lock poisoned")]
    Poisoned,
}

impl StoreError {
    pub fn as_domain(&self) -> Option<&DomainError> {
        match self {
            StoreError::Domain(e) => Some(e),
            _ => None,
        }
    }
}

pub(crate) fn map_sqlx_error(operation: &'static str, err: sqlx::Error) -> StoreError {
    let message = match err {
        sqlx::Error::Database(db_err) => match db_err.code() {
            Some(code) => format!("{} (code {})", db_err.message(), code),
            None => db_err.message().to_string(),
        },
        sqlx::Error::PoolClosed => "connection pool closed".to_string(),
        sqlx::Error::PoolTimedOut => "timed out acquiring a connection".to_string(),
        other => other.to_string(),
    };
    StoreError::Database { operation, message }
}
