use sea_orm::{DbErr, SqlErr};
use thiserror::Error;
use tracing::error;

/// Error types for the payment ledger
#[derive(Error, Debug)]
pub enum LedgerError {
    /// A student, payment or other record does not exist
    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: String },

    /// A payment already exists for the student and period
    #[error("payment already recorded for student {student_id} for {year}-{month:02}")]
    ConstraintViolation {
        student_id: i32,
        year: i32,
        month: u32,
    },

    /// Malformed input: bad period, missing proof, empty reason, ...
    #[error("Validation error: {0}")]
    Validation(String),

    /// File storage could not read or write a receipt
    #[error("Storage error: {0}")]
    Storage(String),

    /// The receipt document could not be rendered
    #[error("Render error: {0}")]
    Render(String),

    /// Error from the database operations
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl LedgerError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        LedgerError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Turn a unique-index failure on the payments table into a
    /// `ConstraintViolation` for the given period; anything else stays a
    /// database error.
    pub fn from_insert(err: DbErr, student_id: i32, year: i32, month: u32) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(detail)) => {
                error!(
                    student_id,
                    year, month, %detail, "Duplicate payment rejected by unique index"
                );
                LedgerError::ConstraintViolation {
                    student_id,
                    year,
                    month,
                }
            }
            _ => LedgerError::Database(err),
        }
    }
}

/// Type alias for Result with LedgerError
pub type Result<T> = std::result::Result<T, LedgerError>;
