pub mod error;
pub mod invoice;
pub mod period;
pub mod recorder;
pub mod render;
pub mod roster;
pub mod status;
pub mod storage;
pub mod store;

#[cfg(test)]
mod testing;

use rust_decimal::Decimal;

pub use error::{LedgerError, Result};
pub use recorder::{CorrectPayment, PaymentRecorder, RecordPayment};
pub use storage::{FileStorage, InMemoryFileStorage, LocalFileStorage, UploadedFile};
pub use render::{TemplateRenderer, TextReceiptRenderer};

/// Fee charged per period when a student has no individual fee.
pub const DEFAULT_MONTHLY_FEE: i64 = 400;

/// Returns [`DEFAULT_MONTHLY_FEE`] as a decimal amount.
pub fn default_monthly_fee() -> Decimal {
    Decimal::new(DEFAULT_MONTHLY_FEE, 0)
}
