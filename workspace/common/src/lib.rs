//! Transport-layer types shared by the HTTP API and any UI that renders it.
//! These mirror the JSON payloads produced by the backend handlers so a
//! client can deserialize responses without duplicating shapes.

mod invoice;
mod period;
mod status;

pub use invoice::{InvoiceStudent, InvoiceView, SchoolInfo};
pub use period::Period;
pub use status::{
    BankBalanceDto, MonthlyStatusReport, PaymentDto, PaymentStats,
    PaymentStatus, PeriodSummary, StudentPaymentRow,
};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Generic API response wrapper used by the backend.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Response data
    pub data: T,
    /// Response message
    pub message: String,
    /// Success flag
    pub success: bool,
}
