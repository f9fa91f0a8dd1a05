use common::{
    BankBalanceDto, InvoiceStudent, InvoiceView, MonthlyStatusReport, PaymentDto, PaymentStats,
    PaymentStatus, Period, PeriodSummary, SchoolInfo, StudentPaymentRow,
};
use ledger::{FileStorage, PaymentRecorder, TemplateRenderer};
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use utoipa::{OpenApi, ToSchema};

pub use common::ApiResponse;

use crate::handlers::payments::{CorrectionForm, CorrectionResponse, MarkAsPaidForm, RecordPaymentForm};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection
    pub db: DatabaseConnection,
    /// Records payments and corrections
    pub recorder: Arc<PaymentRecorder>,
    /// Where payment proofs are kept
    pub storage: Arc<dyn FileStorage>,
    /// Produces printable receipts
    pub renderer: Arc<dyn TemplateRenderer>,
    /// Institution details printed on invoices
    pub school: SchoolInfo,
    /// Fee for students without an individual fee
    pub default_fee: Decimal,
}

impl AppState {
    pub fn new(
        db: DatabaseConnection,
        storage: Arc<dyn FileStorage>,
        renderer: Arc<dyn TemplateRenderer>,
        school: SchoolInfo,
        default_fee: Decimal,
    ) -> Self {
        let recorder = Arc::new(PaymentRecorder::new(db.clone(), storage.clone(), default_fee));
        Self {
            db,
            recorder,
            storage,
            renderer,
            school,
            default_fee,
        }
    }
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("school", &self.school.name)
            .field("default_fee", &self.default_fee)
            .finish_non_exhaustive()
    }
}

/// Error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Error code
    pub code: String,
    /// Success status (always false for errors)
    pub success: bool,
}

/// Health check response
#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Database connection status
    pub database: String,
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health::health_check,
        crate::handlers::payments::list_payment_status,
        crate::handlers::payments::record_payment,
        crate::handlers::payments::mark_as_paid,
        crate::handlers::payments::payment_summary,
        crate::handlers::payments::get_payment,
        crate::handlers::payments::create_correction,
        crate::handlers::payments::list_corrections,
        crate::handlers::invoices::get_invoice,
        crate::handlers::invoices::download_receipt,
        crate::handlers::invoices::download_receipt_document,
        crate::handlers::students::get_student_payments,
        crate::handlers::bank_balance::get_bank_balance,
    ),
    components(
        schemas(
            ApiResponse<MonthlyStatusReport>,
            ApiResponse<PaymentDto>,
            ApiResponse<Vec<PaymentDto>>,
            ApiResponse<PeriodSummary>,
            ApiResponse<InvoiceView>,
            ApiResponse<BankBalanceDto>,
            ApiResponse<CorrectionResponse>,
            ApiResponse<Vec<CorrectionResponse>>,
            ErrorResponse,
            HealthResponse,
            RecordPaymentForm,
            MarkAsPaidForm,
            CorrectionForm,
            CorrectionResponse,
            MonthlyStatusReport,
            StudentPaymentRow,
            PaymentStatus,
            PaymentStats,
            PeriodSummary,
            PaymentDto,
            InvoiceView,
            InvoiceStudent,
            SchoolInfo,
            BankBalanceDto,
            Period,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "payments", description = "Recording payments and monthly payment status"),
        (name = "invoices", description = "Invoices and receipts for recorded payments"),
        (name = "students", description = "Per-student payment history"),
        (name = "bank", description = "Bank balance"),
    ),
    info(
        title = "School Ledger API",
        description = "Student fee payments, monthly payment status, receipts and the bank balance for the school office",
        version = "0.1.0",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    )
)]
pub struct ApiDoc;
