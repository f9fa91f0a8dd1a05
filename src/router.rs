use crate::handlers::{
    bank_balance::get_bank_balance,
    health::health_check,
    invoices::{download_receipt, download_receipt_document, get_invoice},
    payments::{
        create_correction, get_payment, list_corrections, list_payment_status, mark_as_paid,
        payment_summary, record_payment,
    },
    students::get_student_payments,
};
use crate::schemas::{ApiDoc, AppState};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Largest accepted upload (proof of payment plus form fields)
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Create application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Payment recording and monthly status
        .route("/api/v1/payments", get(list_payment_status))
        .route("/api/v1/payments", post(record_payment))
        .route("/api/v1/payments/summary", get(payment_summary))
        .route("/api/v1/payments/mark-as-paid/:student_id", post(mark_as_paid))
        .route("/api/v1/payments/:payment_id", get(get_payment))
        .route("/api/v1/payments/:payment_id/corrections", post(create_correction))
        .route("/api/v1/payments/:payment_id/corrections", get(list_corrections))
        // Invoices and receipts
        .route("/api/v1/payments/:payment_id/invoice", get(get_invoice))
        .route("/api/v1/payments/:payment_id/receipt", get(download_receipt))
        .route(
            "/api/v1/payments/:payment_id/receipt/document",
            get(download_receipt_document),
        )
        // Students and bank
        .route("/api/v1/students/:student_id/payments", get(get_student_payments))
        .route("/api/v1/bank-balance", get(get_bank_balance))
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Add middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(TimeoutLayer::new(Duration::from_secs(30)))
                .layer(CorsLayer::permissive())
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .with_state(state)
}
