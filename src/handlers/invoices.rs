use crate::error::ApiError;
use crate::schemas::{ApiResponse, AppState, ErrorResponse};
use axum::{
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Json, Response},
};
use common::InvoiceView;
use ledger::invoice::{self, ReceiptFile};
use tracing::{debug, info, instrument, trace, warn};

fn attachment(file: ReceiptFile) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, file.content_type),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file.file_name),
            ),
        ],
        file.bytes,
    )
        .into_response()
}

/// Invoice for a payment
#[utoipa::path(
    get,
    path = "/api/v1/payments/{payment_id}/invoice",
    tag = "invoices",
    params(
        ("payment_id" = i32, Path, description = "Payment ID"),
    ),
    responses(
        (status = 200, description = "Invoice built successfully", body = ApiResponse<InvoiceView>),
        (status = 404, description = "Payment not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_invoice(
    Path(payment_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<InvoiceView>>, ApiError> {
    trace!("Entering get_invoice function for payment_id: {}", payment_id);
    match invoice::build_invoice(&state.db, payment_id, &state.school).await {
        Ok(view) => {
            debug!("Built invoice {}", view.invoice_no);
            Ok(Json(ApiResponse {
                data: view,
                message: "Invoice built successfully".to_string(),
                success: true,
            }))
        }
        Err(e) => {
            warn!("Failed to build invoice for payment {}: {}", payment_id, e);
            Err(e.into())
        }
    }
}

/// Download the stored proof of a payment
#[utoipa::path(
    get,
    path = "/api/v1/payments/{payment_id}/receipt",
    tag = "invoices",
    params(
        ("payment_id" = i32, Path, description = "Payment ID"),
    ),
    responses(
        (status = 200, description = "Stored receipt file"),
        (status = 404, description = "Payment has no receipt or the file is missing", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn download_receipt(
    Path(payment_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Response, ApiError> {
    trace!("Entering download_receipt function for payment_id: {}", payment_id);
    match invoice::download_receipt(&state.db, state.storage.as_ref(), payment_id).await {
        Ok(file) => {
            info!("Serving receipt {} for payment {}", file.file_name, payment_id);
            Ok(attachment(file))
        }
        Err(e) => {
            warn!("Receipt for payment {} unavailable: {}", payment_id, e);
            Err(e.into())
        }
    }
}

/// Printable receipt document for a payment
#[utoipa::path(
    get,
    path = "/api/v1/payments/{payment_id}/receipt/document",
    tag = "invoices",
    params(
        ("payment_id" = i32, Path, description = "Payment ID"),
    ),
    responses(
        (status = 200, description = "Rendered receipt"),
        (status = 404, description = "Payment not found", body = ErrorResponse),
        (status = 502, description = "Receipt could not be rendered", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn download_receipt_document(
    Path(payment_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Response, ApiError> {
    trace!("Entering download_receipt_document function for payment_id: {}", payment_id);
    match invoice::render_receipt(&state.db, state.renderer.as_ref(), payment_id, &state.school).await {
        Ok(file) => {
            info!("Rendered receipt {} for payment {}", file.file_name, payment_id);
            Ok(attachment(file))
        }
        Err(e) => {
            warn!("Failed to render receipt for payment {}: {}", payment_id, e);
            Err(e.into())
        }
    }
}
