use crate::error::ApiError;
use crate::handlers::payments::payment_dto;
use crate::schemas::{ApiResponse, AppState, ErrorResponse};
use axum::{
    extract::{Path, State},
    response::Json,
};
use common::PaymentDto;
use ledger::{roster, store};
use tracing::{debug, instrument, trace};

/// Payment history of a student, newest period first
#[utoipa::path(
    get,
    path = "/api/v1/students/{student_id}/payments",
    tag = "students",
    params(
        ("student_id" = i32, Path, description = "Student ID"),
    ),
    responses(
        (status = 200, description = "Payments retrieved successfully", body = ApiResponse<Vec<PaymentDto>>),
        (status = 404, description = "Student not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_student_payments(
    Path(student_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<PaymentDto>>>, ApiError> {
    trace!("Entering get_student_payments function for student_id: {}", student_id);
    roster::get_student(&state.db, student_id).await?;

    let payments = store::payments_for_student(&state.db, student_id).await?;
    debug!("Student {} has {} payments", student_id, payments.len());

    Ok(Json(ApiResponse {
        data: payments.into_iter().map(payment_dto).collect(),
        message: "Payments retrieved successfully".to_string(),
        success: true,
    }))
}
