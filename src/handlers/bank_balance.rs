use crate::error::ApiError;
use crate::schemas::{ApiResponse, AppState, ErrorResponse};
use axum::{extract::State, response::Json};
use common::BankBalanceDto;
use ledger::store;
use tracing::{error, instrument};

/// Current bank balance
#[utoipa::path(
    get,
    path = "/api/v1/bank-balance",
    tag = "bank",
    responses(
        (status = 200, description = "Bank balance retrieved successfully", body = ApiResponse<BankBalanceDto>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_bank_balance(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<BankBalanceDto>>, ApiError> {
    let row = store::bank_balance(&state.db).await.map_err(|e| {
        error!("Failed to read bank balance: {}", e);
        ApiError::from(e)
    })?;

    Ok(Json(ApiResponse {
        data: BankBalanceDto {
            balance: row.balance,
            updated_at: row.updated_at,
        },
        message: "Bank balance retrieved successfully".to_string(),
        success: true,
    }))
}
