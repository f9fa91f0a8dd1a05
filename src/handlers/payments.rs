use crate::error::ApiError;
use crate::extract::ActorId;
use crate::schemas::{ApiResponse, AppState, ErrorResponse};
use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use chrono::{DateTime, Utc};
use common::{MonthlyStatusReport, PaymentDto, Period, PeriodSummary};
use ledger::period::period_or_current;
use ledger::roster::RosterFilter;
use ledger::status::{StatusFilter, StatusQuery, period_summary, resolve_monthly_status};
use ledger::{CorrectPayment, RecordPayment, UploadedFile, store};
use model::entities::{payment, payment_correction};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use tracing::{debug, error, info, instrument, trace, warn};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Multipart field carrying the proof-of-payment file
pub const PROOF_FIELD: &str = "payment_proof";

/// Multipart body for recording a payment
#[derive(Debug, ToSchema)]
pub struct RecordPaymentForm {
    pub student_id: i32,
    pub year: i32,
    /// Month, 1-12
    pub month: u32,
    /// "cash", "bank" or "other"
    pub payment_method: String,
    pub notes: Option<String>,
    /// Proof of payment; required unless the method is cash
    #[schema(value_type = Option<String>, format = Binary)]
    pub payment_proof: Option<Vec<u8>>,
}

/// Multipart body for marking a student as paid
#[derive(Debug, ToSchema)]
pub struct MarkAsPaidForm {
    pub year: i32,
    pub month: u32,
    /// Defaults to "cash"
    pub payment_method: Option<String>,
    pub notes: Option<String>,
    #[schema(value_type = Option<String>, format = Binary)]
    pub payment_proof: Option<Vec<u8>>,
}

/// Multipart body for correcting a payment
#[derive(Debug, ToSchema)]
pub struct CorrectionForm {
    /// Why the payment is being corrected
    pub reason: String,
    /// Replacement notes
    pub notes: Option<String>,
    /// Replacement or late proof of payment
    #[schema(value_type = Option<String>, format = Binary)]
    pub payment_proof: Option<Vec<u8>>,
}

/// One entry of a payment's correction audit trail
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CorrectionResponse {
    pub id: i32,
    pub payment_id: i32,
    pub previous_notes: Option<String>,
    pub new_notes: Option<String>,
    pub receipt_replaced: bool,
    pub reason: String,
    pub corrected_by: i32,
    pub created_at: DateTime<Utc>,
}

impl From<payment_correction::Model> for CorrectionResponse {
    fn from(model: payment_correction::Model) -> Self {
        Self {
            id: model.id,
            payment_id: model.payment_id,
            previous_notes: model.previous_notes,
            new_notes: model.new_notes,
            receipt_replaced: model.previous_receipt != model.new_receipt,
            reason: model.reason,
            corrected_by: model.corrected_by,
            created_at: model.created_at,
        }
    }
}

pub fn payment_dto(model: payment::Model) -> PaymentDto {
    PaymentDto {
        id: model.id,
        student_id: model.student_id,
        year: model.year,
        month: model.month as u32,
        payment_method: model.payment_method.as_str().to_string(),
        amount: model.amount,
        has_receipt: model.receipt.is_some(),
        paid_by: model.paid_by,
        notes: model.notes,
        status: "paid".to_string(),
        created_at: model.created_at,
    }
}

/// Query parameters for the monthly payment status
#[derive(Debug, Deserialize, ToSchema, IntoParams, Validate)]
pub struct PaymentStatusQuery {
    /// Year (default: current year)
    #[validate(range(min = 1900, max = 9999))]
    pub year: Option<i32>,
    /// Month 1-12 (default: current month)
    #[validate(range(min = 1, max = 12))]
    pub month: Option<u32>,
    /// Only students of this class
    pub class_id: Option<i32>,
    /// Only students of this section
    pub section_id: Option<i32>,
    /// Match on student name or code
    #[validate(length(max = 100))]
    pub search: Option<String>,
    /// "paid", "not_paid" or "all" (default)
    pub status: Option<String>,
}

/// Query parameters selecting a period
#[derive(Debug, Deserialize, ToSchema, IntoParams, Validate)]
pub struct PeriodQuery {
    /// Year (default: current year)
    #[validate(range(min = 1900, max = 9999))]
    pub year: Option<i32>,
    /// Month 1-12 (default: current month)
    #[validate(range(min = 1, max = 12))]
    pub month: Option<u32>,
}

/// Text fields and the optional proof file of a multipart form.
#[derive(Debug, Default)]
struct FormData {
    fields: HashMap<String, String>,
    proof: Option<UploadedFile>,
}

impl FormData {
    async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = FormData::default();
        while let Some(field) = multipart.next_field().await.map_err(|e| {
            warn!("Failed to read multipart field: {}", e);
            ApiError::bad_request(format!("Failed to read multipart field: {}", e))
        })? {
            let name = field.name().unwrap_or_default().to_string();
            if name == PROOF_FIELD {
                let file_name = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Failed to read file bytes: {}", e)))?
                    .to_vec();
                trace!("Received proof {:?} ({} bytes)", file_name, bytes.len());
                form.proof = Some(UploadedFile {
                    file_name,
                    content_type,
                    bytes,
                });
            } else {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Failed to read field '{}': {}", name, e)))?;
                form.fields.insert(name, value);
            }
        }
        Ok(form)
    }

    fn text(&self, name: &str) -> Option<String> {
        self.fields
            .get(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn required<T: FromStr>(&self, name: &str) -> Result<T, ApiError> {
        let raw = self
            .text(name)
            .ok_or_else(|| ApiError::validation(format!("Field '{}' is required", name)))?;
        raw.parse()
            .map_err(|_| ApiError::validation(format!("Field '{}' has an invalid value '{}'", name, raw)))
    }

    fn method(&self) -> Result<Option<payment::PaymentMethod>, ApiError> {
        self.text("payment_method")
            .map(|raw| raw.parse::<payment::PaymentMethod>().map_err(ApiError::validation))
            .transpose()
    }
}

/// Monthly payment status of the (filtered) roster
#[utoipa::path(
    get,
    path = "/api/v1/payments",
    tag = "payments",
    params(PaymentStatusQuery),
    responses(
        (status = 200, description = "Payment status retrieved successfully", body = ApiResponse<MonthlyStatusReport>),
        (status = 400, description = "Invalid query parameters", body = ErrorResponse),
        (status = 422, description = "Invalid period or status filter", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn list_payment_status(
    Valid(Query(query)): Valid<Query<PaymentStatusQuery>>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<MonthlyStatusReport>>, ApiError> {
    trace!("Entering list_payment_status function");
    let period = period_or_current(query.year, query.month, Utc::now().date_naive());
    let status = query
        .status
        .as_deref()
        .map(StatusFilter::from_str)
        .transpose()?
        .unwrap_or_default();

    let status_query = StatusQuery {
        period,
        roster: RosterFilter {
            class_id: query.class_id,
            section_id: query.section_id,
            search: query.search,
        },
        status,
    };
    debug!("Resolving payment status for {}", period);

    match resolve_monthly_status(&state.db, &status_query, state.default_fee).await {
        Ok(report) => {
            info!(
                "Payment status for {}: {}/{} students paid",
                period, report.stats.paid_count, report.stats.total_students
            );
            Ok(Json(ApiResponse {
                data: report,
                message: "Payment status retrieved successfully".to_string(),
                success: true,
            }))
        }
        Err(e) => {
            error!("Failed to resolve payment status for {}: {}", period, e);
            Err(e.into())
        }
    }
}

async fn record(
    state: &AppState,
    request: RecordPayment,
) -> Result<(StatusCode, Json<ApiResponse<PaymentDto>>), ApiError> {
    let (student_id, period) = (request.student_id, request.period);
    match state.recorder.record_payment(request).await {
        Ok(recorded) => {
            info!("Payment {} recorded for student {} in {}", recorded.id, student_id, period);
            Ok((
                StatusCode::CREATED,
                Json(ApiResponse {
                    data: payment_dto(recorded),
                    message: "Payment recorded successfully".to_string(),
                    success: true,
                }),
            ))
        }
        Err(e) => {
            warn!("Failed to record payment for student {} in {}: {}", student_id, period, e);
            Err(e.into())
        }
    }
}

/// Record a payment for one student and period
#[utoipa::path(
    post,
    path = "/api/v1/payments",
    tag = "payments",
    request_body(content = RecordPaymentForm, content_type = "multipart/form-data"),
    params(
        ("x-actor-id" = i32, Header, description = "Acting administrator"),
    ),
    responses(
        (status = 201, description = "Payment recorded successfully", body = ApiResponse<PaymentDto>),
        (status = 401, description = "Missing or unknown administrator", body = ErrorResponse),
        (status = 404, description = "Student not found", body = ErrorResponse),
        (status = 409, description = "Payment already recorded for the period", body = ErrorResponse),
        (status = 422, description = "Invalid period, method or missing proof", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, multipart))]
pub async fn record_payment(
    State(state): State<AppState>,
    ActorId(actor_id): ActorId,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<PaymentDto>>), ApiError> {
    trace!("Entering record_payment function");
    let form = FormData::read(multipart).await?;

    let student_id: i32 = form.required("student_id")?;
    let period = Period::new(form.required("year")?, form.required("month")?);
    let method = form
        .method()?
        .ok_or_else(|| ApiError::validation("Field 'payment_method' is required"))?;
    debug!("Recording {} payment for student {} in {}", method, student_id, period);

    let request = RecordPayment {
        student_id,
        period,
        method,
        notes: form.text("notes"),
        proof: form.proof,
        actor_id,
    };
    record(&state, request).await
}

/// Mark a student as paid for a period
#[utoipa::path(
    post,
    path = "/api/v1/payments/mark-as-paid/{student_id}",
    tag = "payments",
    request_body(content = MarkAsPaidForm, content_type = "multipart/form-data"),
    params(
        ("student_id" = i32, Path, description = "Student ID"),
        ("x-actor-id" = i32, Header, description = "Acting administrator"),
    ),
    responses(
        (status = 201, description = "Payment recorded successfully", body = ApiResponse<PaymentDto>),
        (status = 401, description = "Missing or unknown administrator", body = ErrorResponse),
        (status = 404, description = "Student not found", body = ErrorResponse),
        (status = 409, description = "Payment already recorded for the period", body = ErrorResponse),
        (status = 422, description = "Invalid period, method or missing proof", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, multipart))]
pub async fn mark_as_paid(
    Path(student_id): Path<i32>,
    State(state): State<AppState>,
    ActorId(actor_id): ActorId,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<PaymentDto>>), ApiError> {
    trace!("Entering mark_as_paid function for student_id: {}", student_id);
    let form = FormData::read(multipart).await?;

    let period = Period::new(form.required("year")?, form.required("month")?);
    let method = form.method()?.unwrap_or(payment::PaymentMethod::Cash);
    debug!("Marking student {} as paid ({}) for {}", student_id, method, period);

    let request = RecordPayment {
        student_id,
        period,
        method,
        notes: form.text("notes"),
        proof: form.proof,
        actor_id,
    };
    record(&state, request).await
}

/// Totals of everything recorded for a period
#[utoipa::path(
    get,
    path = "/api/v1/payments/summary",
    tag = "payments",
    params(PeriodQuery),
    responses(
        (status = 200, description = "Summary retrieved successfully", body = ApiResponse<PeriodSummary>),
        (status = 400, description = "Invalid query parameters", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn payment_summary(
    Valid(Query(query)): Valid<Query<PeriodQuery>>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<PeriodSummary>>, ApiError> {
    let period = period_or_current(query.year, query.month, Utc::now().date_naive());
    debug!("Summarizing payments for {}", period);

    let summary = period_summary(&state.db, period).await.map_err(|e| {
        error!("Failed to summarize payments for {}: {}", period, e);
        ApiError::from(e)
    })?;
    Ok(Json(ApiResponse {
        data: summary,
        message: "Summary retrieved successfully".to_string(),
        success: true,
    }))
}

/// Get a payment by ID
#[utoipa::path(
    get,
    path = "/api/v1/payments/{payment_id}",
    tag = "payments",
    params(
        ("payment_id" = i32, Path, description = "Payment ID"),
    ),
    responses(
        (status = 200, description = "Payment retrieved successfully", body = ApiResponse<PaymentDto>),
        (status = 404, description = "Payment not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_payment(
    Path(payment_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<PaymentDto>>, ApiError> {
    trace!("Entering get_payment function for payment_id: {}", payment_id);
    match store::find_payment_by_id(&state.db, payment_id).await {
        Ok(found) => Ok(Json(ApiResponse {
            data: payment_dto(found),
            message: "Payment retrieved successfully".to_string(),
            success: true,
        })),
        Err(e) => {
            warn!("Failed to get payment {}: {}", payment_id, e);
            Err(e.into())
        }
    }
}

/// Correct the notes or proof of a payment
#[utoipa::path(
    post,
    path = "/api/v1/payments/{payment_id}/corrections",
    tag = "payments",
    request_body(content = CorrectionForm, content_type = "multipart/form-data"),
    params(
        ("payment_id" = i32, Path, description = "Payment ID"),
        ("x-actor-id" = i32, Header, description = "Acting administrator"),
    ),
    responses(
        (status = 201, description = "Payment corrected successfully", body = ApiResponse<CorrectionResponse>),
        (status = 401, description = "Missing or unknown administrator", body = ErrorResponse),
        (status = 404, description = "Payment not found", body = ErrorResponse),
        (status = 422, description = "Missing reason or nothing to correct", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, multipart))]
pub async fn create_correction(
    Path(payment_id): Path<i32>,
    State(state): State<AppState>,
    ActorId(actor_id): ActorId,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<CorrectionResponse>>), ApiError> {
    trace!("Entering create_correction function for payment_id: {}", payment_id);
    let form = FormData::read(multipart).await?;

    let request = CorrectPayment {
        payment_id,
        notes: form.text("notes"),
        reason: form.text("reason").unwrap_or_default(),
        proof: form.proof,
        actor_id,
    };

    match state.recorder.correct_payment(request).await {
        Ok((_, audit)) => {
            info!("Payment {} corrected by administrator {}", payment_id, actor_id);
            Ok((
                StatusCode::CREATED,
                Json(ApiResponse {
                    data: CorrectionResponse::from(audit),
                    message: "Payment corrected successfully".to_string(),
                    success: true,
                }),
            ))
        }
        Err(e) => {
            warn!("Failed to correct payment {}: {}", payment_id, e);
            Err(e.into())
        }
    }
}

/// Correction audit trail of a payment
#[utoipa::path(
    get,
    path = "/api/v1/payments/{payment_id}/corrections",
    tag = "payments",
    params(
        ("payment_id" = i32, Path, description = "Payment ID"),
    ),
    responses(
        (status = 200, description = "Corrections retrieved successfully", body = ApiResponse<Vec<CorrectionResponse>>),
        (status = 404, description = "Payment not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn list_corrections(
    Path(payment_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<CorrectionResponse>>>, ApiError> {
    store::find_payment_by_id(&state.db, payment_id).await?;
    let corrections = store::corrections_for_payment(&state.db, payment_id)
        .await
        .map_err(|e| {
            error!("Failed to load corrections of payment {}: {}", payment_id, e);
            ApiError::from(e)
        })?;
    debug!("Payment {} has {} corrections", payment_id, corrections.len());

    Ok(Json(ApiResponse {
        data: corrections.into_iter().map(CorrectionResponse::from).collect(),
        message: "Corrections retrieved successfully".to_string(),
        success: true,
    }))
}
