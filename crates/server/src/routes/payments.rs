//! Routes for rent payments and receipt confirmation.

use axum::{
    Json, Router,
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::{get, post},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use chrono::NaiveDate;
use db::models::payment::{Payment, PaymentMethod};
use serde::{Deserialize, Serialize};
use services::services::payment::PaymentService;
use ts_rs::TS;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, error::ApiError};

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateRentPaymentRequest {
    pub mois_concerne: NaiveDate,
    pub methode: Option<PaymentMethod>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct UploadReceiptRequest {
    pub filename: String,
    pub content_base64: String,
}

pub async fn create_rent_payment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(data): Json<CreateRentPaymentRequest>,
) -> Result<ResponseJson<ApiResponse<Payment>>, ApiError> {
    let payment = PaymentService::create_rent_payment(
        &state.db.pool,
        &state.events,
        id,
        data.mois_concerne,
        data.methode,
    )
    .await?;
    Ok(ResponseJson(ApiResponse::success(payment)))
}

pub async fn list_by_lease(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<Vec<Payment>>>, ApiError> {
    let payments = Payment::find_by_lease_id(&state.db.pool, id).await?;
    Ok(ResponseJson(ApiResponse::success(payments)))
}

pub async fn get_payment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<Payment>>, ApiError> {
    let payment = Payment::find_by_id(&state.db.pool, id)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(ResponseJson(ApiResponse::success(payment)))
}

pub async fn upload_receipt(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(data): Json<UploadReceiptRequest>,
) -> Result<ResponseJson<ApiResponse<Payment>>, ApiError> {
    let bytes = BASE64
        .decode(&data.content_base64)
        .map_err(|e| ApiError::BadRequest(format!("invalid base64 content: {e}")))?;
    let payment = PaymentService::upload_receipt(
        &state.db.pool,
        state.storage.as_ref(),
        &state.events,
        id,
        &data.filename,
        &bytes,
    )
    .await?;
    Ok(ResponseJson(ApiResponse::success(payment)))
}

pub async fn confirm_payment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<Payment>>, ApiError> {
    let payment = PaymentService::confirm_by_tenant(&state.db.pool, &state.events, id).await?;
    Ok(ResponseJson(ApiResponse::success(payment)))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/leases/{id}/payments",
            get(list_by_lease).post(create_rent_payment),
        )
        .route("/payments/{id}", get(get_payment))
        .route("/payments/{id}/receipt", post(upload_receipt))
        .route("/payments/{id}/confirm", post(confirm_payment))
}
