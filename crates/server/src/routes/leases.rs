//! Routes for the lease lifecycle.

use axum::{
    Json, Router,
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::{get, post},
};
use chrono::NaiveDate;
use db::models::{
    lease::{Lease, LeaseWithProperty},
    payment::Payment,
};
use serde::{Deserialize, Serialize};
use services::services::lease::{CreateDirectLease, LeaseService};
use ts_rs::TS;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, error::ApiError};

/// A freshly created lease together with its pending deposit payment.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreatedLease {
    pub lease: Lease,
    pub caution: Payment,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct TerminateLeaseRequest {
    pub date_fin: NaiveDate,
}

pub async fn create_lease(
    State(state): State<AppState>,
    Json(data): Json<CreateDirectLease>,
) -> Result<ResponseJson<ApiResponse<CreatedLease>>, ApiError> {
    let (lease, caution) =
        LeaseService::create_direct_lease(&state.db.pool, &state.events, &data).await?;
    Ok(ResponseJson(ApiResponse::success(CreatedLease {
        lease,
        caution,
    })))
}

pub async fn get_lease(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<Lease>>, ApiError> {
    let lease = Lease::find_by_id(&state.db.pool, id)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(ResponseJson(ApiResponse::success(lease)))
}

pub async fn list_by_tenant(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<Vec<LeaseWithProperty>>>, ApiError> {
    let leases = Lease::find_by_tenant_id(&state.db.pool, id).await?;
    Ok(ResponseJson(ApiResponse::success(leases)))
}

pub async fn list_by_manager(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<Vec<LeaseWithProperty>>>, ApiError> {
    let leases = Lease::find_by_manager_id(&state.db.pool, id).await?;
    Ok(ResponseJson(ApiResponse::success(leases)))
}

/// Manual confirmation path for deposits settled outside the receipt flow.
pub async fn confirm_deposit(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<Lease>>, ApiError> {
    let lease = LeaseService::confirm_deposit_payment(&state.db.pool, &state.events, id).await?;
    Ok(ResponseJson(ApiResponse::success(lease)))
}

pub async fn terminate_lease(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(data): Json<TerminateLeaseRequest>,
) -> Result<ResponseJson<ApiResponse<Lease>>, ApiError> {
    let lease =
        LeaseService::terminate_lease(&state.db.pool, &state.events, id, data.date_fin).await?;
    Ok(ResponseJson(ApiResponse::success(lease)))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/leases", post(create_lease))
        .route("/leases/{id}", get(get_lease))
        .route("/leases/{id}/confirm-deposit", post(confirm_deposit))
        .route("/leases/{id}/terminate", post(terminate_lease))
        .route("/tenants/{id}/leases", get(list_by_tenant))
        .route("/managers/{id}/leases", get(list_by_manager))
}
