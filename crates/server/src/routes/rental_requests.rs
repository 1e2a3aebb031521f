//! Routes for rental requests and their approval flow.

use axum::{
    Json, Router,
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::{get, post},
};
use chrono::NaiveDate;
use db::models::rental_request::{CreateRentalRequest, RentalRequest};
use serde::{Deserialize, Serialize};
use services::services::{events::ChangeOp, lease::LeaseService};
use ts_rs::TS;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, error::ApiError};

use super::leases::CreatedLease;

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct ApproveRequest {
    pub date_debut: NaiveDate,
}

pub async fn create_request(
    State(state): State<AppState>,
    Json(data): Json<CreateRentalRequest>,
) -> Result<ResponseJson<ApiResponse<RentalRequest>>, ApiError> {
    let request = RentalRequest::create(&state.db.pool, &data, Uuid::new_v4()).await?;
    state
        .events
        .publish("rental_requests", ChangeOp::Insert, request.id);
    Ok(ResponseJson(ApiResponse::success(request)))
}

pub async fn list_by_property(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<Vec<RentalRequest>>>, ApiError> {
    let requests = RentalRequest::find_by_property_id(&state.db.pool, id).await?;
    Ok(ResponseJson(ApiResponse::success(requests)))
}

pub async fn list_by_tenant(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<Vec<RentalRequest>>>, ApiError> {
    let requests = RentalRequest::find_by_tenant_id(&state.db.pool, id).await?;
    Ok(ResponseJson(ApiResponse::success(requests)))
}

/// Approval creates the lease and its deposit payment in one go.
pub async fn approve_request(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(data): Json<ApproveRequest>,
) -> Result<ResponseJson<ApiResponse<CreatedLease>>, ApiError> {
    let (lease, caution) =
        LeaseService::approve_rental_request(&state.db.pool, &state.events, id, data.date_debut)
            .await?;
    Ok(ResponseJson(ApiResponse::success(CreatedLease {
        lease,
        caution,
    })))
}

pub async fn reject_request(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<RentalRequest>>, ApiError> {
    let request = LeaseService::reject_rental_request(&state.db.pool, &state.events, id).await?;
    Ok(ResponseJson(ApiResponse::success(request)))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/rental-requests", post(create_request))
        .route("/rental-requests/{id}/approve", post(approve_request))
        .route("/rental-requests/{id}/reject", post(reject_request))
        .route("/properties/{id}/rental-requests", get(list_by_property))
        .route("/tenants/{id}/rental-requests", get(list_by_tenant))
}
