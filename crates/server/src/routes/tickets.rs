//! Routes for maintenance tickets.

use axum::{
    Json, Router,
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::{get, post, put},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use db::models::maintenance::{
    CreateTicket, Intervention, MaintenanceTicket, TicketPriority, TicketStatus,
};
use serde::{Deserialize, Serialize};
use services::services::maintenance::{MaintenanceService, TicketPhoto};
use ts_rs::TS;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, error::ApiError};

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct PhotoUpload {
    pub filename: String,
    pub content_base64: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateTicketRequest {
    pub lease_id: Uuid,
    pub titre: String,
    pub description: String,
    pub priorite: Option<TicketPriority>,
    #[serde(default)]
    pub photos: Vec<PhotoUpload>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct UpdateTicketStatusRequest {
    pub statut: TicketStatus,
    pub description: Option<String>,
}

pub async fn create_ticket(
    State(state): State<AppState>,
    Json(data): Json<CreateTicketRequest>,
) -> Result<ResponseJson<ApiResponse<MaintenanceTicket>>, ApiError> {
    let mut photos: Vec<TicketPhoto> = Vec::with_capacity(data.photos.len());
    for photo in &data.photos {
        let bytes = BASE64
            .decode(&photo.content_base64)
            .map_err(|e| ApiError::BadRequest(format!("invalid base64 content: {e}")))?;
        photos.push((photo.filename.clone(), bytes));
    }

    let ticket = MaintenanceService::create_ticket(
        &state.db.pool,
        state.storage.as_ref(),
        &state.events,
        &CreateTicket {
            lease_id: data.lease_id,
            titre: data.titre,
            description: data.description,
            priorite: data.priorite,
        },
        &photos,
    )
    .await?;
    Ok(ResponseJson(ApiResponse::success(ticket)))
}

pub async fn get_ticket(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<MaintenanceTicket>>, ApiError> {
    let ticket = MaintenanceTicket::find_by_id(&state.db.pool, id)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(ResponseJson(ApiResponse::success(ticket)))
}

pub async fn list_by_lease(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<Vec<MaintenanceTicket>>>, ApiError> {
    let tickets = MaintenanceTicket::find_by_lease_id(&state.db.pool, id).await?;
    Ok(ResponseJson(ApiResponse::success(tickets)))
}

pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(data): Json<UpdateTicketStatusRequest>,
) -> Result<ResponseJson<ApiResponse<MaintenanceTicket>>, ApiError> {
    let ticket = MaintenanceService::update_ticket_status(
        &state.db.pool,
        &state.events,
        id,
        data.statut,
        data.description.as_deref(),
    )
    .await?;
    Ok(ResponseJson(ApiResponse::success(ticket)))
}

pub async fn list_interventions(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<Vec<Intervention>>>, ApiError> {
    let interventions = Intervention::find_by_ticket_id(&state.db.pool, id).await?;
    Ok(ResponseJson(ApiResponse::success(interventions)))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/tickets", post(create_ticket))
        .route("/tickets/{id}", get(get_ticket))
        .route("/tickets/{id}/status", put(update_status))
        .route("/tickets/{id}/interventions", get(list_interventions))
        .route("/leases/{id}/tickets", get(list_by_lease))
}
