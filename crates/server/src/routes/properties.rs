//! Routes for property listings.

use axum::{
    Json, Router,
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::{get, post},
};
use db::models::property::{CreateProperty, Property, UpdateProperty};
use services::services::{events::ChangeOp, geocode::Coordinates};
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, error::ApiError};

pub async fn create_property(
    State(state): State<AppState>,
    Json(data): Json<CreateProperty>,
) -> Result<ResponseJson<ApiResponse<Property>>, ApiError> {
    let property = Property::create(&state.db.pool, &data, Uuid::new_v4()).await?;
    state.events.publish("properties", ChangeOp::Insert, property.id);
    Ok(ResponseJson(ApiResponse::success(property)))
}

pub async fn get_property(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<Property>>, ApiError> {
    let property = Property::find_by_id(&state.db.pool, id)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(ResponseJson(ApiResponse::success(property)))
}

pub async fn list_available(
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Vec<Property>>>, ApiError> {
    let properties = Property::find_available(&state.db.pool).await?;
    Ok(ResponseJson(ApiResponse::success(properties)))
}

pub async fn update_property(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(data): Json<UpdateProperty>,
) -> Result<ResponseJson<ApiResponse<Property>>, ApiError> {
    Property::find_by_id(&state.db.pool, id)
        .await?
        .ok_or(ApiError::NotFound)?;
    let property = Property::update(&state.db.pool, id, &data).await?;
    state.events.publish("properties", ChangeOp::Update, property.id);
    Ok(ResponseJson(ApiResponse::success(property)))
}

/// Resolve and persist coordinates for a property that has none yet. Returns
/// null when the property already carries coordinates.
pub async fn geocode_property(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<Option<Coordinates>>>, ApiError> {
    Property::find_by_id(&state.db.pool, id)
        .await?
        .ok_or(ApiError::NotFound)?;
    let coords = state.geocode.ensure_geocoded(&state.db.pool, id).await?;
    Ok(ResponseJson(ApiResponse::success(coords)))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/properties", post(create_property))
        .route("/properties/available", get(list_available))
        .route("/properties/{id}", get(get_property).put(update_property))
        .route("/properties/{id}/geocode", post(geocode_property))
}
