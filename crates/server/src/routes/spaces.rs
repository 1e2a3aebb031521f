//! Routes for spaces, members, charges and rendered reports.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::{Html, Json as ResponseJson},
    routing::{delete, get, post},
};
use chrono::{NaiveDate, Utc};
use db::models::{
    charge::{Charge, CreateCharge},
    property::Property,
    space::{CreateSpace, MemberRole, Space, SpaceMember},
};
use serde::{Deserialize, Serialize};
use services::services::{
    events::ChangeOp,
    finance::{FinanceService, ReportPeriod},
    report::MembersReport,
};
use ts_rs::TS;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, error::ApiError};

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct AddMemberRequest {
    pub user_id: Uuid,
    pub role: MemberRole,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateChargeRequest {
    pub libelle: String,
    pub categorie: String,
    pub montant: i64,
    pub date_charge: NaiveDate,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PeriodQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

pub async fn create_space(
    State(state): State<AppState>,
    Json(data): Json<CreateSpace>,
) -> Result<ResponseJson<ApiResponse<Space>>, ApiError> {
    let space = Space::create(&state.db.pool, &data, Uuid::new_v4()).await?;
    state.events.publish("spaces", ChangeOp::Insert, space.id);
    Ok(ResponseJson(ApiResponse::success(space)))
}

pub async fn get_space(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<Space>>, ApiError> {
    let space = Space::find_by_id(&state.db.pool, id)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(ResponseJson(ApiResponse::success(space)))
}

pub async fn list_properties(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<Vec<Property>>>, ApiError> {
    let properties = Property::find_by_space_id(&state.db.pool, id).await?;
    Ok(ResponseJson(ApiResponse::success(properties)))
}

pub async fn add_member(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(data): Json<AddMemberRequest>,
) -> Result<ResponseJson<ApiResponse<SpaceMember>>, ApiError> {
    Space::find_by_id(&state.db.pool, id)
        .await?
        .ok_or(ApiError::NotFound)?;
    let member = SpaceMember::add(&state.db.pool, id, data.user_id, data.role).await?;
    state.events.publish("space_members", ChangeOp::Insert, member.id);
    Ok(ResponseJson(ApiResponse::success(member)))
}

pub async fn list_members(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<Vec<SpaceMember>>>, ApiError> {
    let members = SpaceMember::find_by_space_id(&state.db.pool, id).await?;
    Ok(ResponseJson(ApiResponse::success(members)))
}

pub async fn create_charge(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(data): Json<CreateChargeRequest>,
) -> Result<ResponseJson<ApiResponse<Charge>>, ApiError> {
    Space::find_by_id(&state.db.pool, id)
        .await?
        .ok_or(ApiError::NotFound)?;
    let charge = Charge::create(
        &state.db.pool,
        &CreateCharge {
            space_id: id,
            libelle: data.libelle,
            categorie: data.categorie,
            montant: data.montant,
            date_charge: data.date_charge,
        },
        Uuid::new_v4(),
    )
    .await?;
    state.events.publish("charges", ChangeOp::Insert, charge.id);
    Ok(ResponseJson(ApiResponse::success(charge)))
}

pub async fn delete_charge(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let deleted = Charge::delete(&state.db.pool, id).await?;
    if deleted == 0 {
        return Err(ApiError::NotFound);
    }
    Ok(ResponseJson(ApiResponse::success(())))
}

/// Server-rendered financial report, served as a standalone HTML page.
pub async fn financial_report(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(period): Query<PeriodQuery>,
) -> Result<Html<String>, ApiError> {
    let html = FinanceService::financial_report_html(
        &state.db.pool,
        id,
        &ReportPeriod {
            from: period.from,
            to: period.to,
        },
        Utc::now().date_naive(),
    )
    .await?;
    Ok(Html(html))
}

pub async fn members_report(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ResponseJson<MembersReport>, ApiError> {
    let report = FinanceService::members_report(&state.db.pool, id).await?;
    Ok(ResponseJson(report))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/spaces", post(create_space))
        .route("/spaces/{id}", get(get_space))
        .route("/spaces/{id}/properties", get(list_properties))
        .route("/spaces/{id}/members", get(list_members).post(add_member))
        .route("/spaces/{id}/charges", post(create_charge))
        .route("/spaces/{id}/reports/financial", get(financial_report))
        .route("/spaces/{id}/reports/members", get(members_report))
        .route("/charges/{id}", delete(delete_charge))
}
