use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool, Type};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use uuid::Uuid;

#[derive(
    Debug, Clone, Type, Serialize, Deserialize, PartialEq, TS, EnumString, Display, Default,
)]
#[sqlx(type_name = "rental_request_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RentalRequestStatus {
    #[default]
    EnAttente,
    Approuvee,
    Rejetee,
}

/// A tenant's application for a property; approval turns it into a lease.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct RentalRequest {
    pub id: Uuid,
    pub property_id: Uuid,
    pub tenant_id: Uuid,
    pub message: Option<String>,
    pub statut: RentalRequestStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateRentalRequest {
    pub property_id: Uuid,
    pub tenant_id: Uuid,
    pub message: Option<String>,
}

const REQUEST_COLUMNS: &str =
    "id, property_id, tenant_id, message, statut, created_at, updated_at";

impl RentalRequest {
    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, RentalRequest>(&format!(
            "SELECT {REQUEST_COLUMNS} FROM rental_requests WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_by_property_id(
        pool: &SqlitePool,
        property_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, RentalRequest>(&format!(
            "SELECT {REQUEST_COLUMNS} FROM rental_requests \
             WHERE property_id = $1 ORDER BY created_at DESC"
        ))
        .bind(property_id)
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_tenant_id(
        pool: &SqlitePool,
        tenant_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, RentalRequest>(&format!(
            "SELECT {REQUEST_COLUMNS} FROM rental_requests \
             WHERE tenant_id = $1 ORDER BY created_at DESC"
        ))
        .bind(tenant_id)
        .fetch_all(pool)
        .await
    }

    pub async fn create(
        pool: &SqlitePool,
        data: &CreateRentalRequest,
        request_id: Uuid,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, RentalRequest>(&format!(
            "INSERT INTO rental_requests (id, property_id, tenant_id, message) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {REQUEST_COLUMNS}"
        ))
        .bind(request_id)
        .bind(data.property_id)
        .bind(data.tenant_id)
        .bind(&data.message)
        .fetch_one(pool)
        .await
    }

    pub async fn update_status(
        pool: &SqlitePool,
        id: Uuid,
        statut: RentalRequestStatus,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, RentalRequest>(&format!(
            "UPDATE rental_requests SET statut = $2, updated_at = CURRENT_TIMESTAMP \
             WHERE id = $1 \
             RETURNING {REQUEST_COLUMNS}"
        ))
        .bind(id)
        .bind(statut)
        .fetch_one(pool)
        .await
    }
}
