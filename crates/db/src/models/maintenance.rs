use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool, Type, types::Json};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use uuid::Uuid;

#[derive(
    Debug, Clone, Type, Serialize, Deserialize, PartialEq, TS, EnumString, Display, Default,
)]
#[sqlx(type_name = "ticket_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TicketStatus {
    #[default]
    Ouvert,
    EnCours,
    Resolu,
    Ferme,
}

#[derive(
    Debug, Clone, Type, Serialize, Deserialize, PartialEq, TS, EnumString, Display, Default,
)]
#[sqlx(type_name = "ticket_priority", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TicketPriority {
    Basse,
    #[default]
    Moyenne,
    Haute,
    Urgente,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct MaintenanceTicket {
    pub id: Uuid,
    pub lease_id: Uuid,
    pub titre: String,
    pub description: String,
    pub statut: TicketStatus,
    pub priorite: TicketPriority,
    #[sqlx(json)]
    pub photos: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateTicket {
    pub lease_id: Uuid,
    pub titre: String,
    pub description: String,
    pub priorite: Option<TicketPriority>,
}

/// One row per described status transition on a ticket.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Intervention {
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub description: String,
    pub statut_avant: TicketStatus,
    pub statut_apres: TicketStatus,
    pub created_at: DateTime<Utc>,
}

const TICKET_COLUMNS: &str =
    "id, lease_id, titre, description, statut, priorite, photos, created_at, updated_at";

impl MaintenanceTicket {
    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, MaintenanceTicket>(&format!(
            "SELECT {TICKET_COLUMNS} FROM maintenance_tickets WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_by_lease_id(
        pool: &SqlitePool,
        lease_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, MaintenanceTicket>(&format!(
            "SELECT {TICKET_COLUMNS} FROM maintenance_tickets \
             WHERE lease_id = $1 ORDER BY created_at DESC"
        ))
        .bind(lease_id)
        .fetch_all(pool)
        .await
    }

    pub async fn create(
        pool: &SqlitePool,
        data: &CreateTicket,
        ticket_id: Uuid,
    ) -> Result<Self, sqlx::Error> {
        let priorite = data.priorite.clone().unwrap_or_default();
        sqlx::query_as::<_, MaintenanceTicket>(&format!(
            "INSERT INTO maintenance_tickets (id, lease_id, titre, description, priorite) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {TICKET_COLUMNS}"
        ))
        .bind(ticket_id)
        .bind(data.lease_id)
        .bind(&data.titre)
        .bind(&data.description)
        .bind(priorite)
        .fetch_one(pool)
        .await
    }

    pub async fn update_status(
        pool: &SqlitePool,
        id: Uuid,
        statut: TicketStatus,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, MaintenanceTicket>(&format!(
            "UPDATE maintenance_tickets SET statut = $2, updated_at = CURRENT_TIMESTAMP \
             WHERE id = $1 \
             RETURNING {TICKET_COLUMNS}"
        ))
        .bind(id)
        .bind(statut)
        .fetch_one(pool)
        .await
    }

    pub async fn update_photos(
        pool: &SqlitePool,
        id: Uuid,
        photos: &[String],
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, MaintenanceTicket>(&format!(
            "UPDATE maintenance_tickets SET photos = $2, updated_at = CURRENT_TIMESTAMP \
             WHERE id = $1 \
             RETURNING {TICKET_COLUMNS}"
        ))
        .bind(id)
        .bind(Json(photos.to_vec()))
        .fetch_one(pool)
        .await
    }
}

const INTERVENTION_COLUMNS: &str =
    "id, ticket_id, description, statut_avant, statut_apres, created_at";

impl Intervention {
    pub async fn create(
        pool: &SqlitePool,
        ticket_id: Uuid,
        description: &str,
        statut_avant: TicketStatus,
        statut_apres: TicketStatus,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Intervention>(&format!(
            "INSERT INTO interventions (id, ticket_id, description, statut_avant, statut_apres) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {INTERVENTION_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(ticket_id)
        .bind(description)
        .bind(statut_avant)
        .bind(statut_apres)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_ticket_id(
        pool: &SqlitePool,
        ticket_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Intervention>(&format!(
            "SELECT {INTERVENTION_COLUMNS} FROM interventions \
             WHERE ticket_id = $1 ORDER BY created_at ASC"
        ))
        .bind(ticket_id)
        .fetch_all(pool)
        .await
    }
}
