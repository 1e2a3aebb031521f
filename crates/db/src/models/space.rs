use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool, Type};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use uuid::Uuid;

/// Management scoping unit: one manager/owner context grouping properties
/// and members.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Space {
    pub id: Uuid,
    pub nom: String,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateSpace {
    pub nom: String,
    pub owner_id: Uuid,
}

#[derive(Debug, Clone, Type, Serialize, Deserialize, PartialEq, TS, EnumString, Display)]
#[sqlx(type_name = "member_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MemberRole {
    Proprietaire,
    Gestionnaire,
    Locataire,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct SpaceMember {
    pub id: Uuid,
    pub space_id: Uuid,
    pub user_id: Uuid,
    pub role: MemberRole,
    pub created_at: DateTime<Utc>,
}

impl Space {
    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Space>("SELECT id, nom, owner_id, created_at FROM spaces WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn create(
        pool: &SqlitePool,
        data: &CreateSpace,
        space_id: Uuid,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Space>(
            "INSERT INTO spaces (id, nom, owner_id) VALUES ($1, $2, $3) \
             RETURNING id, nom, owner_id, created_at",
        )
        .bind(space_id)
        .bind(&data.nom)
        .bind(data.owner_id)
        .fetch_one(pool)
        .await
    }
}

impl SpaceMember {
    pub async fn add(
        pool: &SqlitePool,
        space_id: Uuid,
        user_id: Uuid,
        role: MemberRole,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, SpaceMember>(
            "INSERT INTO space_members (id, space_id, user_id, role) VALUES ($1, $2, $3, $4) \
             RETURNING id, space_id, user_id, role, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(space_id)
        .bind(user_id)
        .bind(role)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_space_id(
        pool: &SqlitePool,
        space_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, SpaceMember>(
            "SELECT id, space_id, user_id, role, created_at FROM space_members \
             WHERE space_id = $1 ORDER BY created_at ASC",
        )
        .bind(space_id)
        .fetch_all(pool)
        .await
    }
}
