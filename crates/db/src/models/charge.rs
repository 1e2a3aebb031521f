use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

/// An expense booked against a space (repairs, taxes, agency costs, ...).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Charge {
    pub id: Uuid,
    pub space_id: Uuid,
    pub libelle: String,
    pub categorie: String,
    pub montant: i64,
    pub date_charge: NaiveDate,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateCharge {
    pub space_id: Uuid,
    pub libelle: String,
    pub categorie: String,
    pub montant: i64,
    pub date_charge: NaiveDate,
}

const CHARGE_COLUMNS: &str = "id, space_id, libelle, categorie, montant, date_charge, created_at";

impl Charge {
    pub async fn find_by_space_in_period(
        pool: &SqlitePool,
        space_id: Uuid,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Charge>(&format!(
            "SELECT {CHARGE_COLUMNS} FROM charges \
             WHERE space_id = $1 \
               AND ($2 IS NULL OR date_charge >= $2) \
               AND ($3 IS NULL OR date_charge <= $3) \
             ORDER BY date_charge ASC"
        ))
        .bind(space_id)
        .bind(from)
        .bind(to)
        .fetch_all(pool)
        .await
    }

    pub async fn create(
        pool: &SqlitePool,
        data: &CreateCharge,
        charge_id: Uuid,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Charge>(&format!(
            "INSERT INTO charges (id, space_id, libelle, categorie, montant, date_charge) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {CHARGE_COLUMNS}"
        ))
        .bind(charge_id)
        .bind(data.space_id)
        .bind(&data.libelle)
        .bind(&data.categorie)
        .bind(data.montant)
        .bind(data.date_charge)
        .fetch_one(pool)
        .await
    }

    pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM charges WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
