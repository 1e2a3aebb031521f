use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool, Type};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use uuid::Uuid;

#[derive(
    Debug, Clone, Type, Serialize, Deserialize, PartialEq, TS, EnumString, Display, Default,
)]
#[sqlx(type_name = "payment_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    EnAttente,
    /// Receipt uploaded by the manager, awaiting tenant confirmation.
    EnCours,
    Reussi,
    Echoue,
}

#[derive(Debug, Clone, Type, Serialize, Deserialize, PartialEq, TS, EnumString, Display)]
#[sqlx(type_name = "payment_method", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PaymentMethod {
    Especes,
    MobileMoney,
    Virement,
    Carte,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Payment {
    pub id: Uuid,
    pub lease_id: Uuid,
    pub montant: i64,
    pub mois_concerne: NaiveDate,
    pub statut: PaymentStatus,
    pub methode: Option<PaymentMethod>,
    pub recu_url: Option<String>,
    pub transaction_id: Option<String>,
    pub recu_uploaded_at: Option<DateTime<Utc>>,
    pub date_paiement: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreatePayment {
    pub lease_id: Uuid,
    pub montant: i64,
    pub mois_concerne: NaiveDate,
    pub methode: Option<PaymentMethod>,
}

const PAYMENT_COLUMNS: &str = "id, lease_id, montant, mois_concerne, statut, methode, recu_url, \
     transaction_id, recu_uploaded_at, date_paiement, created_at";

impl Payment {
    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Payment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_by_lease_id(
        pool: &SqlitePool,
        lease_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Payment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE lease_id = $1 ORDER BY mois_concerne ASC"
        ))
        .bind(lease_id)
        .fetch_all(pool)
        .await
    }

    /// All payments for a space's properties, optionally bounded by due month.
    pub async fn find_by_space_in_period(
        pool: &SqlitePool,
        space_id: Uuid,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Payment>(
            "SELECT pay.id, pay.lease_id, pay.montant, pay.mois_concerne, pay.statut, \
                    pay.methode, pay.recu_url, pay.transaction_id, pay.recu_uploaded_at, \
                    pay.date_paiement, pay.created_at \
             FROM payments pay \
             JOIN leases l ON l.id = pay.lease_id \
             JOIN properties p ON p.id = l.property_id \
             WHERE p.space_id = $1 \
               AND ($2 IS NULL OR pay.mois_concerne >= $2) \
               AND ($3 IS NULL OR pay.mois_concerne <= $3) \
             ORDER BY pay.mois_concerne ASC",
        )
        .bind(space_id)
        .bind(from)
        .bind(to)
        .fetch_all(pool)
        .await
    }

    /// The deposit payment is identified by amount equality with the lease's
    /// caution, not by an explicit flag. Fragile, but faithful to how the rows
    /// were written.
    pub async fn find_deposit_for_lease(
        pool: &SqlitePool,
        lease_id: Uuid,
        caution_montant: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Payment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments \
             WHERE lease_id = $1 AND montant = $2 AND statut != 'reussi' \
             ORDER BY created_at ASC LIMIT 1"
        ))
        .bind(lease_id)
        .bind(caution_montant)
        .fetch_optional(pool)
        .await
    }

    pub async fn create(
        pool: &SqlitePool,
        data: &CreatePayment,
        payment_id: Uuid,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Payment>(&format!(
            "INSERT INTO payments (id, lease_id, montant, mois_concerne, methode) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {PAYMENT_COLUMNS}"
        ))
        .bind(payment_id)
        .bind(data.lease_id)
        .bind(data.montant)
        .bind(data.mois_concerne)
        .bind(&data.methode)
        .fetch_one(pool)
        .await
    }

    /// Manager uploaded a receipt: record it and hand the payment over to the
    /// tenant for confirmation.
    pub async fn attach_receipt(
        pool: &SqlitePool,
        id: Uuid,
        recu_url: &str,
        uploaded_at: DateTime<Utc>,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Payment>(&format!(
            "UPDATE payments \
             SET recu_url = $2, recu_uploaded_at = $3, statut = 'en_cours' \
             WHERE id = $1 \
             RETURNING {PAYMENT_COLUMNS}"
        ))
        .bind(id)
        .bind(recu_url)
        .bind(uploaded_at)
        .fetch_one(pool)
        .await
    }

    pub async fn mark_succeeded(
        pool: &SqlitePool,
        id: Uuid,
        paid_at: DateTime<Utc>,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Payment>(&format!(
            "UPDATE payments \
             SET statut = 'reussi', date_paiement = $2 \
             WHERE id = $1 \
             RETURNING {PAYMENT_COLUMNS}"
        ))
        .bind(id)
        .bind(paid_at)
        .fetch_one(pool)
        .await
    }
}
