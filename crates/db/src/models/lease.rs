use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool, Type};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use uuid::Uuid;

#[derive(
    Debug, Clone, Type, Serialize, Deserialize, PartialEq, TS, EnumString, Display, Default,
)]
#[sqlx(type_name = "lease_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LeaseStatus {
    /// Lease exists but the deposit has not been confirmed yet.
    #[default]
    AttenteCaution,
    Actif,
    Resilie,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Lease {
    pub id: Uuid,
    pub property_id: Uuid,
    pub tenant_id: Uuid,
    pub manager_id: Uuid,
    pub montant_mensuel: i64,
    pub caution_montant: i64,
    pub caution_payee: bool,
    pub date_caution_payee: Option<DateTime<Utc>>,
    pub statut: LeaseStatus,
    pub date_debut: NaiveDate,
    pub date_fin: Option<NaiveDate>,
    pub mois_avance_total: i32,
    pub mois_avance_consommes: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateLease {
    pub property_id: Uuid,
    pub tenant_id: Uuid,
    pub manager_id: Uuid,
    pub montant_mensuel: i64,
    pub caution_montant: i64,
    pub date_debut: NaiveDate,
    pub mois_avance_total: i32,
}

/// Lease joined with the property it covers, for tenant/manager dashboards.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct LeaseWithProperty {
    #[sqlx(flatten)]
    #[serde(flatten)]
    #[ts(flatten)]
    pub lease: Lease,
    pub propriete_titre: String,
    pub propriete_adresse: String,
    pub propriete_ville: String,
}

impl std::ops::Deref for LeaseWithProperty {
    type Target = Lease;
    fn deref(&self) -> &Self::Target {
        &self.lease
    }
}

const LEASE_COLUMNS: &str = "id, property_id, tenant_id, manager_id, montant_mensuel, \
     caution_montant, caution_payee, date_caution_payee, statut, date_debut, date_fin, \
     mois_avance_total, mois_avance_consommes, created_at, updated_at";

const LEASE_JOIN_COLUMNS: &str = "l.id, l.property_id, l.tenant_id, l.manager_id, \
     l.montant_mensuel, l.caution_montant, l.caution_payee, l.date_caution_payee, l.statut, \
     l.date_debut, l.date_fin, l.mois_avance_total, l.mois_avance_consommes, l.created_at, \
     l.updated_at, p.titre AS propriete_titre, p.adresse AS propriete_adresse, \
     p.ville AS propriete_ville";

impl Lease {
    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Lease>(&format!(
            "SELECT {LEASE_COLUMNS} FROM leases WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_by_property_id(
        pool: &SqlitePool,
        property_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Lease>(&format!(
            "SELECT {LEASE_COLUMNS} FROM leases WHERE property_id = $1 ORDER BY created_at DESC"
        ))
        .bind(property_id)
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_tenant_id(
        pool: &SqlitePool,
        tenant_id: Uuid,
    ) -> Result<Vec<LeaseWithProperty>, sqlx::Error> {
        sqlx::query_as::<_, LeaseWithProperty>(&format!(
            "SELECT {LEASE_JOIN_COLUMNS} FROM leases l \
             JOIN properties p ON p.id = l.property_id \
             WHERE l.tenant_id = $1 ORDER BY l.created_at DESC"
        ))
        .bind(tenant_id)
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_manager_id(
        pool: &SqlitePool,
        manager_id: Uuid,
    ) -> Result<Vec<LeaseWithProperty>, sqlx::Error> {
        sqlx::query_as::<_, LeaseWithProperty>(&format!(
            "SELECT {LEASE_JOIN_COLUMNS} FROM leases l \
             JOIN properties p ON p.id = l.property_id \
             WHERE l.manager_id = $1 ORDER BY l.created_at DESC"
        ))
        .bind(manager_id)
        .fetch_all(pool)
        .await
    }

    pub async fn create(
        pool: &SqlitePool,
        data: &CreateLease,
        lease_id: Uuid,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Lease>(&format!(
            "INSERT INTO leases (id, property_id, tenant_id, manager_id, montant_mensuel, \
             caution_montant, date_debut, mois_avance_total) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {LEASE_COLUMNS}"
        ))
        .bind(lease_id)
        .bind(data.property_id)
        .bind(data.tenant_id)
        .bind(data.manager_id)
        .bind(data.montant_mensuel)
        .bind(data.caution_montant)
        .bind(data.date_debut)
        .bind(data.mois_avance_total)
        .fetch_one(pool)
        .await
    }

    /// Deposit confirmed: flag the caution as paid and activate the lease.
    pub async fn mark_deposit_paid(
        pool: &SqlitePool,
        id: Uuid,
        paid_at: DateTime<Utc>,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Lease>(&format!(
            "UPDATE leases \
             SET caution_payee = 1, statut = 'actif', date_caution_payee = $2, \
                 updated_at = CURRENT_TIMESTAMP \
             WHERE id = $1 \
             RETURNING {LEASE_COLUMNS}"
        ))
        .bind(id)
        .bind(paid_at)
        .fetch_one(pool)
        .await
    }

    /// Consume one pre-paid advance month. Bounded at `mois_avance_total`;
    /// returns false when nothing was left to consume.
    pub async fn consume_advance_month(pool: &SqlitePool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE leases \
             SET mois_avance_consommes = mois_avance_consommes + 1, \
                 updated_at = CURRENT_TIMESTAMP \
             WHERE id = $1 AND mois_avance_consommes < mois_avance_total",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn terminate(
        pool: &SqlitePool,
        id: Uuid,
        date_fin: NaiveDate,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Lease>(&format!(
            "UPDATE leases \
             SET statut = 'resilie', date_fin = $2, updated_at = CURRENT_TIMESTAMP \
             WHERE id = $1 \
             RETURNING {LEASE_COLUMNS}"
        ))
        .bind(id)
        .bind(date_fin)
        .fetch_one(pool)
        .await
    }
}
