//! Lease lifecycle: from rental request to an active, paid lease.

use chrono::{NaiveDate, Utc};
use db::models::{
    lease::{CreateLease, Lease, LeaseStatus},
    payment::{CreatePayment, Payment},
    property::{Property, PropertyStatus},
    rental_request::{RentalRequest, RentalRequestStatus},
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{debug, info};
use ts_rs::TS;
use uuid::Uuid;

use super::{
    events::{ChangeOp, EventService},
    notification::NotificationService,
};

/// Deposit policy for the direct-payment flow: 2 months advance + 2 months
/// guarantee + 1 month agency fee. Fixed, not configurable.
pub const DEPOSIT_MONTHS: i64 = 5;
/// Of which two months are pre-paid rent, consumed before monthly billing
/// resumes.
pub const ADVANCE_MONTHS: i32 = 2;

#[derive(Debug, Error)]
pub enum LeaseError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("property not found")]
    PropertyNotFound,
    #[error("lease not found")]
    LeaseNotFound,
    #[error("rental request not found")]
    RequestNotFound,
    #[error("rental request is {0}, expected en_attente")]
    RequestNotPending(RentalRequestStatus),
    #[error("property is {0}, not available for a new lease")]
    PropertyUnavailable(PropertyStatus),
    #[error("unsupported lease transition from {from} to {to}")]
    UnsupportedTransition { from: LeaseStatus, to: LeaseStatus },
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateDirectLease {
    pub property_id: Uuid,
    pub tenant_id: Uuid,
    pub date_debut: NaiveDate,
}

pub struct LeaseService;

impl LeaseService {
    /// Direct-payment flow: create the lease and its deposit payment in one
    /// call. The deposit is 5x the property's monthly rent.
    ///
    /// The two inserts are sequential, not transactional: if the payment
    /// insert fails the lease stays in attente_caution with no payment row.
    /// Callers (and the recovery path) must tolerate that state.
    pub async fn create_direct_lease(
        pool: &SqlitePool,
        events: &EventService,
        data: &CreateDirectLease,
    ) -> Result<(Lease, Payment), LeaseError> {
        let property = Property::find_by_id(pool, data.property_id)
            .await?
            .ok_or(LeaseError::PropertyNotFound)?;

        if property.statut != PropertyStatus::Disponible {
            return Err(LeaseError::PropertyUnavailable(property.statut));
        }

        let caution = property.prix_mensuel * DEPOSIT_MONTHS;
        let lease = Lease::create(
            pool,
            &CreateLease {
                property_id: property.id,
                tenant_id: data.tenant_id,
                manager_id: property.manager_id,
                montant_mensuel: property.prix_mensuel,
                caution_montant: caution,
                date_debut: data.date_debut,
                mois_avance_total: ADVANCE_MONTHS,
            },
            Uuid::new_v4(),
        )
        .await?;
        events.publish("leases", ChangeOp::Insert, lease.id);

        let payment = Payment::create(
            pool,
            &CreatePayment {
                lease_id: lease.id,
                montant: caution,
                mois_concerne: data.date_debut,
                methode: None,
            },
            Uuid::new_v4(),
        )
        .await?;
        events.publish("payments", ChangeOp::Insert, payment.id);

        info!(
            lease_id = %lease.id,
            property_id = %property.id,
            caution = caution,
            "direct lease created, awaiting deposit"
        );
        Ok((lease, payment))
    }

    /// Deposit confirmed: activate the lease and mark the property rented.
    /// Idempotent: confirming an already-active lease is a no-op.
    pub async fn confirm_deposit_payment(
        pool: &SqlitePool,
        events: &EventService,
        lease_id: Uuid,
    ) -> Result<Lease, LeaseError> {
        let lease = Lease::find_by_id(pool, lease_id)
            .await?
            .ok_or(LeaseError::LeaseNotFound)?;

        if lease.statut == LeaseStatus::Actif && lease.caution_payee {
            debug!(lease_id = %lease.id, "deposit already confirmed, skipping");
            return Ok(lease);
        }
        if lease.statut == LeaseStatus::Resilie {
            return Err(LeaseError::UnsupportedTransition {
                from: LeaseStatus::Resilie,
                to: LeaseStatus::Actif,
            });
        }

        // The deposit payment row is found by amount equality with the
        // lease's caution; it may be missing if the second half of
        // create_direct_lease failed.
        if let Some(deposit) =
            Payment::find_deposit_for_lease(pool, lease.id, lease.caution_montant).await?
        {
            Payment::mark_succeeded(pool, deposit.id, Utc::now()).await?;
            events.publish("payments", ChangeOp::Update, deposit.id);
        }

        let lease = Lease::mark_deposit_paid(pool, lease.id, Utc::now()).await?;
        Property::update_status(pool, lease.property_id, PropertyStatus::Loue).await?;
        events.publish("leases", ChangeOp::Update, lease.id);
        events.publish("properties", ChangeOp::Update, lease.property_id);

        NotificationService::notify_user(
            pool,
            lease.tenant_id,
            "Caution confirmée",
            "Votre caution a été confirmée, le bail est maintenant actif.",
            Some(&format!("/leases/{}", lease.id)),
        )
        .await?;

        info!(lease_id = %lease.id, "lease activated");
        Ok(lease)
    }

    /// Manager approval of a tenant's rental request; runs the direct-lease
    /// flow on success.
    pub async fn approve_rental_request(
        pool: &SqlitePool,
        events: &EventService,
        request_id: Uuid,
        date_debut: NaiveDate,
    ) -> Result<(Lease, Payment), LeaseError> {
        let request = RentalRequest::find_by_id(pool, request_id)
            .await?
            .ok_or(LeaseError::RequestNotFound)?;
        if request.statut != RentalRequestStatus::EnAttente {
            return Err(LeaseError::RequestNotPending(request.statut));
        }

        let request = RentalRequest::update_status(pool, request.id, RentalRequestStatus::Approuvee).await?;
        events.publish("rental_requests", ChangeOp::Update, request.id);

        let (lease, payment) = Self::create_direct_lease(
            pool,
            events,
            &CreateDirectLease {
                property_id: request.property_id,
                tenant_id: request.tenant_id,
                date_debut,
            },
        )
        .await?;

        NotificationService::notify_user(
            pool,
            request.tenant_id,
            "Demande approuvée",
            "Votre demande de location a été approuvée. Le paiement de la caution est attendu.",
            Some(&format!("/leases/{}", lease.id)),
        )
        .await?;

        Ok((lease, payment))
    }

    pub async fn reject_rental_request(
        pool: &SqlitePool,
        events: &EventService,
        request_id: Uuid,
    ) -> Result<RentalRequest, LeaseError> {
        let request = RentalRequest::find_by_id(pool, request_id)
            .await?
            .ok_or(LeaseError::RequestNotFound)?;
        if request.statut != RentalRequestStatus::EnAttente {
            return Err(LeaseError::RequestNotPending(request.statut));
        }

        let request = RentalRequest::update_status(pool, request.id, RentalRequestStatus::Rejetee).await?;
        events.publish("rental_requests", ChangeOp::Update, request.id);

        NotificationService::notify_user(
            pool,
            request.tenant_id,
            "Demande rejetée",
            "Votre demande de location n'a pas été retenue.",
            None,
        )
        .await?;

        Ok(request)
    }

    /// Soft termination at lease end; the property becomes available again.
    /// Only an active lease can be terminated.
    pub async fn terminate_lease(
        pool: &SqlitePool,
        events: &EventService,
        lease_id: Uuid,
        date_fin: NaiveDate,
    ) -> Result<Lease, LeaseError> {
        let lease = Lease::find_by_id(pool, lease_id)
            .await?
            .ok_or(LeaseError::LeaseNotFound)?;
        if lease.statut != LeaseStatus::Actif {
            return Err(LeaseError::UnsupportedTransition {
                from: lease.statut,
                to: LeaseStatus::Resilie,
            });
        }

        let lease = Lease::terminate(pool, lease.id, date_fin).await?;
        Property::update_status(pool, lease.property_id, PropertyStatus::Disponible).await?;
        events.publish("leases", ChangeOp::Update, lease.id);
        events.publish("properties", ChangeOp::Update, lease.property_id);

        info!(lease_id = %lease.id, "lease terminated");
        Ok(lease)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use db::models::{
        payment::PaymentStatus,
        rental_request::{CreateRentalRequest, RentalRequest},
    };

    use super::*;
    use crate::services::test_support::{seed_property, seed_space, test_pool};

    fn start_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 9, 1).unwrap()
    }

    #[tokio::test]
    async fn test_direct_lease_deposit_is_five_months_rent() {
        let pool = test_pool().await;
        let events = EventService::default();
        let space = seed_space(&pool).await;
        let property = seed_property(&pool, space.id, 100_000).await;

        let (lease, payment) = LeaseService::create_direct_lease(
            &pool,
            &events,
            &CreateDirectLease {
                property_id: property.id,
                tenant_id: Uuid::new_v4(),
                date_debut: start_date(),
            },
        )
        .await
        .unwrap();

        assert_eq!(lease.caution_montant, 500_000);
        assert_eq!(lease.statut, LeaseStatus::AttenteCaution);
        assert!(!lease.caution_payee);
        assert_eq!(lease.mois_avance_total, ADVANCE_MONTHS);

        let payments = Payment::find_by_lease_id(&pool, lease.id).await.unwrap();
        assert_eq!(payments.len(), 1);
        assert_eq!(payments[0].id, payment.id);
        assert_eq!(payments[0].montant, 500_000);
        assert_eq!(payments[0].statut, PaymentStatus::EnAttente);
    }

    #[tokio::test]
    async fn test_direct_lease_rejects_unavailable_property() {
        let pool = test_pool().await;
        let events = EventService::default();
        let space = seed_space(&pool).await;
        let property = seed_property(&pool, space.id, 80_000).await;
        Property::update_status(&pool, property.id, PropertyStatus::Loue)
            .await
            .unwrap();

        let err = LeaseService::create_direct_lease(
            &pool,
            &events,
            &CreateDirectLease {
                property_id: property.id,
                tenant_id: Uuid::new_v4(),
                date_debut: start_date(),
            },
        )
        .await
        .unwrap_err();

        assert!(matches!(err, LeaseError::PropertyUnavailable(PropertyStatus::Loue)));
    }

    #[tokio::test]
    async fn test_confirm_deposit_activates_lease_and_property() {
        let pool = test_pool().await;
        let events = EventService::default();
        let space = seed_space(&pool).await;
        let property = seed_property(&pool, space.id, 100_000).await;
        let (lease, _) = LeaseService::create_direct_lease(
            &pool,
            &events,
            &CreateDirectLease {
                property_id: property.id,
                tenant_id: Uuid::new_v4(),
                date_debut: start_date(),
            },
        )
        .await
        .unwrap();

        let lease = LeaseService::confirm_deposit_payment(&pool, &events, lease.id)
            .await
            .unwrap();

        // caution_payee implies actif, never one without the other.
        assert!(lease.caution_payee);
        assert_eq!(lease.statut, LeaseStatus::Actif);
        assert!(lease.date_caution_payee.is_some());

        let property = Property::find_by_id(&pool, property.id).await.unwrap().unwrap();
        assert_eq!(property.statut, PropertyStatus::Loue);

        let payments = Payment::find_by_lease_id(&pool, lease.id).await.unwrap();
        assert_eq!(payments[0].statut, PaymentStatus::Reussi);
    }

    #[tokio::test]
    async fn test_confirm_deposit_is_idempotent() {
        let pool = test_pool().await;
        let events = EventService::default();
        let space = seed_space(&pool).await;
        let property = seed_property(&pool, space.id, 100_000).await;
        let (lease, _) = LeaseService::create_direct_lease(
            &pool,
            &events,
            &CreateDirectLease {
                property_id: property.id,
                tenant_id: Uuid::new_v4(),
                date_debut: start_date(),
            },
        )
        .await
        .unwrap();

        let first = LeaseService::confirm_deposit_payment(&pool, &events, lease.id)
            .await
            .unwrap();
        let second = LeaseService::confirm_deposit_payment(&pool, &events, lease.id)
            .await
            .unwrap();

        assert_eq!(first.statut, second.statut);
        assert_eq!(first.date_caution_payee, second.date_caution_payee);
        assert_eq!(first.updated_at, second.updated_at);

        // Only the activation notification from the first call.
        let notifications =
            db::models::notification::Notification::find_by_user_id(&pool, lease.tenant_id)
                .await
                .unwrap();
        assert_eq!(notifications.len(), 1);
    }

    #[tokio::test]
    async fn test_confirm_deposit_tolerates_missing_payment_row() {
        let pool = test_pool().await;
        let events = EventService::default();
        let space = seed_space(&pool).await;
        let property = seed_property(&pool, space.id, 100_000).await;

        // A lease whose deposit payment insert never happened, the state
        // create_direct_lease leaves behind when its second write fails.
        let lease = Lease::create(
            &pool,
            &CreateLease {
                property_id: property.id,
                tenant_id: Uuid::new_v4(),
                manager_id: property.manager_id,
                montant_mensuel: property.prix_mensuel,
                caution_montant: property.prix_mensuel * DEPOSIT_MONTHS,
                date_debut: start_date(),
                mois_avance_total: ADVANCE_MONTHS,
            },
            Uuid::new_v4(),
        )
        .await
        .unwrap();
        assert!(Payment::find_by_lease_id(&pool, lease.id).await.unwrap().is_empty());

        let lease = LeaseService::confirm_deposit_payment(&pool, &events, lease.id)
            .await
            .unwrap();

        assert!(lease.caution_payee);
        assert_eq!(lease.statut, LeaseStatus::Actif);

        let property = Property::find_by_id(&pool, property.id).await.unwrap().unwrap();
        assert_eq!(property.statut, PropertyStatus::Loue);
    }

    #[tokio::test]
    async fn test_confirm_deposit_rejected_on_terminated_lease() {
        let pool = test_pool().await;
        let events = EventService::default();
        let space = seed_space(&pool).await;
        let property = seed_property(&pool, space.id, 100_000).await;
        let (lease, _) = LeaseService::create_direct_lease(
            &pool,
            &events,
            &CreateDirectLease {
                property_id: property.id,
                tenant_id: Uuid::new_v4(),
                date_debut: start_date(),
            },
        )
        .await
        .unwrap();
        LeaseService::confirm_deposit_payment(&pool, &events, lease.id)
            .await
            .unwrap();
        LeaseService::terminate_lease(
            &pool,
            &events,
            lease.id,
            NaiveDate::from_ymd_opt(2027, 8, 31).unwrap(),
        )
        .await
        .unwrap();

        let err = LeaseService::confirm_deposit_payment(&pool, &events, lease.id)
            .await
            .unwrap_err();
        assert!(matches!(err, LeaseError::UnsupportedTransition { .. }));
    }

    #[tokio::test]
    async fn test_terminate_requires_active_lease() {
        let pool = test_pool().await;
        let events = EventService::default();
        let space = seed_space(&pool).await;
        let property = seed_property(&pool, space.id, 100_000).await;
        let (lease, _) = LeaseService::create_direct_lease(
            &pool,
            &events,
            &CreateDirectLease {
                property_id: property.id,
                tenant_id: Uuid::new_v4(),
                date_debut: start_date(),
            },
        )
        .await
        .unwrap();

        let err = LeaseService::terminate_lease(
            &pool,
            &events,
            lease.id,
            NaiveDate::from_ymd_opt(2027, 8, 31).unwrap(),
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            LeaseError::UnsupportedTransition {
                from: LeaseStatus::AttenteCaution,
                to: LeaseStatus::Resilie,
            }
        ));
    }

    #[tokio::test]
    async fn test_approve_rental_request_creates_lease_and_payment() {
        let pool = test_pool().await;
        let events = EventService::default();
        let space = seed_space(&pool).await;
        let property = seed_property(&pool, space.id, 75_000).await;
        let tenant_id = Uuid::new_v4();
        let request = RentalRequest::create(
            &pool,
            &CreateRentalRequest {
                property_id: property.id,
                tenant_id,
                message: Some("Je suis intéressé".to_string()),
            },
            Uuid::new_v4(),
        )
        .await
        .unwrap();

        let (lease, payment) =
            LeaseService::approve_rental_request(&pool, &events, request.id, start_date())
                .await
                .unwrap();

        assert_eq!(lease.tenant_id, tenant_id);
        assert_eq!(lease.caution_montant, 375_000);
        assert_eq!(payment.montant, 375_000);

        let request = RentalRequest::find_by_id(&pool, request.id).await.unwrap().unwrap();
        assert_eq!(request.statut, RentalRequestStatus::Approuvee);
    }

    #[tokio::test]
    async fn test_approve_rejects_non_pending_request() {
        let pool = test_pool().await;
        let events = EventService::default();
        let space = seed_space(&pool).await;
        let property = seed_property(&pool, space.id, 75_000).await;
        let request = RentalRequest::create(
            &pool,
            &CreateRentalRequest {
                property_id: property.id,
                tenant_id: Uuid::new_v4(),
                message: None,
            },
            Uuid::new_v4(),
        )
        .await
        .unwrap();
        LeaseService::reject_rental_request(&pool, &events, request.id)
            .await
            .unwrap();

        let err = LeaseService::approve_rental_request(&pool, &events, request.id, start_date())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LeaseError::RequestNotPending(RentalRequestStatus::Rejetee)
        ));
    }
}
