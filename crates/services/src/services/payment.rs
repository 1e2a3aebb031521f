//! Payment confirmation flow: receipt upload by the manager, finalization by
//! the tenant.

use chrono::{NaiveDate, Utc};
use db::models::{
    lease::Lease,
    payment::{CreatePayment, Payment, PaymentMethod, PaymentStatus},
};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use super::{
    events::{ChangeOp, EventService},
    lease::{LeaseError, LeaseService},
    notification::NotificationService,
    storage::{FileStorage, StorageError},
};

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("payment not found")]
    PaymentNotFound,
    #[error("lease not found")]
    LeaseNotFound,
    #[error("payment already succeeded and is immutable")]
    AlreadySucceeded,
    #[error("payment is {0}, not awaiting tenant confirmation")]
    NotAwaitingConfirmation(PaymentStatus),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Lease(#[from] LeaseError),
}

pub struct PaymentService;

impl PaymentService {
    /// Open a pending rent payment for a given month of an existing lease.
    pub async fn create_rent_payment(
        pool: &SqlitePool,
        events: &EventService,
        lease_id: Uuid,
        mois_concerne: NaiveDate,
        methode: Option<PaymentMethod>,
    ) -> Result<Payment, PaymentError> {
        let lease = Lease::find_by_id(pool, lease_id)
            .await?
            .ok_or(PaymentError::LeaseNotFound)?;

        let payment = Payment::create(
            pool,
            &CreatePayment {
                lease_id: lease.id,
                montant: lease.montant_mensuel,
                mois_concerne,
                methode,
            },
            Uuid::new_v4(),
        )
        .await?;
        events.publish("payments", ChangeOp::Insert, payment.id);
        Ok(payment)
    }

    /// Manager-side action: store the receipt, hand the payment to the tenant
    /// for confirmation, and tell the tenant about it.
    pub async fn upload_receipt(
        pool: &SqlitePool,
        storage: &dyn FileStorage,
        events: &EventService,
        payment_id: Uuid,
        filename: &str,
        bytes: &[u8],
    ) -> Result<Payment, PaymentError> {
        let payment = Payment::find_by_id(pool, payment_id)
            .await?
            .ok_or(PaymentError::PaymentNotFound)?;
        if payment.statut == PaymentStatus::Reussi {
            return Err(PaymentError::AlreadySucceeded);
        }

        let object_name = format!("{}_{}", payment.id, filename);
        let url = storage.store("recus", &object_name, bytes).await?;

        let payment = Payment::attach_receipt(pool, payment.id, &url, Utc::now()).await?;
        events.publish("payments", ChangeOp::Update, payment.id);

        let lease = Lease::find_by_id(pool, payment.lease_id)
            .await?
            .ok_or(PaymentError::LeaseNotFound)?;
        NotificationService::notify_user(
            pool,
            lease.tenant_id,
            "Reçu de paiement disponible",
            "Un reçu a été déposé pour votre paiement, merci de le confirmer.",
            Some(&format!("/payments/{}", payment.id)),
        )
        .await?;

        info!(payment_id = %payment.id, "receipt uploaded, awaiting tenant confirmation");
        Ok(payment)
    }

    /// Tenant-side finalization of a payment whose receipt was uploaded.
    ///
    /// A payment matching the lease's caution amount is treated as the deposit
    /// payment (value equality, no explicit flag) and activates the lease;
    /// any other amount is a rent payment that consumes an advance month while
    /// some remain.
    pub async fn confirm_by_tenant(
        pool: &SqlitePool,
        events: &EventService,
        payment_id: Uuid,
    ) -> Result<Payment, PaymentError> {
        let payment = Payment::find_by_id(pool, payment_id)
            .await?
            .ok_or(PaymentError::PaymentNotFound)?;

        if payment.statut == PaymentStatus::Reussi {
            debug!(payment_id = %payment.id, "payment already confirmed, skipping");
            return Ok(payment);
        }
        if payment.statut != PaymentStatus::EnCours {
            return Err(PaymentError::NotAwaitingConfirmation(payment.statut));
        }

        let lease = Lease::find_by_id(pool, payment.lease_id)
            .await?
            .ok_or(PaymentError::LeaseNotFound)?;

        let payment = Payment::mark_succeeded(pool, payment.id, Utc::now()).await?;
        events.publish("payments", ChangeOp::Update, payment.id);

        if payment.montant == lease.caution_montant {
            LeaseService::confirm_deposit_payment(pool, events, lease.id).await?;
        } else {
            let consumed = Lease::consume_advance_month(pool, lease.id).await?;
            debug!(
                lease_id = %lease.id,
                consumed = consumed,
                "rent payment confirmed"
            );
            events.publish("leases", ChangeOp::Update, lease.id);
        }

        info!(payment_id = %payment.id, montant = payment.montant, "payment confirmed");
        Ok(payment)
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use db::models::{lease::LeaseStatus, notification::Notification};

    use super::*;
    use crate::services::{
        lease::CreateDirectLease,
        test_support::{seed_property, seed_space, test_pool},
    };

    struct FakeStorage;

    #[async_trait]
    impl FileStorage for FakeStorage {
        async fn store(
            &self,
            bucket: &str,
            name: &str,
            _bytes: &[u8],
        ) -> Result<String, StorageError> {
            Ok(format!("http://files.test/{bucket}/{name}"))
        }
    }

    fn month(year: i32, month: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, 1).unwrap()
    }

    async fn seed_pending_deposit(pool: &sqlx::SqlitePool, events: &EventService) -> (Lease, Payment) {
        let space = seed_space(pool).await;
        let property = seed_property(pool, space.id, 100_000).await;
        LeaseService::create_direct_lease(
            pool,
            events,
            &CreateDirectLease {
                property_id: property.id,
                tenant_id: Uuid::new_v4(),
                date_debut: month(2026, 9),
            },
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_upload_receipt_flips_status_and_notifies_tenant() {
        let pool = test_pool().await;
        let events = EventService::default();
        let (lease, payment) = seed_pending_deposit(&pool, &events).await;

        let payment = PaymentService::upload_receipt(
            &pool,
            &FakeStorage,
            &events,
            payment.id,
            "recu.pdf",
            b"pdf-bytes",
        )
        .await
        .unwrap();

        assert_eq!(payment.statut, PaymentStatus::EnCours);
        assert!(payment.recu_uploaded_at.is_some());
        assert_eq!(
            payment.recu_url.as_deref(),
            Some(format!("http://files.test/recus/{}_recu.pdf", payment.id).as_str())
        );

        let notifications = Notification::find_by_user_id(&pool, lease.tenant_id)
            .await
            .unwrap();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].titre, "Reçu de paiement disponible");
    }

    #[tokio::test]
    async fn test_tenant_confirmation_of_deposit_activates_lease() {
        let pool = test_pool().await;
        let events = EventService::default();
        let (lease, payment) = seed_pending_deposit(&pool, &events).await;

        PaymentService::upload_receipt(&pool, &FakeStorage, &events, payment.id, "recu.pdf", b"x")
            .await
            .unwrap();
        let payment = PaymentService::confirm_by_tenant(&pool, &events, payment.id)
            .await
            .unwrap();

        assert_eq!(payment.statut, PaymentStatus::Reussi);
        assert!(payment.date_paiement.is_some());

        // Amount equals the caution, so the deposit path ran.
        let lease = Lease::find_by_id(&pool, lease.id).await.unwrap().unwrap();
        assert!(lease.caution_payee);
        assert_eq!(lease.statut, LeaseStatus::Actif);
    }

    #[tokio::test]
    async fn test_confirm_requires_uploaded_receipt() {
        let pool = test_pool().await;
        let events = EventService::default();
        let (_, payment) = seed_pending_deposit(&pool, &events).await;

        let err = PaymentService::confirm_by_tenant(&pool, &events, payment.id)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PaymentError::NotAwaitingConfirmation(PaymentStatus::EnAttente)
        ));
    }

    #[tokio::test]
    async fn test_advance_month_consumption_is_bounded() {
        let pool = test_pool().await;
        let events = EventService::default();
        let (lease, deposit) = seed_pending_deposit(&pool, &events).await;
        PaymentService::upload_receipt(&pool, &FakeStorage, &events, deposit.id, "recu.pdf", b"x")
            .await
            .unwrap();
        PaymentService::confirm_by_tenant(&pool, &events, deposit.id)
            .await
            .unwrap();

        // Three confirmed rent months against two advance months.
        for m in [month(2026, 11), month(2026, 12), month(2027, 1)] {
            let rent = PaymentService::create_rent_payment(&pool, &events, lease.id, m, None)
                .await
                .unwrap();
            PaymentService::upload_receipt(&pool, &FakeStorage, &events, rent.id, "recu.pdf", b"x")
                .await
                .unwrap();
            PaymentService::confirm_by_tenant(&pool, &events, rent.id)
                .await
                .unwrap();
        }

        let lease = Lease::find_by_id(&pool, lease.id).await.unwrap().unwrap();
        assert_eq!(lease.mois_avance_consommes, lease.mois_avance_total);
        assert_eq!(lease.mois_avance_consommes, 2);
    }

    #[tokio::test]
    async fn test_receipt_upload_rejected_on_succeeded_payment() {
        let pool = test_pool().await;
        let events = EventService::default();
        let (_, payment) = seed_pending_deposit(&pool, &events).await;
        PaymentService::upload_receipt(&pool, &FakeStorage, &events, payment.id, "recu.pdf", b"x")
            .await
            .unwrap();
        PaymentService::confirm_by_tenant(&pool, &events, payment.id)
            .await
            .unwrap();

        let err = PaymentService::upload_receipt(
            &pool,
            &FakeStorage,
            &events,
            payment.id,
            "recu2.pdf",
            b"x",
        )
        .await
        .unwrap_err();
        assert!(matches!(err, PaymentError::AlreadySucceeded));
    }
}
