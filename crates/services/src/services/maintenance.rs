//! Maintenance tickets and their intervention history.

use db::models::{
    lease::Lease,
    maintenance::{CreateTicket, Intervention, MaintenanceTicket, TicketStatus},
};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use super::{
    events::{ChangeOp, EventService},
    storage::{FileStorage, StorageError},
};

#[derive(Debug, Error)]
pub enum MaintenanceError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("ticket not found")]
    TicketNotFound,
    #[error("lease not found")]
    LeaseNotFound,
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

/// A photo attached to a new ticket: original file name plus raw bytes.
pub type TicketPhoto = (String, Vec<u8>);

pub struct MaintenanceService;

impl MaintenanceService {
    /// Create a ticket, then upload its photos one by one and patch the URL
    /// list onto the row.
    ///
    /// Ticket creation and photo attachment are two non-atomic steps: a photo
    /// failing mid-sequence keeps the URLs uploaded before it, skips the rest,
    /// and leaves the ticket in place.
    pub async fn create_ticket(
        pool: &SqlitePool,
        storage: &dyn FileStorage,
        events: &EventService,
        data: &CreateTicket,
        photos: &[TicketPhoto],
    ) -> Result<MaintenanceTicket, MaintenanceError> {
        Lease::find_by_id(pool, data.lease_id)
            .await?
            .ok_or(MaintenanceError::LeaseNotFound)?;

        let mut ticket = MaintenanceTicket::create(pool, data, Uuid::new_v4()).await?;

        let mut urls = Vec::new();
        for (index, (filename, bytes)) in photos.iter().enumerate() {
            let object_name = format!("{}_{}_{}", ticket.id, index, filename);
            match storage.store("tickets", &object_name, bytes).await {
                Ok(url) => urls.push(url),
                Err(e) => {
                    warn!(
                        ticket_id = %ticket.id,
                        photo_index = index,
                        error = %e,
                        "photo upload failed, keeping earlier uploads and skipping the rest"
                    );
                    break;
                }
            }
        }
        if !urls.is_empty() {
            ticket = MaintenanceTicket::update_photos(pool, ticket.id, &urls).await?;
        }

        events.publish("maintenance_tickets", ChangeOp::Insert, ticket.id);
        info!(
            ticket_id = %ticket.id,
            lease_id = %data.lease_id,
            photos = urls.len(),
            "maintenance ticket created"
        );
        Ok(ticket)
    }

    /// Move a ticket to a new status, recording an intervention when a
    /// description is supplied.
    ///
    /// Any status may transition to any other, including ouvert <-> ferme
    /// directly; callers get no state machine here.
    pub async fn update_ticket_status(
        pool: &SqlitePool,
        events: &EventService,
        ticket_id: Uuid,
        statut: TicketStatus,
        description: Option<&str>,
    ) -> Result<MaintenanceTicket, MaintenanceError> {
        let ticket = MaintenanceTicket::find_by_id(pool, ticket_id)
            .await?
            .ok_or(MaintenanceError::TicketNotFound)?;

        let statut_avant = ticket.statut.clone();
        let ticket = MaintenanceTicket::update_status(pool, ticket.id, statut.clone()).await?;

        if let Some(description) = description {
            Intervention::create(pool, ticket.id, description, statut_avant.clone(), statut).await?;
        }

        events.publish("maintenance_tickets", ChangeOp::Update, ticket.id);
        info!(
            ticket_id = %ticket.id,
            from = %statut_avant,
            to = %ticket.statut,
            "ticket status updated"
        );
        Ok(ticket)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::NaiveDate;
    use db::models::maintenance::TicketPriority;

    use super::*;
    use crate::services::{
        lease::{CreateDirectLease, LeaseService},
        test_support::{seed_property, seed_space, test_pool},
    };

    /// Succeeds until `fail_from` stores have happened, then fails.
    struct FlakyStorage {
        calls: AtomicUsize,
        fail_from: usize,
    }

    impl FlakyStorage {
        fn failing_from(fail_from: usize) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail_from,
            }
        }
    }

    #[async_trait]
    impl FileStorage for FlakyStorage {
        async fn store(
            &self,
            bucket: &str,
            name: &str,
            _bytes: &[u8],
        ) -> Result<String, StorageError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call >= self.fail_from {
                return Err(StorageError::InvalidName("simulated failure".to_string()));
            }
            Ok(format!("http://files.test/{bucket}/{name}"))
        }
    }

    async fn seed_lease(pool: &sqlx::SqlitePool, events: &EventService) -> Lease {
        let space = seed_space(pool).await;
        let property = seed_property(pool, space.id, 100_000).await;
        let (lease, _) = LeaseService::create_direct_lease(
            pool,
            events,
            &CreateDirectLease {
                property_id: property.id,
                tenant_id: Uuid::new_v4(),
                date_debut: NaiveDate::from_ymd_opt(2026, 9, 1).unwrap(),
            },
        )
        .await
        .unwrap();
        lease
    }

    fn ticket_data(lease_id: Uuid) -> CreateTicket {
        CreateTicket {
            lease_id,
            titre: "Fuite d'eau".to_string(),
            description: "Fuite sous l'évier de la cuisine".to_string(),
            priorite: Some(TicketPriority::Haute),
        }
    }

    #[tokio::test]
    async fn test_create_ticket_with_photos() {
        let pool = test_pool().await;
        let events = EventService::default();
        let lease = seed_lease(&pool, &events).await;
        let storage = FlakyStorage::failing_from(10);

        let photos = vec![
            ("avant.jpg".to_string(), vec![1u8]),
            ("apres.jpg".to_string(), vec![2u8]),
        ];
        let ticket =
            MaintenanceService::create_ticket(&pool, &storage, &events, &ticket_data(lease.id), &photos)
                .await
                .unwrap();

        assert_eq!(ticket.statut, TicketStatus::Ouvert);
        assert_eq!(ticket.priorite, TicketPriority::Haute);
        assert_eq!(ticket.photos.len(), 2);
    }

    #[tokio::test]
    async fn test_failed_second_photo_keeps_first_upload() {
        let pool = test_pool().await;
        let events = EventService::default();
        let lease = seed_lease(&pool, &events).await;
        let storage = FlakyStorage::failing_from(1);

        let photos = vec![
            ("avant.jpg".to_string(), vec![1u8]),
            ("apres.jpg".to_string(), vec![2u8]),
        ];
        let ticket =
            MaintenanceService::create_ticket(&pool, &storage, &events, &ticket_data(lease.id), &photos)
                .await
                .unwrap();

        // The first upload is not rolled back and the ticket exists.
        let ticket = MaintenanceTicket::find_by_id(&pool, ticket.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(ticket.photos.len(), 1);
        assert!(ticket.photos[0].ends_with("_0_avant.jpg"));
    }

    #[tokio::test]
    async fn test_any_status_transition_is_allowed() {
        let pool = test_pool().await;
        let events = EventService::default();
        let lease = seed_lease(&pool, &events).await;
        let storage = FlakyStorage::failing_from(10);
        let ticket =
            MaintenanceService::create_ticket(&pool, &storage, &events, &ticket_data(lease.id), &[])
                .await
                .unwrap();

        // ouvert -> ferme directly, then back.
        let ticket = MaintenanceService::update_ticket_status(
            &pool,
            &events,
            ticket.id,
            TicketStatus::Ferme,
            Some("Fermé sans intervention"),
        )
        .await
        .unwrap();
        assert_eq!(ticket.statut, TicketStatus::Ferme);

        let ticket = MaintenanceService::update_ticket_status(
            &pool,
            &events,
            ticket.id,
            TicketStatus::Ouvert,
            None,
        )
        .await
        .unwrap();
        assert_eq!(ticket.statut, TicketStatus::Ouvert);

        let interventions = Intervention::find_by_ticket_id(&pool, ticket.id).await.unwrap();
        assert_eq!(interventions.len(), 1);
        assert_eq!(interventions[0].statut_avant, TicketStatus::Ouvert);
        assert_eq!(interventions[0].statut_apres, TicketStatus::Ferme);
    }

    #[tokio::test]
    async fn test_ticket_requires_existing_lease() {
        let pool = test_pool().await;
        let events = EventService::default();
        let storage = FlakyStorage::failing_from(10);

        let err = MaintenanceService::create_ticket(
            &pool,
            &storage,
            &events,
            &ticket_data(Uuid::new_v4()),
            &[],
        )
        .await
        .unwrap_err();
        assert!(matches!(err, MaintenanceError::LeaseNotFound));
    }
}
