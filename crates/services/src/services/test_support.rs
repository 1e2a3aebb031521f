//! Shared fixtures for service tests.

use db::models::{
    property::{CreateProperty, Property},
    space::{CreateSpace, Space},
};
use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
use uuid::Uuid;

pub async fn test_pool() -> SqlitePool {
    // A single connection keeps every query on the same in-memory database.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    sqlx::migrate!("../db/migrations").run(&pool).await.unwrap();
    pool
}

pub async fn seed_space(pool: &SqlitePool) -> Space {
    Space::create(
        pool,
        &CreateSpace {
            nom: "Espace Makepe".to_string(),
            owner_id: Uuid::new_v4(),
        },
        Uuid::new_v4(),
    )
    .await
    .unwrap()
}

pub async fn seed_property(pool: &SqlitePool, space_id: Uuid, prix_mensuel: i64) -> Property {
    Property::create(
        pool,
        &CreateProperty {
            space_id,
            manager_id: Uuid::new_v4(),
            titre: "Appartement T3 Bonapriso".to_string(),
            adresse: "12 rue des Cocotiers".to_string(),
            ville: "Douala".to_string(),
            quartier: Some("Bonapriso".to_string()),
            prix_mensuel,
            caution_montant: None,
            nb_pieces: 3,
            superficie: Some(85.0),
            photos: None,
        },
        Uuid::new_v4(),
    )
    .await
    .unwrap()
}
