use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool, Type, types::Json};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use uuid::Uuid;

#[derive(
    Debug, Clone, Type, Serialize, Deserialize, PartialEq, TS, EnumString, Display, Default,
)]
#[sqlx(type_name = "property_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PropertyStatus {
    #[default]
    Disponible,
    Loue,
    EnValidation,
    Indisponible,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Property {
    pub id: Uuid,
    pub space_id: Uuid,
    pub manager_id: Uuid,
    pub titre: String,
    pub adresse: String,
    pub ville: String,
    pub quartier: Option<String>,
    pub prix_mensuel: i64,
    pub caution_montant: i64,
    pub nb_pieces: i32,
    pub superficie: Option<f64>,
    pub statut: PropertyStatus,
    #[sqlx(json)]
    pub photos: Vec<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateProperty {
    pub space_id: Uuid,
    pub manager_id: Uuid,
    pub titre: String,
    pub adresse: String,
    pub ville: String,
    pub quartier: Option<String>,
    pub prix_mensuel: i64,
    pub caution_montant: Option<i64>,
    pub nb_pieces: i32,
    pub superficie: Option<f64>,
    pub photos: Option<Vec<String>>,
}

#[derive(Debug, Serialize, Deserialize, TS)]
pub struct UpdateProperty {
    pub titre: String,
    pub adresse: String,
    pub ville: String,
    pub quartier: Option<String>,
    pub prix_mensuel: i64,
    pub caution_montant: i64,
    pub nb_pieces: i32,
    pub superficie: Option<f64>,
    pub photos: Vec<String>,
}

const PROPERTY_COLUMNS: &str = "id, space_id, manager_id, titre, adresse, ville, quartier, \
     prix_mensuel, caution_montant, nb_pieces, superficie, statut, photos, latitude, longitude, \
     created_at, updated_at";

impl Property {
    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Property>(&format!(
            "SELECT {PROPERTY_COLUMNS} FROM properties WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_by_space_id(
        pool: &SqlitePool,
        space_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Property>(&format!(
            "SELECT {PROPERTY_COLUMNS} FROM properties WHERE space_id = $1 ORDER BY created_at DESC"
        ))
        .bind(space_id)
        .fetch_all(pool)
        .await
    }

    pub async fn find_available(pool: &SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Property>(&format!(
            "SELECT {PROPERTY_COLUMNS} FROM properties WHERE statut = 'disponible' ORDER BY created_at DESC"
        ))
        .fetch_all(pool)
        .await
    }

    /// Properties that still need geocoding before they can be placed on the map.
    pub async fn find_missing_coordinates(
        pool: &SqlitePool,
        space_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Property>(&format!(
            "SELECT {PROPERTY_COLUMNS} FROM properties \
             WHERE space_id = $1 AND (latitude IS NULL OR longitude IS NULL)"
        ))
        .bind(space_id)
        .fetch_all(pool)
        .await
    }

    pub async fn create(
        pool: &SqlitePool,
        data: &CreateProperty,
        property_id: Uuid,
    ) -> Result<Self, sqlx::Error> {
        let caution = data.caution_montant.unwrap_or(data.prix_mensuel);
        let photos = data.photos.clone().unwrap_or_default();
        sqlx::query_as::<_, Property>(&format!(
            "INSERT INTO properties (id, space_id, manager_id, titre, adresse, ville, quartier, \
             prix_mensuel, caution_montant, nb_pieces, superficie, photos) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
             RETURNING {PROPERTY_COLUMNS}"
        ))
        .bind(property_id)
        .bind(data.space_id)
        .bind(data.manager_id)
        .bind(&data.titre)
        .bind(&data.adresse)
        .bind(&data.ville)
        .bind(&data.quartier)
        .bind(data.prix_mensuel)
        .bind(caution)
        .bind(data.nb_pieces)
        .bind(data.superficie)
        .bind(Json(photos))
        .fetch_one(pool)
        .await
    }

    pub async fn update(
        pool: &SqlitePool,
        id: Uuid,
        data: &UpdateProperty,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Property>(&format!(
            "UPDATE properties \
             SET titre = $2, adresse = $3, ville = $4, quartier = $5, prix_mensuel = $6, \
                 caution_montant = $7, nb_pieces = $8, superficie = $9, photos = $10, \
                 updated_at = CURRENT_TIMESTAMP \
             WHERE id = $1 \
             RETURNING {PROPERTY_COLUMNS}"
        ))
        .bind(id)
        .bind(&data.titre)
        .bind(&data.adresse)
        .bind(&data.ville)
        .bind(&data.quartier)
        .bind(data.prix_mensuel)
        .bind(data.caution_montant)
        .bind(data.nb_pieces)
        .bind(data.superficie)
        .bind(Json(data.photos.clone()))
        .fetch_one(pool)
        .await
    }

    pub async fn update_status(
        pool: &SqlitePool,
        id: Uuid,
        statut: PropertyStatus,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE properties SET statut = $2, updated_at = CURRENT_TIMESTAMP WHERE id = $1",
        )
        .bind(id)
        .bind(statut)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn update_coordinates(
        pool: &SqlitePool,
        id: Uuid,
        latitude: f64,
        longitude: f64,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE properties SET latitude = $2, longitude = $3, updated_at = CURRENT_TIMESTAMP \
             WHERE id = $1",
        )
        .bind(id)
        .bind(latitude)
        .bind(longitude)
        .execute(pool)
        .await?;
        Ok(())
    }
}
