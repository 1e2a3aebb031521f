//! Geocoding client resolving property addresses to coordinates.

use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};
use db::models::property::Property;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

const DEFAULT_GEOCODE_URL: &str = "https://nominatim.openstreetmap.org";

#[derive(Debug, Clone, Error)]
pub enum GeocodeError {
    #[error("network error: {0}")]
    Transport(String),
    #[error("timeout")]
    Timeout,
    #[error("http {status}: {body}")]
    Http { status: u16, body: String },
    #[error("rate limited")]
    RateLimited,
    #[error("json error: {0}")]
    Serde(String),
    #[error("no result for address")]
    NoResult,
    #[error("database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for GeocodeError {
    fn from(e: sqlx::Error) -> Self {
        GeocodeError::Database(e.to_string())
    }
}

impl GeocodeError {
    /// Returns true if the error is transient and should be retried.
    pub fn should_retry(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Timeout | Self::RateLimited => true,
            Self::Http { status, .. } => (500..=599).contains(status),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// One entry of a Nominatim-style search response.
#[derive(Debug, Deserialize)]
struct SearchResult {
    lat: String,
    lon: String,
}

#[derive(Debug, Clone)]
pub struct GeocodeClient {
    http: Client,
    base_url: String,
}

impl GeocodeClient {
    const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

    pub fn new(base_url: Option<String>) -> Result<Self, GeocodeError> {
        let http = Client::builder()
            .timeout(Self::REQUEST_TIMEOUT)
            .user_agent(concat!("loka/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| GeocodeError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.unwrap_or_else(|| DEFAULT_GEOCODE_URL.to_string()),
        })
    }

    /// Resolve a free-text address to coordinates, retrying transient
    /// failures.
    pub async fn geocode(&self, address: &str) -> Result<Coordinates, GeocodeError> {
        (|| async { self.search(address).await })
            .retry(
                &ExponentialBuilder::default()
                    .with_min_delay(Duration::from_secs(1))
                    .with_max_delay(Duration::from_secs(30))
                    .with_max_times(3)
                    .with_jitter(),
            )
            .when(|e: &GeocodeError| e.should_retry())
            .notify(|e, dur| {
                warn!(
                    "geocoding call failed, retrying after {:.2}s: {}",
                    dur.as_secs_f64(),
                    e
                )
            })
            .await
    }

    async fn search(&self, address: &str) -> Result<Coordinates, GeocodeError> {
        let res = self
            .http
            .get(format!("{}/search", self.base_url))
            .query(&[("q", address), ("format", "json"), ("limit", "1")])
            .send()
            .await
            .map_err(map_reqwest_error)?;

        match res.status() {
            s if s.is_success() => {
                let results = res
                    .json::<Vec<SearchResult>>()
                    .await
                    .map_err(|e| GeocodeError::Serde(e.to_string()))?;
                parse_first_result(&results)
            }
            StatusCode::TOO_MANY_REQUESTS => Err(GeocodeError::RateLimited),
            s => {
                let status = s.as_u16();
                let body = res.text().await.unwrap_or_default();
                Err(GeocodeError::Http { status, body })
            }
        }
    }

    /// Geocode a property that has no coordinates yet and persist the result.
    /// Properties that already carry coordinates are left untouched.
    pub async fn ensure_geocoded(
        &self,
        pool: &SqlitePool,
        property_id: Uuid,
    ) -> Result<Option<Coordinates>, GeocodeError> {
        let Some(property) = Property::find_by_id(pool, property_id).await? else {
            return Ok(None);
        };
        if property.latitude.is_some() && property.longitude.is_some() {
            return Ok(None);
        }

        let coords = self.geocode(&search_query(&property)).await?;
        Property::update_coordinates(pool, property.id, coords.latitude, coords.longitude).await?;

        info!(
            property_id = %property.id,
            latitude = coords.latitude,
            longitude = coords.longitude,
            "property geocoded"
        );
        Ok(Some(coords))
    }
}

fn map_reqwest_error(e: reqwest::Error) -> GeocodeError {
    if e.is_timeout() {
        GeocodeError::Timeout
    } else {
        GeocodeError::Transport(e.to_string())
    }
}

fn parse_first_result(results: &[SearchResult]) -> Result<Coordinates, GeocodeError> {
    let first = results.first().ok_or(GeocodeError::NoResult)?;
    let latitude = first
        .lat
        .parse::<f64>()
        .map_err(|e| GeocodeError::Serde(e.to_string()))?;
    let longitude = first
        .lon
        .parse::<f64>()
        .map_err(|e| GeocodeError::Serde(e.to_string()))?;
    Ok(Coordinates {
        latitude,
        longitude,
    })
}

fn search_query(property: &Property) -> String {
    match &property.quartier {
        Some(quartier) => format!("{}, {}, {}", property.adresse, quartier, property.ville),
        None => format!("{}, {}", property.adresse, property.ville),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_first_result() {
        let results = vec![SearchResult {
            lat: "4.0511".to_string(),
            lon: "9.7679".to_string(),
        }];
        let coords = parse_first_result(&results).unwrap();
        assert_eq!(coords.latitude, 4.0511);
        assert_eq!(coords.longitude, 9.7679);
    }

    #[test]
    fn test_empty_results_yield_no_result() {
        let err = parse_first_result(&[]).unwrap_err();
        assert!(matches!(err, GeocodeError::NoResult));
    }

    #[test]
    fn test_malformed_coordinates_are_a_serde_error() {
        let results = vec![SearchResult {
            lat: "not-a-number".to_string(),
            lon: "9.7679".to_string(),
        }];
        assert!(matches!(
            parse_first_result(&results).unwrap_err(),
            GeocodeError::Serde(_)
        ));
    }

    #[test]
    fn test_retry_only_on_transient_errors() {
        assert!(GeocodeError::Timeout.should_retry());
        assert!(GeocodeError::RateLimited.should_retry());
        assert!(GeocodeError::Http {
            status: 503,
            body: String::new()
        }
        .should_retry());
        assert!(!GeocodeError::NoResult.should_retry());
        assert!(!GeocodeError::Http {
            status: 404,
            body: String::new()
        }
        .should_retry());
    }

    #[test]
    fn test_search_query_includes_quartier_when_present() {
        use chrono::Utc;
        use db::models::property::PropertyStatus;

        let mut property = Property {
            id: Uuid::new_v4(),
            space_id: Uuid::new_v4(),
            manager_id: Uuid::new_v4(),
            titre: "Appartement T3".to_string(),
            adresse: "12 rue des Cocotiers".to_string(),
            ville: "Douala".to_string(),
            quartier: Some("Bonapriso".to_string()),
            prix_mensuel: 100_000,
            caution_montant: 500_000,
            nb_pieces: 3,
            superficie: Some(85.0),
            statut: PropertyStatus::Disponible,
            photos: vec![],
            latitude: None,
            longitude: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        assert_eq!(
            search_query(&property),
            "12 rue des Cocotiers, Bonapriso, Douala"
        );

        property.quartier = None;
        assert_eq!(search_query(&property), "12 rue des Cocotiers, Douala");
    }
}
