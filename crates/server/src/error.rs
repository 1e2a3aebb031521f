//! Maps service and database failures onto HTTP statuses with the standard
//! JSON envelope.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use services::services::{
    finance::FinanceError,
    geocode::GeocodeError,
    lease::LeaseError,
    maintenance::MaintenanceError,
    payment::PaymentError,
    storage::StorageError,
};
use thiserror::Error;
use tracing::error;
use utils::response::ApiResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Lease(#[from] LeaseError),
    #[error(transparent)]
    Payment(#[from] PaymentError),
    #[error(transparent)]
    Maintenance(#[from] MaintenanceError),
    #[error(transparent)]
    Finance(#[from] FinanceError),
    #[error(transparent)]
    Geocode(#[from] GeocodeError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("{0}")]
    BadRequest(String),
    #[error("not found")]
    NotFound,
}

fn lease_status(e: &LeaseError) -> StatusCode {
    match e {
        LeaseError::PropertyNotFound | LeaseError::LeaseNotFound | LeaseError::RequestNotFound => {
            StatusCode::NOT_FOUND
        }
        LeaseError::RequestNotPending(_)
        | LeaseError::PropertyUnavailable(_)
        | LeaseError::UnsupportedTransition { .. } => StatusCode::CONFLICT,
        LeaseError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn payment_status(e: &PaymentError) -> StatusCode {
    match e {
        PaymentError::PaymentNotFound | PaymentError::LeaseNotFound => StatusCode::NOT_FOUND,
        PaymentError::AlreadySucceeded | PaymentError::NotAwaitingConfirmation(_) => {
            StatusCode::CONFLICT
        }
        PaymentError::Lease(e) => lease_status(e),
        PaymentError::Storage(e) => storage_status(e),
        PaymentError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

// Bad object names come from client-supplied filenames.
fn storage_status(e: &StorageError) -> StatusCode {
    match e {
        StorageError::InvalidName(_) => StatusCode::BAD_REQUEST,
        StorageError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Lease(e) => lease_status(e),
            ApiError::Payment(e) => payment_status(e),
            ApiError::Maintenance(
                MaintenanceError::TicketNotFound | MaintenanceError::LeaseNotFound,
            ) => StatusCode::NOT_FOUND,
            ApiError::Maintenance(MaintenanceError::Storage(e)) => storage_status(e),
            ApiError::Storage(e) => storage_status(e),
            ApiError::Finance(FinanceError::SpaceNotFound) => StatusCode::NOT_FOUND,
            ApiError::Geocode(GeocodeError::NoResult) => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(error = %self, "request failed");
        }
        (status, Json(ApiResponse::<()>::error(self.to_string()))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use db::models::{lease::LeaseStatus, payment::PaymentStatus, property::PropertyStatus};

    use super::*;

    #[test]
    fn test_not_found_variants_map_to_404() {
        assert_eq!(
            ApiError::Lease(LeaseError::LeaseNotFound).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Payment(PaymentError::PaymentNotFound).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(ApiError::NotFound.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_business_rule_violations_map_to_409() {
        assert_eq!(
            ApiError::Lease(LeaseError::PropertyUnavailable(PropertyStatus::Loue)).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::Lease(LeaseError::UnsupportedTransition {
                from: LeaseStatus::Resilie,
                to: LeaseStatus::Actif,
            })
            .status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::Payment(PaymentError::NotAwaitingConfirmation(PaymentStatus::EnAttente))
                .status(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_nested_lease_error_keeps_its_status() {
        let err = ApiError::Payment(PaymentError::Lease(LeaseError::UnsupportedTransition {
            from: LeaseStatus::Resilie,
            to: LeaseStatus::Actif,
        }));
        assert_eq!(err.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_bad_request_maps_to_400() {
        assert_eq!(
            ApiError::BadRequest("invalid base64".to_string()).status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_invalid_object_name_maps_to_400() {
        let name = "../evil.pdf".to_string();
        assert_eq!(
            ApiError::Payment(PaymentError::Storage(StorageError::InvalidName(name.clone())))
                .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Maintenance(MaintenanceError::Storage(StorageError::InvalidName(
                name.clone()
            )))
            .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Storage(StorageError::InvalidName(name)).status(),
            StatusCode::BAD_REQUEST
        );
    }
}
