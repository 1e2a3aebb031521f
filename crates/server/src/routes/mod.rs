pub mod events;
pub mod leases;
pub mod notifications;
pub mod payments;
pub mod properties;
pub mod rental_requests;
pub mod spaces;
pub mod tickets;

use axum::Router;

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(events::router())
        .merge(leases::router())
        .merge(notifications::router())
        .merge(payments::router())
        .merge(properties::router())
        .merge(rental_requests::router())
        .merge(spaces::router())
        .merge(tickets::router())
}
