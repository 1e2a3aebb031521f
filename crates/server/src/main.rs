use std::sync::Arc;

use db::DBService;
use server::AppState;
use services::services::{
    config::Config,
    events::EventService,
    geocode::GeocodeClient,
    storage::LocalFileStorage,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();
    let db = DBService::new(&config.database_url).await?;
    let storage = Arc::new(LocalFileStorage::new(
        config.storage_dir.clone(),
        config.public_base_url.clone(),
    ));
    let geocode = Arc::new(GeocodeClient::new(config.geocode_base_url.clone())?);

    let state = AppState {
        db,
        events: EventService::default(),
        storage,
        geocode,
    };

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("listening on http://{}", addr);
    axum::serve(listener, server::app(state)).await?;
    Ok(())
}
