//! Runtime configuration, read from the environment.

use std::path::PathBuf;

use tracing::warn;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    /// Base URL under which stored files are served back to clients.
    pub public_base_url: String,
    pub storage_dir: PathBuf,
    pub geocode_base_url: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|raw| match raw.parse() {
                Ok(port) => Some(port),
                Err(_) => {
                    warn!("invalid PORT value '{}', falling back to 3001", raw);
                    None
                }
            })
            .unwrap_or(3001);

        Self {
            database_url: std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:loka.db".into()),
            host: std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".into()),
            port,
            public_base_url: std::env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| format!("http://localhost:{port}")),
            storage_dir: std::env::var("STORAGE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data")),
            geocode_base_url: std::env::var("GEOCODE_BASE_URL").ok(),
        }
    }
}
