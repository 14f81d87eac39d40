use chrono::{DateTime, Utc};
use rocket::{serde::json::Json, Route, State};
use serde::{Deserialize, Serialize};

use crate::config::{Config, StorageMode};

pub fn routes() -> Vec<Route> {
    routes![health]
}

/// A liveness summary for monitoring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthDescription {
    pub status: String,
    pub server: String,
    pub version: String,
    /// The active storage backend.
    pub mode: StorageMode,
    pub timestamp: DateTime<Utc>,
}

#[get("/health")]
pub async fn health(config: &State<Config>) -> Json<HealthDescription> {
    Json(HealthDescription {
        status: "ok".to_string(),
        server: "votehub".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        mode: config.storage(),
        timestamp: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use rocket::http::Status;
    use rocket::serde::json::serde_json;

    use crate::testing::client;

    use super::*;

    #[rocket::async_test]
    async fn health_reports_mode_and_version() {
        let client = client().await;

        let response = client.get(uri!(health)).dispatch().await;
        assert_eq!(Status::Ok, response.status());

        let health: HealthDescription =
            serde_json::from_str(&response.into_string().await.unwrap()).unwrap();
        assert_eq!("ok", health.status);
        assert_eq!("votehub", health.server);
        assert_eq!(env!("CARGO_PKG_VERSION"), health.version);
        assert_eq!(StorageMode::Memory, health.mode);
        assert!(health.timestamp <= Utc::now());
    }
}
