use std::fmt;
use std::sync::Arc;

use chrono::Duration;
use mongodb::Client as MongoClient;
use rocket::{
    fairing::{Fairing, Info, Kind},
    Build, Rocket,
};
use serde::{Deserialize, Serialize};

use crate::model::mongodb::ensure_indexes_exist;
use crate::store::{
    MemoryPollStore, MemoryUserStore, MongoPollStore, MongoUserStore, PollStore, UserStore,
};
use crate::voting::VotingService;

/// Application configuration, derived from `Rocket.toml` and `ROCKET_*`
/// environment variables. This struct becomes managed state and can be
/// inspected by any endpoint.
#[derive(Deserialize)]
pub struct Config {
    // non-secrets
    storage: StorageMode,
    auth_ttl: u32,
    db_timeout: u32,
    // secrets
    jwt_secret: String,
}

impl Config {
    /// Which storage backend to run against.
    pub fn storage(&self) -> StorageMode {
        self.storage
    }

    /// Valid lifetime of auth tokens in seconds.
    pub fn auth_ttl(&self) -> Duration {
        Duration::seconds(self.auth_ttl.into())
    }

    /// Upper bound on a single database operation.
    pub fn db_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.db_timeout.into())
    }

    /// Secret key used to sign JWTs.
    pub fn jwt_secret(&self) -> &[u8] {
        self.jwt_secret.as_bytes()
    }
}

/// The available storage backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageMode {
    /// Persistent storage in MongoDB.
    Mongodb,
    /// Volatile in-process storage, for development and tests.
    Memory,
}

impl fmt::Display for StorageMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mongodb => write!(f, "mongodb"),
            Self::Memory => write!(f, "memory"),
        }
    }
}

/// A fairing that loads the application config and puts it in managed state.
/// This could easily be achieved using `AdHoc::config`, but is written out
/// explicitly for symmetry with the other fairings and control over error
/// messages.
pub struct ConfigFairing;

#[rocket::async_trait]
impl Fairing for ConfigFairing {
    fn info(&self) -> Info {
        Info {
            name: "Config",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        // Load the config.
        let config = match rocket.figment().extract::<Config>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load application config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };

        // Manage the state.
        rocket = rocket.manage(config);
        Ok(rocket)
    }
}

/// Configuration for the database, only read in `mongodb` mode.
#[derive(Deserialize)]
struct DbConfig {
    // non-secrets
    db_name: String,
    // secrets
    db_uri: String,
}

/// A fairing that builds the configured storage backend, wires the voting
/// service on top of it, and places all of them into managed state.
pub struct StorageFairing;

#[rocket::async_trait]
impl Fairing for StorageFairing {
    fn info(&self) -> Info {
        Info {
            name: "Storage",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        // Load the config.
        let config = match rocket.figment().extract::<Config>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load application config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };

        let (poll_store, user_store): (Arc<dyn PollStore>, Arc<dyn UserStore>) =
            match config.storage() {
                StorageMode::Memory => {
                    warn!("Using in-memory storage; all data is lost on shutdown");
                    (
                        Arc::new(MemoryPollStore::new()),
                        Arc::new(MemoryUserStore::new()),
                    )
                }
                StorageMode::Mongodb => {
                    let db_config = match rocket.figment().extract::<DbConfig>() {
                        Ok(db_config) => db_config,
                        Err(e) => {
                            error!("Failed to load database config");
                            rocket::config::pretty_print_error(e);
                            return Err(rocket);
                        }
                    };
                    info!("Loaded database config, connecting...");
                    // Construct the connection.
                    let client = match MongoClient::with_uri_str(db_config.db_uri).await {
                        Ok(client) => client,
                        Err(e) => {
                            error!("Failed to connect to database: {e}");
                            return Err(rocket);
                        }
                    };
                    let db = client.database(&db_config.db_name);

                    // Ensure the required indexes exist.
                    if let Err(e) = ensure_indexes_exist(&db).await {
                        error!("Failed to connect to database: {e}");
                        return Err(rocket);
                    }
                    info!("...database connection online!");

                    (
                        Arc::new(MongoPollStore::new(&db, config.db_timeout())),
                        Arc::new(MongoUserStore::new(&db, config.db_timeout())),
                    )
                }
            };

        let service = VotingService::new(poll_store.clone());

        // Manage the state.
        rocket = rocket.manage(poll_store).manage(user_store).manage(service);
        Ok(rocket)
    }
}

#[cfg(test)]
mod tests {
    use rocket::serde::json::serde_json;

    use super::*;

    #[test]
    fn storage_mode_names_match_config_values() {
        for (mode, name) in [
            (StorageMode::Mongodb, "mongodb"),
            (StorageMode::Memory, "memory"),
        ] {
            assert_eq!(mode.to_string(), name);
            assert_eq!(
                serde_json::to_string(&mode).unwrap(),
                format!("\"{name}\"")
            );
            assert_eq!(
                serde_json::from_str::<StorageMode>(&format!("\"{name}\"")).unwrap(),
                mode
            );
        }
    }
}
