#[macro_use]
extern crate rocket;

#[macro_use]
extern crate log;

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod store;
pub mod voting;

pub use config::Config;

use rocket::{Build, Rocket};

use crate::config::{ConfigFairing, StorageFairing};
use crate::logging::LoggerFairing;

/// Build the standard rocket, configured via `Rocket.toml` and `ROCKET_*`
/// environment variables. Storage comes online during ignition.
pub fn build() -> Rocket<Build> {
    assemble(rocket::build())
}

/// Attach all fairings, routes, and catchers to the given rocket.
fn assemble(rocket: Rocket<Build>) -> Rocket<Build> {
    rocket
        .attach(ConfigFairing)
        .attach(StorageFairing)
        .attach(LoggerFairing)
        .mount("/", api::routes())
        .register("/", api::catchers())
}
