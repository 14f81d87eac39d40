use rocket::serde::json;
use rocket::{Catcher, Route};

use crate::error::Error;

mod auth;
mod catchers;
mod health;
mod polls;
mod voting;

pub fn routes() -> Vec<Route> {
    let mut routes = Vec::new();
    routes.extend(auth::routes());
    routes.extend(health::routes());
    routes.extend(polls::routes());
    routes.extend(voting::routes());
    routes
}

pub fn catchers() -> Vec<Catcher> {
    catchers::catchers()
}

/// Convert a rejected JSON body into a validation error, so clients get the
/// standard error shape instead of Rocket's default 422.
pub(crate) fn bad_json(err: json::Error<'_>) -> Error {
    Error::validation(match err {
        json::Error::Io(_) => "could not read request body".to_string(),
        json::Error::Parse(_, err) => format!("malformed JSON: {err}"),
    })
}
