//! Catchers for the statuses Rocket produces on its own, mostly from failed
//! guards. They keep every error response in the same JSON shape.

use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{Catcher, Request};

use crate::error::ErrorBody;

pub fn catchers() -> Vec<Catcher> {
    catchers![
        bad_request,
        unauthorized,
        not_found,
        unprocessable,
        internal_error,
        fallback
    ]
}

#[catch(400)]
fn bad_request(_req: &Request) -> Json<ErrorBody> {
    Json(ErrorBody {
        code: "validation",
        message: "invalid request".to_string(),
    })
}

#[catch(401)]
fn unauthorized(_req: &Request) -> Json<ErrorBody> {
    Json(ErrorBody {
        code: "unauthorized",
        message: "authentication required".to_string(),
    })
}

#[catch(404)]
fn not_found(_req: &Request) -> Json<ErrorBody> {
    Json(ErrorBody {
        code: "not-found",
        message: "resource not found".to_string(),
    })
}

#[catch(422)]
fn unprocessable(_req: &Request) -> Json<ErrorBody> {
    Json(ErrorBody {
        code: "validation",
        message: "unprocessable request body".to_string(),
    })
}

#[catch(500)]
fn internal_error(_req: &Request) -> Json<ErrorBody> {
    Json(ErrorBody {
        code: "internal",
        message: "internal server error".to_string(),
    })
}

#[catch(default)]
fn fallback(status: Status, _req: &Request) -> Json<ErrorBody> {
    Json(ErrorBody {
        code: "error",
        message: status.to_string(),
    })
}
