use rocket::serde::json::Json;
use rocket::{http::Status, response::Responder};
use serde::Serialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Jwt(#[from] jsonwebtoken::errors::Error),
    #[error(transparent)]
    Db(#[from] mongodb::error::Error),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Invalid option: {0}")]
    InvalidOption(String),
    #[error("Poll expired: {0}")]
    PollExpired(String),
    #[error("Already voted: {0}")]
    AlreadyVoted(String),
    #[error("Poll locked: {0}")]
    PollLocked(String),
    #[error("Email taken: {0}")]
    EmailTaken(String),
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Write conflict: {0}")]
    Conflict(String),
    #[error("Timed out: {0}")]
    Timeout(String),
    #[error("Busy: {0}")]
    Busy(String),
}

impl Error {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn invalid_option(msg: impl Into<String>) -> Self {
        Self::InvalidOption(msg.into())
    }

    pub fn poll_expired(msg: impl Into<String>) -> Self {
        Self::PollExpired(msg.into())
    }

    pub fn already_voted(msg: impl Into<String>) -> Self {
        Self::AlreadyVoted(msg.into())
    }

    pub fn poll_locked(msg: impl Into<String>) -> Self {
        Self::PollLocked(msg.into())
    }

    pub fn email_taken(msg: impl Into<String>) -> Self {
        Self::EmailTaken(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    pub fn busy(msg: impl Into<String>) -> Self {
        Self::Busy(msg.into())
    }

    /// Machine-readable error code, stable across message changes.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Jwt(_) | Self::Unauthorized(_) => "unauthorized",
            Self::Db(_) => "internal",
            Self::NotFound(_) => "not-found",
            Self::InvalidOption(_) => "invalid-option",
            Self::PollExpired(_) => "poll-expired",
            Self::AlreadyVoted(_) => "already-voted",
            Self::PollLocked(_) => "poll-locked",
            Self::EmailTaken(_) => "email-taken",
            Self::Validation(_) => "validation",
            Self::Conflict(_) => "conflict",
            Self::Timeout(_) => "timeout",
            Self::Busy(_) => "busy",
        }
    }

    pub fn status(&self) -> Status {
        match self {
            Self::Jwt(_) | Self::Unauthorized(_) => Status::Unauthorized,
            Self::Db(_) => Status::InternalServerError,
            Self::NotFound(_) => Status::NotFound,
            Self::InvalidOption(_) | Self::Validation(_) => Status::BadRequest,
            Self::PollExpired(_) => Status::Gone,
            Self::AlreadyVoted(_)
            | Self::PollLocked(_)
            | Self::EmailTaken(_)
            | Self::Conflict(_) => Status::Conflict,
            Self::Timeout(_) | Self::Busy(_) => Status::ServiceUnavailable,
        }
    }

    /// Is this the sort of failure that retrying the same write may fix?
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Conflict(_) | Self::Timeout(_))
    }
}

/// The JSON body sent with every error response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

impl<'r, 'o: 'r> Responder<'r, 'o> for Error {
    fn respond_to(self, req: &'r rocket::Request<'_>) -> rocket::response::Result<'o> {
        let status = self.status();
        if status == Status::InternalServerError {
            error!("{:?}", self);
        }
        let message = match &self {
            // Database errors may contain connection details.
            Self::Db(_) => "internal server error".to_string(),
            _ => self.to_string(),
        };
        let body = ErrorBody {
            code: self.code(),
            message,
        };
        rocket::Response::build_from(Json(body).respond_to(req)?)
            .status(status)
            .ok()
    }
}
