use std::sync::Arc;

use chrono::{serde::ts_seconds, DateTime, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, TokenData, Validation};
use rocket::{
    http::Status,
    request::{FromRequest, Outcome},
    Request, State,
};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::Error;
use crate::model::{db::user::User, mongodb::Id};
use crate::store::UserStore;

pub const AUTH_TOKEN_HEADER: &str = "Authorization";

const BEARER_PREFIX: &str = "Bearer ";

/// An authentication token representing a specific user.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AuthToken {
    pub id: Id,
}

impl AuthToken {
    /// Create a new [`AuthToken`] for the given user.
    pub fn for_user(user: &User) -> Self {
        Self { id: user.id }
    }

    /// Serialize this token into a signed JWT.
    pub fn into_token(self, config: &Config) -> String {
        let claims = Claims {
            token: self,
            expire_at: Utc::now() + config.auth_ttl(),
        };

        jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.jwt_secret()),
        )
        .expect("JWT encoding is infallible with default settings")
    }

    /// Deserialize a token from a JWT, verifying the signature and expiry.
    pub fn from_token(token: &str, config: &Config) -> Result<Self, Error> {
        let token = jsonwebtoken::decode(
            token,
            &DecodingKey::from_secret(config.jwt_secret()),
            &Validation::default(),
        )
        .map(|claims: TokenData<Claims>| claims.claims.token)?;
        Ok(token)
    }
}

/// Token claims: the token itself plus an expiry datetime.
#[derive(Serialize, Deserialize)]
struct Claims {
    #[serde(flatten)]
    token: AuthToken,
    #[serde(rename = "exp", with = "ts_seconds")]
    expire_at: DateTime<Utc>,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthToken {
    type Error = Error;

    /// Get an [`AuthToken`] from the `Authorization: Bearer` header and verify
    /// that it represents a user who still exists.
    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        // Unwrap is safe as `Config` is always managed.
        let config = req.guard::<&State<Config>>().await.unwrap();

        let token = match req.headers().get_one(AUTH_TOKEN_HEADER) {
            Some(header) => match header.strip_prefix(BEARER_PREFIX) {
                Some(token) => token,
                None => {
                    return Outcome::Failure((
                        Status::Unauthorized,
                        Error::unauthorized("malformed Authorization header"),
                    ))
                }
            },
            None => {
                return Outcome::Failure((
                    Status::Unauthorized,
                    Error::unauthorized("missing bearer token"),
                ))
            }
        };

        // Decode the token.
        let token = match Self::from_token(token, config) {
            Ok(token) => token,
            Err(_) => {
                return Outcome::Failure((
                    Status::Unauthorized,
                    Error::unauthorized("invalid or expired token"),
                ))
            }
        };

        // Check the user actually exists.
        let users = req.guard::<&State<Arc<dyn UserStore>>>().await.unwrap();
        match users.find_by_id(token.id).await {
            Ok(Some(_)) => Outcome::Success(token),
            Ok(None) => Outcome::Failure((
                Status::Unauthorized,
                Error::unauthorized("user no longer exists"),
            )),
            Err(e) => Outcome::Failure((Status::InternalServerError, e)),
        }
    }
}
