use argon2::Config;
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::model::api::ApiId;
use crate::model::db::user::{NewUser, User};

pub const MIN_PASSWORD_LENGTH: usize = 6;
pub const MAX_USERNAME_LENGTH: usize = 50;

/// Raw registration data, received from a user. This is never stored directly,
/// since the password is in plaintext.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl TryFrom<RegisterRequest> for NewUser {
    type Error = Error;

    /// Convert a [`RegisterRequest`] to a new [`User`] by hashing the password.
    /// This enforces the username, email, and password constraints.
    fn try_from(request: RegisterRequest) -> Result<Self, Self::Error> {
        if request.username.trim().is_empty() {
            return Err(Error::validation("username must not be empty"));
        }
        if request.username.chars().count() > MAX_USERNAME_LENGTH {
            return Err(Error::validation(format!(
                "username must be at most {MAX_USERNAME_LENGTH} characters"
            )));
        }
        if !request.email.contains('@') {
            return Err(Error::validation("invalid email address"));
        }
        if request.password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(Error::validation(format!(
                "password must be at least {MIN_PASSWORD_LENGTH} characters"
            )));
        }

        // 16 bytes is recommended for password hashing:
        //  https://en.wikipedia.org/wiki/Argon2
        let mut salt = [0_u8; 16];
        rand::thread_rng().fill(&mut salt);
        let password_hash =
            argon2::hash_encoded(request.password.as_bytes(), &salt, &Config::default()).unwrap(); // Safe because the default `Config` is valid.

        Ok(Self {
            username: request.username,
            email: request.email.to_lowercase(),
            password_hash,
            created_at: Utc::now(),
        })
    }
}

/// Raw login credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// An API-friendly user description, without the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDescription {
    /// User unique ID.
    pub id: ApiId,
    /// Display name.
    pub username: String,
    /// Email address.
    pub email: String,
    /// Registration time.
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserDescription {
    fn from(user: User) -> Self {
        Self {
            id: user.id.into(),
            username: user.user.username,
            email: user.user.email,
            created_at: user.user.created_at,
        }
    }
}

/// A successful registration or login: a bearer token plus the user it names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserDescription,
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use super::*;

    impl RegisterRequest {
        pub fn example() -> Self {
            Self {
                username: "alice".into(),
                email: "alice@example.com".into(),
                password: "correct-horse".into(),
            }
        }

        pub fn example2() -> Self {
            Self {
                username: "bob".into(),
                email: "bob@example.com".into(),
                password: "battery-staple".into(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_hashes_password() {
        let request = RegisterRequest::example();
        let user = NewUser::try_from(request.clone()).unwrap();

        assert_ne!(user.password_hash, request.password);
        assert!(user.verify_password(&request.password));
        assert!(!user.verify_password("wrong-password"));
    }

    #[test]
    fn registration_lowercases_email() {
        let request = RegisterRequest {
            email: "Alice@Example.COM".into(),
            ..RegisterRequest::example()
        };
        let user = NewUser::try_from(request).unwrap();
        assert_eq!(user.email, "alice@example.com");
    }

    #[test]
    fn bad_registrations_rejected() {
        let empty_username = RegisterRequest {
            username: "  ".into(),
            ..RegisterRequest::example()
        };
        assert!(NewUser::try_from(empty_username).is_err());

        let long_username = RegisterRequest {
            username: "x".repeat(MAX_USERNAME_LENGTH + 1),
            ..RegisterRequest::example()
        };
        assert!(NewUser::try_from(long_username).is_err());

        let bad_email = RegisterRequest {
            email: "not-an-email".into(),
            ..RegisterRequest::example()
        };
        assert!(NewUser::try_from(bad_email).is_err());

        let short_password = RegisterRequest {
            password: "short".into(),
            ..RegisterRequest::example()
        };
        assert!(NewUser::try_from(short_password).is_err());
    }
}
