pub mod extractors;
pub mod middleware;
pub mod password;
pub mod token;

use actix_web::web;
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::config::Config;
use crate::error::AppError;

// Re-export necessary items
pub use extractors::AuthenticatedUserId;
pub use middleware::AuthMiddleware;
pub use password::{hash_password, verify_password};
pub use token::{Claims, TokenKeys};

lazy_static! {
    // A name must contain at least one visible character.
    pub(crate) static ref NAME_REGEX: regex::Regex = regex::Regex::new(r"\S").unwrap();
}

/// Password hashing and token signing, configured once at startup and shared
/// with handlers and `AuthMiddleware` through `web::Data<Credentials>`.
pub struct Credentials {
    keys: TokenKeys,
    hash_cost: u32,
}

impl Credentials {
    pub fn new(keys: TokenKeys, hash_cost: u32) -> Self {
        Self { keys, hash_cost }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            TokenKeys::new(
                &config.jwt_secret,
                config.jwt_algorithm,
                config.jwt_expire_minutes,
            ),
            config.bcrypt_cost,
        )
    }

    /// Hashes on actix's blocking pool; bcrypt is deliberately slow.
    pub async fn hash(&self, password: String) -> Result<String, AppError> {
        let cost = self.hash_cost;
        web::block(move || hash_password(&password, cost)).await?
    }

    pub async fn verify(&self, password: String, hashed: String) -> Result<bool, AppError> {
        web::block(move || verify_password(&password, &hashed)).await?
    }

    pub fn issue(&self, subject: &str) -> Result<String, AppError> {
        self.keys.issue(subject)
    }

    pub fn decode(&self, token: &str) -> Result<String, AppError> {
        self.keys.decode(token)
    }
}

/// Represents the payload for a user login request.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// User's email address.
    /// Must be a valid email format.
    #[validate(email)]
    pub email: String,
    /// User's password. Strength rules apply at registration only.
    #[validate(length(min = 1))]
    pub password: String,
}

/// Represents the payload for a new user registration request.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Display name for the new account, 2 to 100 characters. A name made only
    /// of whitespace (even two spaces) is rejected.
    #[validate(
        length(min = 2, max = 100),
        regex(path = "NAME_REGEX", message = "Name must not be blank")
    )]
    pub name: String,
    /// Email address for the new account.
    /// Must be a valid email format; the domain is lowercased before storage.
    #[validate(email)]
    pub email: String,
    /// Password for the new account, 8 to 128 characters.
    #[validate(length(min = 8, max = 128))]
    pub password: String,
}

/// Response structure after successful authentication (login or registration).
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    /// The signed access token to present as `Authorization: Bearer <token>`.
    pub access_token: String,
    /// Always `"bearer"`.
    pub token_type: String,
}

impl TokenResponse {
    pub fn bearer(access_token: String) -> Self {
        Self {
            access_token,
            token_type: "bearer".to_string(),
        }
    }
}
