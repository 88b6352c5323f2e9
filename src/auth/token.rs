use crate::error::AppError;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Represents the claims encoded within an access token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject of the token: the user's id as a 24-character hex string.
    pub sub: String,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: i64,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
}

/// Signing material and lifetime for access tokens.
///
/// Built once at startup from the configured secret and algorithm; the keys are
/// never re-read from the environment per request.
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    algorithm: Algorithm,
    lifetime: Duration,
}

impl TokenKeys {
    pub fn new(secret: &str, algorithm: Algorithm, expire_minutes: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            algorithm,
            lifetime: Duration::minutes(expire_minutes),
        }
    }

    /// Issues a signed token for `subject`, valid from now until now + lifetime.
    ///
    /// # Returns
    /// The encoded JWT, or `AppError::InternalServerError` if signing fails.
    pub fn issue(&self, subject: &str) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = Claims {
            sub: subject.to_string(),
            iat: now.timestamp(),
            exp: (now + self.lifetime).timestamp(),
        };
        self.sign(&claims)
    }

    pub(crate) fn sign(&self, claims: &Claims) -> Result<String, AppError> {
        encode(&Header::new(self.algorithm), claims, &self.encoding)
            .map_err(|e| AppError::InternalServerError(format!("Failed to generate token: {}", e)))
    }

    /// Verifies the signature and expiry of `token` and returns its subject.
    ///
    /// Any failure (malformed, wrong signature, wrong algorithm, expired) is reported
    /// as `AppError::Unauthorized`.
    pub fn decode(&self, token: &str) -> Result<String, AppError> {
        decode::<Claims>(token, &self.decoding, &Validation::new(self.algorithm))
            .map(|data| data.claims.sub)
            .map_err(|e| AppError::Unauthorized(format!("Invalid or expired token: {}", e)))
    }
}
