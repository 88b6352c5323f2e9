use actix_cors::Cors;
use jsonwebtoken::Algorithm;
use std::env;
use std::fmt;
use std::str::FromStr;

use crate::auth::password::MIN_HASH_COST;

const DEFAULT_DATABASE: &str = "jwt_task_db";
const DEFAULT_CORS_ORIGINS: &str = "http://localhost:5173";

/// Runtime configuration, read from the environment at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub mongodb_uri: String,
    /// Used when `mongodb_uri` does not name a default database.
    pub mongodb_database: String,
    pub jwt_secret: String,
    pub jwt_algorithm: Algorithm,
    pub jwt_expire_minutes: i64,
    pub cors_origins: Vec<String>,
    pub bcrypt_cost: u32,
    pub server_port: u16,
    pub server_host: String,
}

/// Why the configuration could not be loaded.
#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "{} must be set", key),
            ConfigError::Invalid { key, value } => {
                write!(f, "{} has an invalid value: {:?}", key, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup, so callers other
    /// than `from_env` never have to touch the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| lookup(key).ok_or(ConfigError::Missing(key));
        let or_default =
            |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let jwt_algorithm = parse_algorithm(&or_default("JWT_ALGORITHM", "HS256"))?;

        Ok(Self {
            mongodb_uri: required("MONGODB_URI")?,
            mongodb_database: or_default("MONGODB_DATABASE", DEFAULT_DATABASE),
            jwt_secret: required("JWT_SECRET_KEY")?,
            jwt_algorithm,
            jwt_expire_minutes: parse_in_range(
                "JWT_ACCESS_TOKEN_EXPIRE_MINUTES",
                &or_default("JWT_ACCESS_TOKEN_EXPIRE_MINUTES", "30"),
                1..=525_600,
            )?,
            cors_origins: split_origins(&or_default("CORS_ORIGINS", DEFAULT_CORS_ORIGINS)),
            bcrypt_cost: parse_in_range(
                "BCRYPT_COST",
                &or_default("BCRYPT_COST", &bcrypt::DEFAULT_COST.to_string()),
                MIN_HASH_COST..=31,
            )?,
            server_port: parse_in_range(
                "SERVER_PORT",
                &or_default("SERVER_PORT", "8080"),
                0..=u16::MAX,
            )?,
            server_host: or_default("SERVER_HOST", "127.0.0.1"),
        })
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }

    /// `*` in the origin list lets any origin through.
    pub fn allows_any_origin(&self) -> bool {
        self.cors_origins.iter().any(|origin| origin == "*")
    }

    /// CORS policy for the configured origins. Built per worker.
    pub fn cors(&self) -> Cors {
        let cors = if self.allows_any_origin() {
            Cors::default().allow_any_origin()
        } else {
            self.cors_origins
                .iter()
                .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
        };
        cors.allow_any_method()
            .allow_any_header()
            .supports_credentials()
            .max_age(3600)
    }
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(String::from)
        .collect()
}

fn parse_algorithm(raw: &str) -> Result<Algorithm, ConfigError> {
    let invalid = || ConfigError::Invalid {
        key: "JWT_ALGORITHM",
        value: raw.to_string(),
    };
    // Only the HMAC family can sign with a shared secret.
    match Algorithm::from_str(raw).map_err(|_| invalid())? {
        alg @ (Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512) => Ok(alg),
        _ => Err(invalid()),
    }
}

fn parse_in_range<T>(
    key: &'static str,
    raw: &str,
    range: std::ops::RangeInclusive<T>,
) -> Result<T, ConfigError>
where
    T: FromStr + PartialOrd,
{
    raw.trim()
        .parse::<T>()
        .ok()
        .filter(|value| range.contains(value))
        .ok_or_else(|| ConfigError::Invalid {
            key,
            value: raw.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const REQUIRED: [(&str, &str); 2] = [
        ("MONGODB_URI", "mongodb://localhost:27017"),
        ("JWT_SECRET_KEY", "test-secret"),
    ];

    #[test]
    fn test_config_defaults() {
        let config = Config::from_lookup(lookup_from(&REQUIRED)).unwrap();

        assert_eq!(config.mongodb_uri, "mongodb://localhost:27017");
        assert_eq!(config.mongodb_database, "jwt_task_db");
        assert_eq!(config.jwt_algorithm, Algorithm::HS256);
        assert_eq!(config.jwt_expire_minutes, 30);
        assert_eq!(config.cors_origins, vec!["http://localhost:5173"]);
        assert_eq!(config.bcrypt_cost, bcrypt::DEFAULT_COST);
        assert_eq!(config.server_port, 8080);
        assert_eq!(config.server_host, "127.0.0.1");
        assert_eq!(config.server_url(), "http://127.0.0.1:8080");
        assert!(!config.allows_any_origin());
    }

    #[test]
    fn test_config_overrides() {
        let mut pairs = REQUIRED.to_vec();
        pairs.extend([
            ("JWT_ALGORITHM", "HS512"),
            ("JWT_ACCESS_TOKEN_EXPIRE_MINUTES", "90"),
            ("CORS_ORIGINS", "https://a.example, https://b.example ,"),
            ("SERVER_PORT", "3000"),
            ("SERVER_HOST", "0.0.0.0"),
            ("BCRYPT_COST", "4"),
        ]);
        let config = Config::from_lookup(lookup_from(&pairs)).unwrap();

        assert_eq!(config.jwt_algorithm, Algorithm::HS512);
        assert_eq!(config.jwt_expire_minutes, 90);
        assert_eq!(
            config.cors_origins,
            vec!["https://a.example", "https://b.example"]
        );
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.server_host, "0.0.0.0");
        assert_eq!(config.bcrypt_cost, 4);
    }

    #[test]
    fn test_config_missing_required() {
        let err = Config::from_lookup(lookup_from(&[("JWT_SECRET_KEY", "s")])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("MONGODB_URI"));

        let err =
            Config::from_lookup(lookup_from(&[("MONGODB_URI", "mongodb://x")])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("JWT_SECRET_KEY"));
    }

    #[test]
    fn test_config_rejects_invalid_values() {
        for (key, value) in [
            ("JWT_ALGORITHM", "RS256"),
            ("JWT_ALGORITHM", "none"),
            ("JWT_ACCESS_TOKEN_EXPIRE_MINUTES", "0"),
            ("SERVER_PORT", "eighty"),
            ("BCRYPT_COST", "2"),
        ] {
            let mut pairs = REQUIRED.to_vec();
            pairs.push((key, value));
            match Config::from_lookup(lookup_from(&pairs)) {
                Err(ConfigError::Invalid { key: bad_key, .. }) => assert_eq!(bad_key, key),
                other => panic!("{}={} should be rejected, got {:?}", key, value, other),
            }
        }
    }

    #[test]
    fn test_wildcard_origin() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("CORS_ORIGINS", "*"));
        let config = Config::from_lookup(lookup_from(&pairs)).unwrap();
        assert!(config.allows_any_origin());
    }
}
