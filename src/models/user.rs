use bson::oid::ObjectId;
use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// A user as stored in the `users` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: String,
    pub email: String,
    pub hashed_password: String,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl User {
    /// A new user with a fresh id. The timestamp is truncated to the
    /// millisecond precision the store keeps, so what we return on insert
    /// matches what a later read gives back.
    pub fn new(name: String, email: String, hashed_password: String) -> Self {
        Self {
            id: ObjectId::new(),
            name,
            email,
            hashed_password,
            created_at: Utc::now().trunc_subsecs(3),
        }
    }
}

/// Public view of a user; never includes the password hash.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id.to_hex(),
            name: user.name,
            email: user.email,
            created_at: user.created_at,
        }
    }
}

/// Canonical form of an already validated address: the domain is case-insensitive
/// and is lowercased, the local part is kept as given.
pub fn normalize_email(email: &str) -> String {
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{}@{}", local, domain.to_lowercase()),
        None => email.to_string(),
    }
}

/// Partial profile update; absent fields are left as they are.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateUserRequest {
    /// 2 to 100 characters, at least one of them not whitespace.
    #[validate(
        length(min = 2, max = 100),
        regex(path = "crate::auth::NAME_REGEX", message = "Name must not be blank")
    )]
    pub name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
}

impl UpdateUserRequest {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none()
    }

    /// The same update with its email in canonical form.
    pub fn normalized(self) -> Self {
        Self {
            email: self.email.as_deref().map(normalize_email),
            ..self
        }
    }
}
