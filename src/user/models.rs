use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Database model for the users table
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct UserModel {
    pub id: String, // UUID v4 as string
    pub email: String,
    pub password_hash: String,
    /// Opaque one-time token mailed to the user; kept after consumption
    /// as the historical activation link.
    pub activation_token: String,
    pub is_activated: bool,
    pub created_at: DateTime<Utc>,
}

impl UserModel {
    /// Creates a new, not-yet-activated user with a generated id.
    pub fn new(email: String, password_hash: String, activation_token: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email,
            password_hash,
            activation_token,
            is_activated: false,
            created_at: Utc::now(),
        }
    }
}

/// Read-only projection of a user exposed in API responses.
/// Never carries the password hash.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PublicUser {
    pub id: String,
    pub email: String,
    pub is_activated: bool,
}

impl From<&UserModel> for PublicUser {
    fn from(user: &UserModel) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            is_activated: user.is_activated,
        }
    }
}
