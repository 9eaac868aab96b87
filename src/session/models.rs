use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Database model for the user_sessions table.
///
/// One row per user: the currently trusted refresh token. Rotation
/// overwrites the row rather than appending a new one.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct SessionModel {
    pub user_id: String,
    pub refresh_token: String,
    pub created_at: DateTime<Utc>,
}

impl SessionModel {
    pub fn new(user_id: String, refresh_token: String) -> Self {
        Self {
            user_id,
            refresh_token,
            created_at: Utc::now(),
        }
    }
}
