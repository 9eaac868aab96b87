use serde::{Deserialize, Serialize};

use crate::user::PublicUser;

/// Request body for registration and login
#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

/// Request body for logout and refresh
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    #[serde(default)]
    pub refresh_token: String,
}

/// Response for every workflow that opens a session
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: PublicUser,
}

/// Response for logout, reporting whether a session was actually revoked
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct LogoutResponse {
    pub revoked: bool,
}
