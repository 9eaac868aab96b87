use serde::{Deserialize, Serialize};

use crate::user::UserModel;

/// JWT claims embedded in both access and refresh tokens
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    pub sub: String, // user id
    pub email: String,
    pub is_activated: bool,
    pub exp: usize, // Expiration timestamp (standard JWT claim)
    pub iat: usize, // Issued at timestamp (standard JWT claim)
}

/// A freshly minted access/refresh token pair
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

impl Claims {
    /// Builds the claim set for a user, stamped with the given lifetime.
    pub fn for_user(user: &UserModel, issued_at: i64, expires_at: i64) -> Self {
        Self {
            sub: user.id.clone(),
            email: user.email.clone(),
            is_activated: user.is_activated,
            exp: expires_at as usize,
            iat: issued_at as usize,
        }
    }
}
