use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use tracing::{debug, instrument};

use super::types::{Claims, TokenPair};
use crate::config::AuthConfig;
use crate::shared::AppError;
use crate::user::UserModel;

/// Mints and verifies access/refresh token pairs.
///
/// The two token classes are signed with distinct secrets, so a leaked
/// access secret cannot forge refresh tokens and vice versa. Verification
/// is purely cryptographic here; the refresh trust decision additionally
/// requires a stored session, which is the orchestrator's job.
#[derive(Clone)]
pub struct TokenIssuer {
    access_secret: String,
    refresh_secret: String,
    access_ttl_minutes: i64,
    refresh_ttl_days: i64,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            access_secret: config.access_secret.clone(),
            refresh_secret: config.refresh_secret.clone(),
            access_ttl_minutes: config.access_ttl_minutes,
            refresh_ttl_days: config.refresh_ttl_days,
        }
    }

    /// Signs a new token pair from the user's current state.
    ///
    /// The pair embeds iat/exp, so issuing twice for the same user yields
    /// different tokens.
    #[instrument(skip(self, user))]
    pub fn issue(&self, user: &UserModel) -> Result<TokenPair, AppError> {
        let now = Utc::now();
        let iat = now.timestamp();

        let access_exp = (now + Duration::minutes(self.access_ttl_minutes)).timestamp();
        let refresh_exp = (now + Duration::days(self.refresh_ttl_days)).timestamp();

        debug!(
            user_id = %user.id,
            access_exp = access_exp,
            refresh_exp = refresh_exp,
            "Issuing token pair"
        );

        let access_token = sign(
            &Claims::for_user(user, iat, access_exp),
            &self.access_secret,
        )?;
        let refresh_token = sign(
            &Claims::for_user(user, iat, refresh_exp),
            &self.refresh_secret,
        )?;

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    /// Validates an access token and returns its claims if valid
    #[instrument(skip(self, token))]
    pub fn verify_access(&self, token: &str) -> Result<Claims, AppError> {
        verify(token, &self.access_secret)
    }

    /// Validates a refresh token signature and expiry.
    ///
    /// Storage-side presence is checked separately by the caller.
    #[instrument(skip(self, token))]
    pub fn verify_refresh(&self, token: &str) -> Result<Claims, AppError> {
        verify(token, &self.refresh_secret)
    }
}

fn sign(claims: &Claims, secret: &str) -> Result<String, AppError> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )
    .map_err(|e| {
        debug!(error = %e, "Failed to encode JWT token");
        AppError::TokenError(e.to_string())
    })
}

fn verify(token: &str, secret: &str) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    )
    .map(|data| {
        debug!(
            user_id = %data.claims.sub,
            exp = data.claims.exp,
            "JWT token decoded successfully"
        );
        data.claims
    })
    .map_err(|e| {
        debug!(error = %e, "Failed to decode JWT token");
        AppError::TokenError(e.to_string())
    })
}
