use std::str::FromStr;

use strum_macros::{Display, EnumString};

/// What to do when activation mail delivery fails during registration.
///
/// `FailHard` surfaces the failure to the caller and leaves no session
/// behind. `BestEffort` logs a warning and lets registration complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum DeliveryPolicy {
    FailHard,
    BestEffort,
}

/// Configuration for the authentication service
#[derive(Clone)]
pub struct AuthConfig {
    /// Base URL embedded in activation links, e.g. "http://localhost:3000"
    pub base_url: String,
    pub access_secret: String,
    pub access_ttl_minutes: i64,
    pub refresh_secret: String,
    pub refresh_ttl_days: i64,
    pub delivery_policy: DeliveryPolicy,
}

impl AuthConfig {
    /// Reads configuration from the environment, falling back to
    /// development defaults for anything unset.
    pub fn from_env() -> Self {
        let access_ttl_minutes = std::env::var("ACCESS_TOKEN_TTL_MINUTES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(30);

        let refresh_ttl_days = std::env::var("REFRESH_TOKEN_TTL_DAYS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(30);

        let delivery_policy = std::env::var("ACTIVATION_DELIVERY_POLICY")
            .ok()
            .and_then(|s| DeliveryPolicy::from_str(&s).ok())
            .unwrap_or(DeliveryPolicy::FailHard);

        Self {
            base_url: std::env::var("API_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            access_secret: std::env::var("JWT_ACCESS_SECRET")
                .unwrap_or_else(|_| "access-secret-change-in-production".to_string()),
            access_ttl_minutes,
            refresh_secret: std::env::var("JWT_REFRESH_SECRET")
                .unwrap_or_else(|_| "refresh-secret-change-in-production".to_string()),
            refresh_ttl_days,
            delivery_policy,
        }
    }

    /// Fixed configuration for unit and integration tests.
    pub fn for_tests() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            access_secret: "test-access-secret".to_string(),
            access_ttl_minutes: 30,
            refresh_secret: "test-refresh-secret".to_string(),
            refresh_ttl_days: 30,
            delivery_policy: DeliveryPolicy::FailHard,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self::from_env()
    }
}
