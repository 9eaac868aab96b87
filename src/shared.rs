use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

use crate::auth::AuthService;

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<AuthService>,
}

impl AppState {
    pub fn new(auth_service: Arc<AuthService>) -> Self {
        Self { auth_service }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Token error: {0}")]
    TokenError(String),

    #[error("Activation delivery failed: {0}")]
    ActivationDeliveryFailed(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal server error")]
    Internal,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::AlreadyExists(msg) => (StatusCode::CONFLICT, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::InvalidCredentials(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::TokenError(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::ActivationDeliveryFailed(msg) => (StatusCode::BAD_GATEWAY, msg),
            AppError::DatabaseError(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Database error: {}", msg),
            ),
            AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
pub mod test_utils {
    use super::*;
    use crate::auth::AuthService;
    use crate::config::{AuthConfig, DeliveryPolicy};
    use crate::mailer::{InMemoryMailer, Mailer, MailerError};
    use crate::session::InMemorySessionRepository;
    use crate::user::{Argon2PasswordHasher, InMemoryUserRepository};
    use async_trait::async_trait;

    /// Mailer that always fails - for exercising the delivery policy
    pub struct FailingMailer;

    #[async_trait]
    impl Mailer for FailingMailer {
        async fn send_activation(&self, _email: &str, _link: &str) -> Result<(), MailerError> {
            Err(MailerError::DeliveryFailed("provider unreachable".to_string()))
        }
    }

    /// Builder for creating a fully in-memory AuthService with overrides
    pub struct AuthServiceBuilder {
        mailer: Option<Arc<dyn Mailer>>,
        config: AuthConfig,
    }

    impl AuthServiceBuilder {
        pub fn new() -> Self {
            Self {
                mailer: None,
                config: AuthConfig::for_tests(),
            }
        }

        pub fn with_mailer(mut self, mailer: Arc<dyn Mailer>) -> Self {
            self.mailer = Some(mailer);
            self
        }

        pub fn with_delivery_policy(mut self, policy: DeliveryPolicy) -> Self {
            self.config.delivery_policy = policy;
            self
        }

        pub fn build(self) -> AuthService {
            AuthService::new(
                Arc::new(InMemoryUserRepository::new()),
                Arc::new(InMemorySessionRepository::new()),
                Arc::new(Argon2PasswordHasher::new()),
                self.mailer.unwrap_or_else(|| Arc::new(InMemoryMailer::new())),
                self.config,
            )
        }
    }

    impl Default for AuthServiceBuilder {
        fn default() -> Self {
            Self::new()
        }
    }
}
