use std::sync::Arc;

use async_trait::async_trait;
use authgate::{
    auth::AuthService,
    config::{AuthConfig, DeliveryPolicy},
    mailer::{InMemoryMailer, Mailer, MailerError},
    session::InMemorySessionRepository,
    user::{Argon2PasswordHasher, InMemoryUserRepository},
};

/// Fully in-memory service under test, with handles to the collaborators
/// the assertions need to inspect.
pub struct TestBackend {
    pub service: AuthService,
    pub sessions: Arc<InMemorySessionRepository>,
    pub mailer: Arc<InMemoryMailer>,
}

impl TestBackend {
    pub fn new() -> Self {
        Self::with_policy(DeliveryPolicy::FailHard)
    }

    pub fn with_policy(policy: DeliveryPolicy) -> Self {
        let sessions = Arc::new(InMemorySessionRepository::new());
        let mailer = Arc::new(InMemoryMailer::new());

        let mut config = AuthConfig::for_tests();
        config.delivery_policy = policy;

        let service = AuthService::new(
            Arc::new(InMemoryUserRepository::new()),
            sessions.clone(),
            Arc::new(Argon2PasswordHasher::new()),
            mailer.clone(),
            config,
        );

        Self {
            service,
            sessions,
            mailer,
        }
    }

    /// Extracts the activation token from the latest mail to the address
    pub fn activation_token_for(&self, email: &str) -> String {
        let link = self
            .mailer
            .last_link_for(email)
            .expect("no activation mail recorded for address");
        link.rsplit('/').next().unwrap().to_string()
    }
}

/// Mailer that always fails, for delivery-policy scenarios
pub struct FailingMailer;

#[async_trait]
impl Mailer for FailingMailer {
    async fn send_activation(&self, _email: &str, _link: &str) -> Result<(), MailerError> {
        Err(MailerError::DeliveryFailed("provider unreachable".to_string()))
    }
}
