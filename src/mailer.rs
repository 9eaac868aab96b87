use async_trait::async_trait;
use std::sync::Mutex;
use thiserror::Error;
use tracing::{debug, info};

/// Delivery of the account activation message.
///
/// Implementations may fail on network or provider errors; how a failure
/// affects registration is decided by the orchestrator's delivery policy,
/// not here.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_activation(&self, email: &str, link: &str) -> Result<(), MailerError>;
}

#[derive(Debug, Clone, Error)]
pub enum MailerError {
    #[error("Mail delivery failed: {0}")]
    DeliveryFailed(String),
}

/// Mailer that writes the activation link to the log instead of sending
/// anything. The development default; pair it with a real provider-backed
/// implementation in production.
pub struct LogMailer;

impl LogMailer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LogMailer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send_activation(&self, email: &str, link: &str) -> Result<(), MailerError> {
        info!(email = %email, link = %link, "Activation mail (logged, not sent)");
        Ok(())
    }
}

/// Mailer that records every message in memory for inspection in tests
pub struct InMemoryMailer {
    sent: Mutex<Vec<(String, String)>>, // (email, link) pairs
}

impl Default for InMemoryMailer {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryMailer {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Returns all messages sent so far
    pub fn sent_messages(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }

    /// Returns the link from the most recent message to the given address
    pub fn last_link_for(&self, email: &str) -> Option<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(to, _)| to == email)
            .map(|(_, link)| link.clone())
    }
}

#[async_trait]
impl Mailer for InMemoryMailer {
    async fn send_activation(&self, email: &str, link: &str) -> Result<(), MailerError> {
        let mut sent = self.sent.lock().unwrap();
        sent.push((email.to_string(), link.to_string()));

        debug!(email = %email, "Activation mail recorded in memory");
        Ok(())
    }
}
