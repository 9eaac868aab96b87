// Library crate for the account authentication service
// This file exposes the public API for integration tests

pub mod auth;
pub mod config;
pub mod mailer;
pub mod session;
pub mod shared;
pub mod user;

// Re-export commonly used types for easier access in tests
pub use auth::{AuthResponse, AuthService};
pub use config::{AuthConfig, DeliveryPolicy};
pub use mailer::{InMemoryMailer, LogMailer, Mailer};
pub use session::{InMemorySessionRepository, SessionRepository, TokenIssuer};
pub use shared::{AppError, AppState};
pub use user::{
    Argon2PasswordHasher, InMemoryUserRepository, PasswordHasher, PublicUser, UserRepository,
};
