// Public API - what other modules can use
pub use models::SessionModel;
pub use repository::{InMemorySessionRepository, PostgresSessionRepository, SessionRepository};
pub use token::TokenIssuer;
pub use types::{Claims, TokenPair};

pub mod models;
pub mod repository;
pub mod token;
pub mod types;
