// Public API - what other modules can use
pub use models::{PublicUser, UserModel};
pub use password::{Argon2PasswordHasher, PasswordHasher};
pub use repository::{InMemoryUserRepository, PostgresUserRepository, UserRepository};

pub mod models;
pub mod password;
pub mod repository;
