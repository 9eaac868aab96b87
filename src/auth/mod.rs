// Public API - what other modules can use
pub use handlers::{activate, list_users, login, logout, refresh, registration};
pub use middleware::require_auth;
pub use service::AuthService;
pub use types::{AuthResponse, CredentialsRequest, LogoutResponse, RefreshRequest};

mod handlers;
mod middleware;
pub mod service;
pub mod types;
