mod auth;
mod config;
mod mailer;
mod session;
mod shared;
mod user;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use config::AuthConfig;
use mailer::LogMailer;
use session::InMemorySessionRepository;
// use session::PostgresSessionRepository; // For production
use shared::AppState;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use user::{Argon2PasswordHasher, InMemoryUserRepository};
// use user::PostgresUserRepository; // For production

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "authgate=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting authentication server");

    let config = AuthConfig::from_env();

    // Create the service with dependency injection
    // Easy to switch between implementations:
    let user_repository = Arc::new(InMemoryUserRepository::new());
    let session_repository = Arc::new(InMemorySessionRepository::new());

    // For production with PostgreSQL:
    // let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    // let pool = sqlx::PgPool::connect(&database_url).await.expect("Failed to connect to database");
    // let user_repository = Arc::new(PostgresUserRepository::new(pool.clone()));
    // let session_repository = Arc::new(PostgresSessionRepository::new(pool));

    let auth_service = Arc::new(auth::AuthService::new(
        user_repository,
        session_repository,
        Arc::new(Argon2PasswordHasher::new()),
        Arc::new(LogMailer::new()),
        config,
    ));
    let app_state = AppState::new(auth_service);

    // build our application; /api/users sits behind the access-token middleware
    let app = Router::new()
        .route("/api/users", get(auth::list_users))
        .layer(middleware::from_fn_with_state(
            app_state.clone(),
            auth::require_auth,
        ))
        .route("/api/registration", post(auth::registration))
        .route("/api/activate/:link", get(auth::activate))
        .route("/api/login", post(auth::login))
        .route("/api/logout", post(auth::logout))
        .route("/api/refresh", post(auth::refresh))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // run our app with hyper, listening globally on port 3000
    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();
    info!("Server running on http://localhost:3000");
    axum::serve(listener, app).await.unwrap();
}
