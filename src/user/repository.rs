use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, instrument, warn};

use super::models::UserModel;
use crate::shared::AppError;

/// Trait for user account persistence
#[async_trait]
pub trait UserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserModel>, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<UserModel>, AppError>;
    async fn find_by_activation_token(&self, token: &str)
        -> Result<Option<UserModel>, AppError>;
    async fn create(&self, user: &UserModel) -> Result<(), AppError>;
    async fn update(&self, user: &UserModel) -> Result<(), AppError>;
    async fn list_all(&self) -> Result<Vec<UserModel>, AppError>;
}

/// In-memory implementation of UserRepository for development and testing
///
/// Data is stored in memory and lost when the application restarts.
/// Email uniqueness is enforced on create, matching the database
/// constraint of the Postgres implementation.
pub struct InMemoryUserRepository {
    users: Mutex<HashMap<String, UserModel>>, // keyed by user id
}

impl Default for InMemoryUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self {
            users: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the current number of users in the repository
    pub fn user_count(&self) -> usize {
        self.users.lock().unwrap().len()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    #[instrument(skip(self))]
    async fn find_by_email(&self, email: &str) -> Result<Option<UserModel>, AppError> {
        let users = self.users.lock().unwrap();
        let user = users.values().find(|u| u.email == email).cloned();

        debug!(email = %email, found = user.is_some(), "User lookup by email");
        Ok(user)
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: &str) -> Result<Option<UserModel>, AppError> {
        let users = self.users.lock().unwrap();
        let user = users.get(id).cloned();

        debug!(user_id = %id, found = user.is_some(), "User lookup by id");
        Ok(user)
    }

    #[instrument(skip(self))]
    async fn find_by_activation_token(
        &self,
        token: &str,
    ) -> Result<Option<UserModel>, AppError> {
        let users = self.users.lock().unwrap();
        let user = users
            .values()
            .find(|u| u.activation_token == token)
            .cloned();

        debug!(found = user.is_some(), "User lookup by activation token");
        Ok(user)
    }

    #[instrument(skip(self, user))]
    async fn create(&self, user: &UserModel) -> Result<(), AppError> {
        let mut users = self.users.lock().unwrap();

        if users.values().any(|u| u.email == user.email) {
            warn!(email = %user.email, "Email already taken");
            return Err(AppError::DatabaseError(format!(
                "duplicate email: {}",
                user.email
            )));
        }
        users.insert(user.id.clone(), user.clone());

        debug!(user_id = %user.id, email = %user.email, "User created in memory");
        Ok(())
    }

    #[instrument(skip(self, user))]
    async fn update(&self, user: &UserModel) -> Result<(), AppError> {
        let mut users = self.users.lock().unwrap();

        if !users.contains_key(&user.id) {
            warn!(user_id = %user.id, "User not found for update in memory");
            return Err(AppError::NotFound("User not found".to_string()));
        }
        users.insert(user.id.clone(), user.clone());

        debug!(user_id = %user.id, "User updated in memory");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_all(&self) -> Result<Vec<UserModel>, AppError> {
        let users = self.users.lock().unwrap();
        let all: Vec<UserModel> = users.values().cloned().collect();

        debug!(user_count = all.len(), "Listed users from memory");
        Ok(all)
    }
}

/// PostgreSQL implementation of user repository
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    #[instrument(skip(self))]
    async fn find_by_email(&self, email: &str) -> Result<Option<UserModel>, AppError> {
        let user = sqlx::query_as::<_, UserModel>(
            "SELECT id, email, password_hash, activation_token, is_activated, created_at \
             FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to fetch user by email");
            AppError::DatabaseError(e.to_string())
        })?;

        debug!(email = %email, found = user.is_some(), "User lookup by email");
        Ok(user)
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: &str) -> Result<Option<UserModel>, AppError> {
        let user = sqlx::query_as::<_, UserModel>(
            "SELECT id, email, password_hash, activation_token, is_activated, created_at \
             FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, user_id = %id, "Failed to fetch user by id");
            AppError::DatabaseError(e.to_string())
        })?;

        Ok(user)
    }

    #[instrument(skip(self))]
    async fn find_by_activation_token(
        &self,
        token: &str,
    ) -> Result<Option<UserModel>, AppError> {
        let user = sqlx::query_as::<_, UserModel>(
            "SELECT id, email, password_hash, activation_token, is_activated, created_at \
             FROM users WHERE activation_token = $1",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to fetch user by activation token");
            AppError::DatabaseError(e.to_string())
        })?;

        Ok(user)
    }

    #[instrument(skip(self, user))]
    async fn create(&self, user: &UserModel) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO users (id, email, password_hash, activation_token, is_activated, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(&user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.activation_token)
        .bind(user.is_activated)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, email = %user.email, "Failed to create user");
            AppError::DatabaseError(e.to_string())
        })?;

        debug!(user_id = %user.id, "User created in database");
        Ok(())
    }

    #[instrument(skip(self, user))]
    async fn update(&self, user: &UserModel) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE users SET email = $2, password_hash = $3, activation_token = $4, \
             is_activated = $5 WHERE id = $1",
        )
        .bind(&user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.activation_token)
        .bind(user.is_activated)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, user_id = %user.id, "Failed to update user");
            AppError::DatabaseError(e.to_string())
        })?;

        if result.rows_affected() == 0 {
            warn!(user_id = %user.id, "User not found for update");
            return Err(AppError::NotFound("User not found".to_string()));
        }

        debug!(user_id = %user.id, "User updated in database");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_all(&self) -> Result<Vec<UserModel>, AppError> {
        let users = sqlx::query_as::<_, UserModel>(
            "SELECT id, email, password_hash, activation_token, is_activated, created_at \
             FROM users",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to list users");
            AppError::DatabaseError(e.to_string())
        })?;

        debug!(user_count = users.len(), "Listed users from database");
        Ok(users)
    }
}
