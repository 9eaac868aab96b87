use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, instrument, warn};

use super::models::SessionModel;
use crate::shared::AppError;

/// Trait for refresh session persistence.
///
/// `save` is an idempotent upsert keyed by user id: the previous refresh
/// token for that user stops resolving through `find_by_token`, which is
/// what makes rotation and the single-active-session invariant hold.
#[async_trait]
pub trait SessionRepository {
    async fn save(&self, session: &SessionModel) -> Result<(), AppError>;
    async fn find_by_token(&self, refresh_token: &str)
        -> Result<Option<SessionModel>, AppError>;
    async fn remove_by_token(
        &self,
        refresh_token: &str,
    ) -> Result<Option<SessionModel>, AppError>;
}

/// In-memory implementation of SessionRepository for development and testing
///
/// The interior Mutex serializes writes per the whole map, which more than
/// satisfies the per-key write ordering the upsert relies on. Data is lost
/// when the application restarts.
pub struct InMemorySessionRepository {
    sessions: Mutex<HashMap<String, SessionModel>>, // keyed by user id
}

impl Default for InMemorySessionRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemorySessionRepository {
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the current number of live sessions
    pub fn session_count(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }

    /// Checks whether a user currently has a live session
    pub fn has_session_for(&self, user_id: &str) -> bool {
        self.sessions.lock().unwrap().contains_key(user_id)
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    #[instrument(skip(self, session))]
    async fn save(&self, session: &SessionModel) -> Result<(), AppError> {
        let mut sessions = self.sessions.lock().unwrap();
        let replaced = sessions
            .insert(session.user_id.clone(), session.clone())
            .is_some();

        debug!(
            user_id = %session.user_id,
            replaced_previous = replaced,
            "Session saved in memory"
        );
        Ok(())
    }

    #[instrument(skip(self, refresh_token))]
    async fn find_by_token(
        &self,
        refresh_token: &str,
    ) -> Result<Option<SessionModel>, AppError> {
        let sessions = self.sessions.lock().unwrap();
        let session = sessions
            .values()
            .find(|s| s.refresh_token == refresh_token)
            .cloned();

        debug!(found = session.is_some(), "Session lookup by token");
        Ok(session)
    }

    #[instrument(skip(self, refresh_token))]
    async fn remove_by_token(
        &self,
        refresh_token: &str,
    ) -> Result<Option<SessionModel>, AppError> {
        let mut sessions = self.sessions.lock().unwrap();
        let user_id = sessions
            .values()
            .find(|s| s.refresh_token == refresh_token)
            .map(|s| s.user_id.clone());

        let removed = user_id.and_then(|id| sessions.remove(&id));
        debug!(removed = removed.is_some(), "Session removal by token");
        Ok(removed)
    }
}

/// PostgreSQL implementation of session repository
pub struct PostgresSessionRepository {
    pool: PgPool,
}

impl PostgresSessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionRepository for PostgresSessionRepository {
    #[instrument(skip(self, session))]
    async fn save(&self, session: &SessionModel) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO user_sessions (user_id, refresh_token, created_at) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (user_id) \
             DO UPDATE SET refresh_token = $2, created_at = $3",
        )
        .bind(&session.user_id)
        .bind(&session.refresh_token)
        .bind(session.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, user_id = %session.user_id, "Failed to save session");
            AppError::DatabaseError(e.to_string())
        })?;

        debug!(user_id = %session.user_id, "Session saved in database");
        Ok(())
    }

    #[instrument(skip(self, refresh_token))]
    async fn find_by_token(
        &self,
        refresh_token: &str,
    ) -> Result<Option<SessionModel>, AppError> {
        let session = sqlx::query_as::<_, SessionModel>(
            "SELECT user_id, refresh_token, created_at FROM user_sessions \
             WHERE refresh_token = $1",
        )
        .bind(refresh_token)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to fetch session by token");
            AppError::DatabaseError(e.to_string())
        })?;

        debug!(found = session.is_some(), "Session lookup by token");
        Ok(session)
    }

    #[instrument(skip(self, refresh_token))]
    async fn remove_by_token(
        &self,
        refresh_token: &str,
    ) -> Result<Option<SessionModel>, AppError> {
        let removed = sqlx::query_as::<_, SessionModel>(
            "DELETE FROM user_sessions WHERE refresh_token = $1 \
             RETURNING user_id, refresh_token, created_at",
        )
        .bind(refresh_token)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to delete session by token");
            AppError::DatabaseError(e.to_string())
        })?;

        debug!(removed = removed.is_some(), "Session removal by token");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_and_find() {
        let repo = InMemorySessionRepository::new();
        let session = SessionModel::new("user-1".to_string(), "token-a".to_string());

        repo.save(&session).await.unwrap();

        let found = repo.find_by_token("token-a").await.unwrap();
        assert!(found.is_some());
        assert_eq!(found.unwrap().user_id, "user-1");
    }

    #[tokio::test]
    async fn test_find_unknown_token() {
        let repo = InMemorySessionRepository::new();

        let found = repo.find_by_token("nonexistent").await.unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_save_overwrites_previous_token() {
        let repo = InMemorySessionRepository::new();

        repo.save(&SessionModel::new("user-1".to_string(), "old-token".to_string()))
            .await
            .unwrap();
        repo.save(&SessionModel::new("user-1".to_string(), "new-token".to_string()))
            .await
            .unwrap();

        // Single session per user; the old token no longer resolves
        assert_eq!(repo.session_count(), 1);
        assert!(repo.find_by_token("old-token").await.unwrap().is_none());
        assert!(repo.find_by_token("new-token").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_remove_by_token_returns_record() {
        let repo = InMemorySessionRepository::new();
        repo.save(&SessionModel::new("user-1".to_string(), "token-a".to_string()))
            .await
            .unwrap();

        let removed = repo.remove_by_token("token-a").await.unwrap();
        assert!(removed.is_some());
        assert_eq!(removed.unwrap().user_id, "user-1");

        assert!(!repo.has_session_for("user-1"));
        assert!(repo.find_by_token("token-a").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_remove_unknown_token_is_none_not_error() {
        let repo = InMemorySessionRepository::new();

        let removed = repo.remove_by_token("nonexistent").await.unwrap();
        assert!(removed.is_none());
    }

    #[tokio::test]
    async fn test_sessions_for_different_users_coexist() {
        let repo = InMemorySessionRepository::new();

        repo.save(&SessionModel::new("user-1".to_string(), "token-a".to_string()))
            .await
            .unwrap();
        repo.save(&SessionModel::new("user-2".to_string(), "token-b".to_string()))
            .await
            .unwrap();

        assert_eq!(repo.session_count(), 2);
        assert!(repo.find_by_token("token-a").await.unwrap().is_some());
        assert!(repo.find_by_token("token-b").await.unwrap().is_some());
    }
}
