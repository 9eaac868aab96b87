use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::types::AuthResponse;
use crate::config::{AuthConfig, DeliveryPolicy};
use crate::mailer::Mailer;
use crate::session::{Claims, SessionModel, SessionRepository, TokenIssuer};
use crate::shared::AppError;
use crate::user::{PasswordHasher, PublicUser, UserModel, UserRepository};
use uuid::Uuid;

/// Service orchestrating the account authentication workflows.
///
/// Composes the user store, password hasher, mailer, token issuer and
/// session store into registration, activation, login, logout and refresh.
/// Every workflow is a sequential pipeline: account state is settled before
/// tokens are issued, and tokens are issued before the session is persisted,
/// so a failed step never leaves a usable session behind.
pub struct AuthService {
    users: Arc<dyn UserRepository + Send + Sync>,
    sessions: Arc<dyn SessionRepository + Send + Sync>,
    hasher: Arc<dyn PasswordHasher>,
    mailer: Arc<dyn Mailer>,
    tokens: TokenIssuer,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepository + Send + Sync>,
        sessions: Arc<dyn SessionRepository + Send + Sync>,
        hasher: Arc<dyn PasswordHasher>,
        mailer: Arc<dyn Mailer>,
        config: AuthConfig,
    ) -> Self {
        let tokens = TokenIssuer::new(&config);

        Self {
            users,
            sessions,
            hasher,
            mailer,
            tokens,
            config,
        }
    }

    /// Registers a new account and opens its first session.
    ///
    /// Fails with `AlreadyExists` for a taken email. Mail delivery failure
    /// is governed by the configured `DeliveryPolicy`: fail-hard surfaces
    /// `ActivationDeliveryFailed` (the created account stays, but no session
    /// is persisted), best-effort logs and continues.
    #[instrument(skip(self, password))]
    pub async fn registration(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthResponse, AppError> {
        info!(email = %email, "Starting registration");

        if self.users.find_by_email(email).await?.is_some() {
            warn!(email = %email, "Registration rejected, email already taken");
            return Err(AppError::AlreadyExists(format!(
                "User {} already exists",
                email
            )));
        }

        let password_hash = self.hasher.hash(password).await?;
        let activation_token = Uuid::new_v4().to_string();

        let user = UserModel::new(email.to_string(), password_hash, activation_token);
        self.users.create(&user).await?;
        debug!(user_id = %user.id, "Account created");

        let link = self.activation_link(&user.activation_token);
        if let Err(e) = self.mailer.send_activation(email, &link).await {
            match self.config.delivery_policy {
                DeliveryPolicy::FailHard => {
                    warn!(email = %email, error = %e, "Activation mail failed, failing registration");
                    return Err(AppError::ActivationDeliveryFailed(e.to_string()));
                }
                DeliveryPolicy::BestEffort => {
                    warn!(email = %email, error = %e, "Activation mail failed, continuing");
                }
            }
        }

        let response = self.open_session(&user).await?;
        info!(user_id = %user.id, "Registration completed");
        Ok(response)
    }

    /// Marks the account behind an activation token as activated.
    ///
    /// Re-activating an already active account is a no-op success.
    #[instrument(skip(self, activation_token))]
    pub async fn activate(&self, activation_token: &str) -> Result<(), AppError> {
        let mut user = self
            .users
            .find_by_activation_token(activation_token)
            .await?
            .ok_or_else(|| {
                warn!("Unknown activation token");
                AppError::NotFound("Invalid activation link".to_string())
            })?;

        if user.is_activated {
            debug!(user_id = %user.id, "Account already activated");
            return Ok(());
        }

        user.is_activated = true;
        self.users.update(&user).await?;

        info!(user_id = %user.id, "Account activated");
        Ok(())
    }

    /// Authenticates credentials and opens a session, overwriting any prior
    /// session for the account.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, AppError> {
        info!(email = %email, "Starting login");

        let user = self.users.find_by_email(email).await?.ok_or_else(|| {
            warn!(email = %email, "Login for unknown email");
            AppError::NotFound(format!("User {} is not registered", email))
        })?;

        if !self.hasher.verify(password, &user.password_hash).await? {
            warn!(user_id = %user.id, "Password mismatch");
            return Err(AppError::InvalidCredentials("Incorrect password".to_string()));
        }

        let response = self.open_session(&user).await?;
        info!(user_id = %user.id, "Login completed");
        Ok(response)
    }

    /// Revokes the session holding the given refresh token.
    ///
    /// A token with no live session is tolerated: the call reports that
    /// nothing was removed rather than failing.
    #[instrument(skip(self, refresh_token))]
    pub async fn logout(&self, refresh_token: &str) -> Result<Option<SessionModel>, AppError> {
        let removed = self.sessions.remove_by_token(refresh_token).await?;

        match &removed {
            Some(session) => info!(user_id = %session.user_id, "Session revoked"),
            None => debug!("Logout for token with no live session"),
        }
        Ok(removed)
    }

    /// Rotates a refresh token into a fresh token pair.
    ///
    /// The presented token must both verify against the refresh secret and
    /// still be the stored session for its user; either check failing means
    /// `Unauthorized`. The returned user view reflects the account's current
    /// state, not the claims frozen into the old token.
    #[instrument(skip(self, refresh_token))]
    pub async fn refresh(&self, refresh_token: &str) -> Result<AuthResponse, AppError> {
        if refresh_token.is_empty() {
            return Err(AppError::Unauthorized("Missing refresh token".to_string()));
        }

        let claims = self.tokens.verify_refresh(refresh_token).map_err(|e| {
            warn!(error = %e, "Refresh token failed verification");
            AppError::Unauthorized("Invalid refresh token".to_string())
        })?;

        if self.sessions.find_by_token(refresh_token).await?.is_none() {
            warn!(user_id = %claims.sub, "Refresh token has no stored session, likely rotated away");
            return Err(AppError::Unauthorized("Invalid refresh token".to_string()));
        }

        let user = self
            .users
            .find_by_id(&claims.sub)
            .await?
            .ok_or_else(|| {
                warn!(user_id = %claims.sub, "Refresh token for vanished account");
                AppError::Unauthorized("Invalid refresh token".to_string())
            })?;

        let response = self.open_session(&user).await?;
        info!(user_id = %user.id, "Refresh token rotated");
        Ok(response)
    }

    /// Flat dump of all accounts as public views
    #[instrument(skip(self))]
    pub async fn list_users(&self) -> Result<Vec<PublicUser>, AppError> {
        let users = self.users.list_all().await?;
        debug!(user_count = users.len(), "Users listed");

        Ok(users.iter().map(PublicUser::from).collect())
    }

    /// Validates an access token. Stateless: no store lookup involved.
    pub fn verify_access(&self, token: &str) -> Result<Claims, AppError> {
        self.tokens
            .verify_access(token)
            .map_err(|e| AppError::Unauthorized(e.to_string()))
    }

    /// Issues a token pair for the user and persists the refresh half,
    /// replacing any previous session for that user id.
    async fn open_session(&self, user: &UserModel) -> Result<AuthResponse, AppError> {
        let pair = self.tokens.issue(user)?;
        self.sessions
            .save(&SessionModel::new(user.id.clone(), pair.refresh_token.clone()))
            .await?;

        Ok(AuthResponse {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            user: PublicUser::from(user),
        })
    }

    fn activation_link(&self, activation_token: &str) -> String {
        format!("{}/api/activate/{}", self.config.base_url, activation_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mailer::InMemoryMailer;
    use crate::session::InMemorySessionRepository;
    use crate::shared::test_utils::{AuthServiceBuilder, FailingMailer};
    use crate::user::{Argon2PasswordHasher, InMemoryUserRepository};

    fn service_with_handles() -> (
        AuthService,
        Arc<InMemorySessionRepository>,
        Arc<InMemoryMailer>,
    ) {
        let sessions = Arc::new(InMemorySessionRepository::new());
        let mailer = Arc::new(InMemoryMailer::new());
        let service = AuthService::new(
            Arc::new(InMemoryUserRepository::new()),
            sessions.clone(),
            Arc::new(Argon2PasswordHasher::new()),
            mailer.clone(),
            AuthConfig::for_tests(),
        );
        (service, sessions, mailer)
    }

    #[tokio::test]
    async fn test_registration_returns_tokens_and_user() {
        let (service, sessions, mailer) = service_with_handles();

        let response = service
            .registration("alice@example.com", "pw123")
            .await
            .unwrap();

        assert!(!response.access_token.is_empty());
        assert!(!response.refresh_token.is_empty());
        assert_eq!(response.user.email, "alice@example.com");
        assert!(!response.user.is_activated);

        // Refresh token persisted, activation mail sent
        assert!(sessions.has_session_for(&response.user.id));
        let link = mailer.last_link_for("alice@example.com").unwrap();
        assert!(link.contains("/api/activate/"));
    }

    #[tokio::test]
    async fn test_registration_duplicate_email() {
        let (service, _, _) = service_with_handles();

        service
            .registration("alice@example.com", "pw123")
            .await
            .unwrap();
        let result = service.registration("alice@example.com", "other").await;

        assert!(matches!(result, Err(AppError::AlreadyExists(_))));
    }

    #[tokio::test]
    async fn test_registration_mailer_failure_fail_hard() {
        let service = AuthServiceBuilder::new()
            .with_mailer(Arc::new(FailingMailer))
            .build();

        let result = service.registration("alice@example.com", "pw123").await;
        assert!(matches!(result, Err(AppError::ActivationDeliveryFailed(_))));

        // The account exists but must not be loggable-in via a leftover
        // session; a later login still works with the credentials.
        let login = service.login("alice@example.com", "pw123").await;
        assert!(login.is_ok());
    }

    #[tokio::test]
    async fn test_registration_mailer_failure_best_effort() {
        let service = AuthServiceBuilder::new()
            .with_mailer(Arc::new(FailingMailer))
            .with_delivery_policy(DeliveryPolicy::BestEffort)
            .build();

        let response = service
            .registration("alice@example.com", "pw123")
            .await
            .unwrap();
        assert!(!response.refresh_token.is_empty());
    }

    #[tokio::test]
    async fn test_activation_flow_and_idempotence() {
        let (service, _, mailer) = service_with_handles();

        let response = service
            .registration("alice@example.com", "pw123")
            .await
            .unwrap();
        let link = mailer.last_link_for("alice@example.com").unwrap();
        let token = link.rsplit('/').next().unwrap();

        service.activate(token).await.unwrap();
        // Second activation of the same link succeeds silently
        service.activate(token).await.unwrap();

        let users = service.list_users().await.unwrap();
        let alice = users.iter().find(|u| u.id == response.user.id).unwrap();
        assert!(alice.is_activated);
    }

    #[tokio::test]
    async fn test_activate_unknown_link() {
        let (service, _, _) = service_with_handles();

        let result = service.activate("no-such-token").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_login_unknown_email() {
        let (service, _, _) = service_with_handles();

        let result = service.login("ghost@example.com", "pw123").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_login_wrong_password_issues_nothing() {
        let (service, sessions, _) = service_with_handles();

        let registered = service
            .registration("alice@example.com", "pw123")
            .await
            .unwrap();
        // Drop the registration session so a leaked login session would show
        sessions
            .remove_by_token(&registered.refresh_token)
            .await
            .unwrap();

        let result = service.login("alice@example.com", "wrong").await;
        assert!(matches!(result, Err(AppError::InvalidCredentials(_))));
        assert_eq!(sessions.session_count(), 0);
    }

    #[tokio::test]
    async fn test_second_login_invalidates_first_session() {
        let (service, _, _) = service_with_handles();

        service
            .registration("alice@example.com", "pw123")
            .await
            .unwrap();

        let first = service.login("alice@example.com", "pw123").await.unwrap();
        let second = service.login("alice@example.com", "pw123").await.unwrap();

        // First login's refresh token was rotated away by the second
        let result = service.refresh(&first.refresh_token).await;
        assert!(matches!(result, Err(AppError::Unauthorized(_))));

        assert!(service.refresh(&second.refresh_token).await.is_ok());
    }

    #[tokio::test]
    async fn test_refresh_rotates_exactly_once() {
        let (service, _, _) = service_with_handles();

        let registered = service
            .registration("alice@example.com", "pw123")
            .await
            .unwrap();

        let rotated = service.refresh(&registered.refresh_token).await.unwrap();
        assert_ne!(rotated.refresh_token, registered.refresh_token);

        // Replay of the consumed token fails even though its signature holds
        let replay = service.refresh(&registered.refresh_token).await;
        assert!(matches!(replay, Err(AppError::Unauthorized(_))));

        // The fresh token works
        assert!(service.refresh(&rotated.refresh_token).await.is_ok());
    }

    #[tokio::test]
    async fn test_refresh_reflects_current_activation_status() {
        let (service, _, mailer) = service_with_handles();

        let registered = service
            .registration("alice@example.com", "pw123")
            .await
            .unwrap();
        assert!(!registered.user.is_activated);

        let link = mailer.last_link_for("alice@example.com").unwrap();
        service.activate(link.rsplit('/').next().unwrap()).await.unwrap();

        // Old token still carries is_activated=false in its claims; the
        // refreshed view must show the stored state instead.
        let refreshed = service.refresh(&registered.refresh_token).await.unwrap();
        assert!(refreshed.user.is_activated);
    }

    #[tokio::test]
    async fn test_refresh_rejects_missing_and_garbage_tokens() {
        let (service, _, _) = service_with_handles();

        assert!(matches!(
            service.refresh("").await,
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(
            service.refresh("not.a.jwt").await,
            Err(AppError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn test_logout_then_refresh_fails() {
        let (service, _, _) = service_with_handles();

        let registered = service
            .registration("alice@example.com", "pw123")
            .await
            .unwrap();

        let removed = service.logout(&registered.refresh_token).await.unwrap();
        assert!(removed.is_some());
        assert_eq!(removed.unwrap().user_id, registered.user.id);

        let result = service.refresh(&registered.refresh_token).await;
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_logout_without_session_is_tolerated() {
        let (service, _, _) = service_with_handles();

        let removed = service.logout("never-issued-token").await.unwrap();
        assert!(removed.is_none());
    }

    #[tokio::test]
    async fn test_verify_access_token() {
        let (service, _, _) = service_with_handles();

        let registered = service
            .registration("alice@example.com", "pw123")
            .await
            .unwrap();

        let claims = service.verify_access(&registered.access_token).unwrap();
        assert_eq!(claims.sub, registered.user.id);

        // Refresh tokens are not valid access tokens
        let result = service.verify_access(&registered.refresh_token);
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }
}
