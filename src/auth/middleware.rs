use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::{debug, instrument, warn};

use crate::shared::{AppError, AppState};

/// Access-token authentication middleware - validates the Authorization
/// Bearer header and adds Claims to the request.
/// Usage: .layer(middleware::from_fn_with_state(app_state.clone(), auth::require_auth))
/// Handlers can then extract Extension(claims): Extension<Claims>.
///
/// Access tokens are verified statelessly; only refresh tokens carry a
/// storage-side presence requirement.
#[instrument(skip(state, req, next))]
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = req
        .headers()
        .get("Authorization")
        .and_then(|header| header.to_str().ok())
        .ok_or_else(|| {
            warn!("Missing Authorization header in request");
            AppError::Unauthorized("Missing authorization header".to_string())
        })?;

    let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
        warn!("Invalid Authorization header format (expected Bearer token)");
        AppError::Unauthorized("Invalid authorization header format".to_string())
    })?;

    let claims = match state.auth_service.verify_access(token) {
        Ok(claims) => claims,
        Err(e) => {
            warn!("Access token validation failed: {}", e);
            return Err(e);
        }
    };

    debug!(user_id = %claims.sub, "Authentication successful, adding claims to request");
    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}
