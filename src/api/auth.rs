use axum::{extract::State, http::StatusCode, routing::get, routing::post, Json, Router};
use chrono::Utc;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::api::middleware::{
    auth::{get_authenticated_admin, AuthError},
    session::{AppState, SESSION_KEY_ADMIN, SESSION_KEY_LOGGED_IN_AT},
};
use crate::config::Config;
use crate::services::signature;

#[derive(Deserialize)]
struct LoginRequest {
    username: String,
    password: String,
}

#[derive(Serialize)]
struct SessionInfo {
    username: String,
}

/// Checks submitted credentials against the configured administrator.
///
/// The configured password is turned into an HMAC tag and the submitted one
/// is verified against it, which keeps the comparison constant-time.
fn credentials_match(config: &Config, username: &str, password: &str) -> bool {
    let key = config.session_secret.expose_secret().as_bytes();
    let expected = signature::sign(config.admin_password.expose_secret(), key);

    let password_ok = signature::verify(password, &expected, key);
    username == config.admin_username && password_ok
}

async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<LoginRequest>,
) -> Result<Json<SessionInfo>, AuthError> {
    if !credentials_match(&state.config, req.username.trim(), &req.password) {
        tracing::warn!(username = %req.username, "Rejected admin login");
        return Err(AuthError::Unauthorized);
    }

    session
        .cycle_id()
        .await
        .map_err(|e| AuthError::SessionError(e.to_string()))?;
    session
        .insert(SESSION_KEY_ADMIN, &state.config.admin_username)
        .await
        .map_err(|e| AuthError::SessionError(e.to_string()))?;
    session
        .insert(SESSION_KEY_LOGGED_IN_AT, Utc::now().to_rfc3339())
        .await
        .map_err(|e| AuthError::SessionError(e.to_string()))?;

    tracing::info!(username = %state.config.admin_username, "Admin logged in");

    Ok(Json(SessionInfo {
        username: state.config.admin_username.clone(),
    }))
}

async fn logout(session: Session) -> Result<StatusCode, AuthError> {
    session
        .flush()
        .await
        .map_err(|e| AuthError::SessionError(e.to_string()))?;

    Ok(StatusCode::NO_CONTENT)
}

async fn me(session: Session) -> Result<Json<SessionInfo>, AuthError> {
    let admin = get_authenticated_admin(&session).await?;

    Ok(Json(SessionInfo {
        username: admin.username,
    }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(me))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::test_config;

    #[test]
    fn test_credentials_match() {
        let config = test_config();

        assert!(credentials_match(&config, "admin", "volley-admin"));
        assert!(!credentials_match(&config, "admin", "wrong"));
        assert!(!credentials_match(&config, "someone", "volley-admin"));
        assert!(!credentials_match(&config, "admin", ""));
    }
}
