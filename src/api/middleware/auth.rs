use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tower_sessions::Session;

use super::session::SESSION_KEY_ADMIN;

/// Authentication error responses
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Session error: {0}")]
    SessionError(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = match self {
            AuthError::Unauthorized => StatusCode::UNAUTHORIZED,
            AuthError::SessionError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(json!({ "message": self.to_string() }))).into_response()
    }
}

/// Middleware that rejects requests without an admin session
pub async fn require_admin(
    session: Session,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    get_authenticated_admin(&session).await?;

    Ok(next.run(request).await)
}

/// The administrator bound to the current session
#[derive(Debug, Clone)]
pub struct AuthenticatedAdmin {
    pub username: String,
}

pub async fn get_authenticated_admin(session: &Session) -> Result<AuthenticatedAdmin, AuthError> {
    let username: String = session
        .get(SESSION_KEY_ADMIN)
        .await
        .map_err(|e| AuthError::SessionError(e.to_string()))?
        .ok_or(AuthError::Unauthorized)?;

    Ok(AuthenticatedAdmin { username })
}
