// API module - HTTP endpoints

pub mod auth;
pub mod clubs;
pub mod credentials;
pub mod dashboard;
pub mod health;
pub mod middleware;
pub mod news;
pub mod passes;
pub mod persons;
pub mod status;

use axum::{
    http::{header, HeaderValue, Method},
    routing::get,
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tower_sessions::SessionManagerLayer;
use tower_sessions_sqlx_store::PostgresStore;

use self::middleware::{auth::require_admin, session::AppState};

/// Assembles the full application router.
///
/// Public routes sit at the root; everything under `/admin` requires an
/// admin session.
pub fn app(
    state: AppState,
    session_layer: SessionManagerLayer<PostgresStore>,
) -> anyhow::Result<Router> {
    let cors = CorsLayer::new()
        .allow_origin(state.config.base_url.parse::<HeaderValue>()?)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true);

    let admin = Router::new()
        .merge(clubs::admin_router())
        .merge(persons::admin_router())
        .merge(credentials::admin_router())
        .merge(passes::admin_router())
        .merge(news::admin_router())
        .merge(dashboard::admin_router())
        .route_layer(axum::middleware::from_fn(require_admin));

    let router = Router::new()
        .route("/health", get(health::health_check))
        .merge(auth::router())
        .merge(status::router())
        .merge(clubs::router())
        .merge(credentials::router())
        .merge(news::router())
        .nest("/admin", admin)
        .layer(session_layer)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Ok(router)
}

/// Trims a submitted value, mapping blank input to `None`
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}


#[cfg(test)]
mod tests {
    use super::test_support::{send, send_json, test_app};
    use super::*;
    use axum::http::StatusCode;
    use serde_json::json;

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(Some("  Club  ".to_string())).as_deref(), Some("Club"));
        assert_eq!(non_blank(Some("   ".to_string())), None);
        assert_eq!(non_blank(None), None);
    }

    #[tokio::test]
    async fn test_admin_routes_require_session() {
        for uri in [
            "/admin/dashboard",
            "/admin/persons",
            "/admin/passes/pending",
            "/admin/news",
        ] {
            let response = send(test_app(), "GET", uri).await;
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{}", uri);
        }
    }

    #[tokio::test]
    async fn test_login_rejects_wrong_password() {
        let response = send_json(
            test_app(),
            "POST",
            "/auth/login",
            json!({ "username": "admin", "password": "guess" }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_me_without_session() {
        let response = send(test_app(), "GET", "/auth/me").await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let response = send(test_app(), "GET", "/does-not-exist").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
