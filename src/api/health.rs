use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::api::middleware::session::AppState;
use crate::db;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

#[derive(Debug, Serialize)]
pub struct DatabaseHealth {
    pub reachable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u128>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema_version: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub checked_at: DateTime<Utc>,
    pub version: &'static str,
    pub database: DatabaseHealth,
}

impl HealthResponse {
    fn from_database(database: DatabaseHealth) -> Self {
        let status = if database.reachable {
            HealthStatus::Healthy
        } else {
            HealthStatus::Unhealthy
        };

        Self {
            status,
            checked_at: Utc::now(),
            version: env!("CARGO_PKG_VERSION"),
            database,
        }
    }

    fn status_code(&self) -> StatusCode {
        match self.status {
            HealthStatus::Healthy => StatusCode::OK,
            HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

/// 200 when the database answers, 503 otherwise
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let database = match db::ping(&state.pool).await {
        Ok(latency) => DatabaseHealth {
            reachable: true,
            latency_ms: Some(latency.as_millis()),
            schema_version: db::schema_version(&state.pool).await.ok().flatten(),
        },
        Err(e) => {
            tracing::warn!(error = %e, "Database unreachable during health check");
            DatabaseHealth {
                reachable: false,
                latency_ms: None,
                schema_version: None,
            }
        }
    };

    let response = HealthResponse::from_database(database);

    (response.status_code(), Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::{body_json, send, test_app};

    #[test]
    fn test_status_follows_database() {
        let up = HealthResponse::from_database(DatabaseHealth {
            reachable: true,
            latency_ms: Some(2),
            schema_version: Some(20240101000000),
        });
        assert_eq!(up.status, HealthStatus::Healthy);
        assert_eq!(up.status_code(), StatusCode::OK);

        let down = HealthResponse::from_database(DatabaseHealth {
            reachable: false,
            latency_ms: None,
            schema_version: None,
        });
        assert_eq!(down.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_health_without_database() {
        let response = send(test_app(), "GET", "/health").await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let body = body_json(response).await;
        assert_eq!(body["status"], "unhealthy");
        assert_eq!(body["database"]["reachable"], false);
        assert!(body["database"].get("error").is_none());
        assert!(body["database"].get("latency_ms").is_none());
    }
}
