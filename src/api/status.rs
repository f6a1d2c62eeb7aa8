use axum::{routing::post, Json, Router};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;

use crate::api::middleware::session::AppState;
use crate::error::{AppError, Result};
use crate::models::credential::CredentialState;
use crate::services::status::{self, CredentialStatus};

#[derive(Debug, Deserialize)]
pub struct PreviewRequest {
    pub state: CredentialState,
    pub suspension_reason: Option<String>,
    pub expiry_date: Option<String>,
    pub today: Option<String>,
}

/// Derives label, display state and validity for credential data the
/// front end has not saved yet (e.g. while an admin fills in a form)
async fn preview(Json(req): Json<PreviewRequest>) -> Result<Json<CredentialStatus>> {
    let today = match req.today.as_deref() {
        Some(raw) => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
            .map_err(|_| AppError::Validation(format!("Invalid reference date: {}", raw)))?,
        None => Utc::now().date_naive(),
    };

    Ok(Json(status::evaluate_raw(
        req.state,
        req.suspension_reason.as_deref(),
        req.expiry_date.as_deref(),
        today,
    )))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/status/preview", post(preview))
}
