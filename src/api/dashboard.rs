use axum::{extract::State, routing::get, Json, Router};
use chrono::{NaiveDate, Utc};
use serde::Serialize;

use crate::api::middleware::session::AppState;
use crate::error::Result;
use crate::models::{club::Club, credential::Credential, pass::Pass, person::Person};
use crate::services::status::{self, DisplayState};

#[derive(Debug, Default, PartialEq, Eq, Serialize)]
pub struct CredentialCounts {
    pub active: usize,
    pub expired: usize,
    pub suspended: usize,
    pub pending: usize,
    /// Active credentials running out within the next 30 days
    pub expiring_soon: usize,
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub persons: i64,
    pub active_clubs: i64,
    pub pending_passes: i64,
    pub credentials: CredentialCounts,
}

const EXPIRING_SOON_DAYS: i64 = 30;

/// Groups credentials by the state the UI would show for them today
pub fn count_credentials(credentials: &[Credential], today: NaiveDate) -> CredentialCounts {
    let soon = today + chrono::Duration::days(EXPIRING_SOON_DAYS);

    credentials
        .iter()
        .fold(CredentialCounts::default(), |mut counts, c| {
            match status::credential_display_state(c, today) {
                DisplayState::Active => {
                    counts.active += 1;
                    if c.expiry_date.is_some_and(|expiry| expiry <= soon) {
                        counts.expiring_soon += 1;
                    }
                }
                DisplayState::Expired => counts.expired += 1,
                DisplayState::Suspended => counts.suspended += 1,
                DisplayState::Pending | DisplayState::Rejected => counts.pending += 1,
            }
            counts
        })
}

async fn dashboard(State(state): State<AppState>) -> Result<Json<DashboardResponse>> {
    let credentials = Credential::list_all(&state.pool).await?;

    Ok(Json(DashboardResponse {
        persons: Person::count(&state.pool).await?,
        active_clubs: Club::count_active(&state.pool).await?,
        pending_passes: Pass::count_pending(&state.pool).await?,
        credentials: count_credentials(&credentials, Utc::now().date_naive()),
    }))
}

pub fn admin_router() -> Router<AppState> {
    Router::new().route("/dashboard", get(dashboard))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::credential::CredentialState;
    use uuid::Uuid;

    fn credential(state: CredentialState, expiry: Option<NaiveDate>) -> Credential {
        Credential {
            id: Uuid::new_v4(),
            person_id: Uuid::new_v4(),
            card_number: "FVB-7".to_string(),
            issue_date: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
            expiry_date: expiry,
            state,
            suspension_reason: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_count_credentials() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let credentials = vec![
            credential(CredentialState::Active, NaiveDate::from_ymd_opt(2024, 5, 20)),
            credential(CredentialState::Active, NaiveDate::from_ymd_opt(2025, 5, 1)),
            credential(CredentialState::Active, NaiveDate::from_ymd_opt(2024, 4, 1)),
            credential(CredentialState::Suspended, NaiveDate::from_ymd_opt(2025, 1, 1)),
            credential(CredentialState::Inactive, None),
            credential(CredentialState::Expired, None),
        ];

        let counts = count_credentials(&credentials, today);

        assert_eq!(
            counts,
            CredentialCounts {
                active: 2,
                expired: 2,
                suspended: 1,
                pending: 1,
                expiring_soon: 1,
            }
        );
    }
}
