use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::credential::Credential;
use crate::services::status;

#[derive(Debug, Default, PartialEq, Eq)]
pub struct SweepStats {
    pub total_checked: usize,
    pub still_valid: usize,
    pub expired: u64,
}

/// Marks every ACTIVE credential that is no longer valid as EXPIRED.
///
/// Validity is decided by the status engine, so a credential with no expiry
/// date is also retired.
#[tracing::instrument(skip(pool))]
pub async fn expire_overdue_credentials(
    pool: &PgPool,
    today: NaiveDate,
) -> Result<SweepStats, sqlx::Error> {
    let credentials = Credential::list_active(pool).await?;

    tracing::info!(
        total_credentials = credentials.len(),
        "Starting credential expiry sweep"
    );

    let overdue = overdue_ids(&credentials, today);
    let expired = Credential::expire_many(pool, &overdue).await?;

    let stats = SweepStats {
        total_checked: credentials.len(),
        still_valid: credentials.len() - overdue.len(),
        expired,
    };

    tracing::info!(?stats, "Credential expiry sweep completed");

    Ok(stats)
}

fn overdue_ids(credentials: &[Credential], today: NaiveDate) -> Vec<Uuid> {
    credentials
        .iter()
        .filter(|c| !status::is_currently_valid(c, today))
        .map(|c| c.id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::credential::CredentialState;
    use chrono::{Duration, Utc};

    fn active(expiry: Option<NaiveDate>) -> Credential {
        Credential {
            id: Uuid::new_v4(),
            person_id: Uuid::new_v4(),
            card_number: "FVB-1".to_string(),
            issue_date: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
            expiry_date: expiry,
            state: CredentialState::Active,
            suspension_reason: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_overdue_selection() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let yesterday = active(Some(today - Duration::days(1)));
        let due_today = active(Some(today));
        let undated = active(None);
        let future = active(Some(today + Duration::days(90)));

        let ids = overdue_ids(
            &[yesterday.clone(), due_today, undated.clone(), future],
            today,
        );

        assert_eq!(ids, vec![yesterday.id, undated.id]);
    }
}
