use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "credential_state", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CredentialState {
    Active,
    Inactive,
    Suspended,
    Expired,
}

impl CredentialState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialState::Active => "ACTIVE",
            CredentialState::Inactive => "INACTIVE",
            CredentialState::Suspended => "SUSPENDED",
            CredentialState::Expired => "EXPIRED",
        }
    }
}

/// A membership card / license with a validity window
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Credential {
    pub id: Uuid,
    pub person_id: Uuid,
    pub card_number: String,
    pub issue_date: NaiveDate,
    pub expiry_date: Option<NaiveDate>,
    pub state: CredentialState,
    pub suspension_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCredentialData {
    pub person_id: Uuid,
    pub card_number: String,
    pub issue_date: NaiveDate,
    pub expiry_date: Option<NaiveDate>,
    pub state: CredentialState,
}

impl Credential {
    /// Creates a new credential for a person
    pub async fn create(pool: &PgPool, data: CreateCredentialData) -> Result<Self, sqlx::Error> {
        let credential = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO credentials (person_id, card_number, issue_date, expiry_date, state)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(data.person_id)
        .bind(&data.card_number)
        .bind(data.issue_date)
        .bind(data.expiry_date)
        .bind(data.state)
        .fetch_one(pool)
        .await?;

        Ok(credential)
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let credential = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM credentials WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(credential)
    }

    /// Lists a person's credentials, oldest issue first.
    ///
    /// The order matters: display selection picks the first ACTIVE entry.
    pub async fn list_by_person(pool: &PgPool, person_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let credentials = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM credentials
            WHERE person_id = $1
            ORDER BY issue_date ASC, created_at ASC
            "#,
        )
        .bind(person_id)
        .fetch_all(pool)
        .await?;

        Ok(credentials)
    }

    /// Lists every credential currently stored as ACTIVE
    pub async fn list_active(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        let credentials = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM credentials
            WHERE state = 'ACTIVE'
            ORDER BY expiry_date ASC NULLS LAST
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(credentials)
    }

    pub async fn list_all(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        let credentials = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM credentials ORDER BY created_at DESC
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(credentials)
    }

    /// Suspends a credential, recording an optional reason.
    ///
    /// Returns `None` when the row is missing or already EXPIRED.
    pub async fn suspend(
        pool: &PgPool,
        id: Uuid,
        reason: Option<String>,
    ) -> Result<Option<Self>, sqlx::Error> {
        let credential = sqlx::query_as::<_, Self>(
            r#"
            UPDATE credentials
            SET state = 'SUSPENDED', suspension_reason = $2, updated_at = NOW()
            WHERE id = $1 AND state <> 'EXPIRED'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(reason)
        .fetch_optional(pool)
        .await?;

        Ok(credential)
    }

    /// Lifts a suspension and clears its reason. Only SUSPENDED rows with an
    /// expiry date match.
    pub async fn reactivate(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let credential = sqlx::query_as::<_, Self>(
            r#"
            UPDATE credentials
            SET state = 'ACTIVE', suspension_reason = NULL, updated_at = NOW()
            WHERE id = $1 AND state = 'SUSPENDED' AND expiry_date IS NOT NULL
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(credential)
    }

    /// Marks the given credentials EXPIRED, skipping any that left ACTIVE meanwhile
    pub async fn expire_many(pool: &PgPool, ids: &[Uuid]) -> Result<u64, sqlx::Error> {
        if ids.is_empty() {
            return Ok(0);
        }

        let result = sqlx::query(
            r#"
            UPDATE credentials
            SET state = 'EXPIRED', updated_at = NOW()
            WHERE id = ANY($1) AND state = 'ACTIVE'
            "#,
        )
        .bind(ids)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }
}
