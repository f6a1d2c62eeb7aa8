use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "pass_authorization", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PassAuthorization {
    Authorized,
    Pending,
    Rejected,
}

/// A transfer of a person from one club to another
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Pass {
    pub id: Uuid,
    pub person_id: Uuid,
    pub origin_club_id: Option<Uuid>, // None for a first registration
    pub destination_club_id: Uuid,
    pub pass_date: NaiveDate,
    #[sqlx(rename = "authorization_status")]
    pub authorization: PassAuthorization,
    pub notes: Option<String>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreatePassData {
    pub person_id: Uuid,
    pub origin_club_id: Option<Uuid>,
    pub destination_club_id: Uuid,
    pub pass_date: NaiveDate,
    pub notes: Option<String>,
}

impl Pass {
    /// Creates a new pass awaiting authorization
    pub async fn create(pool: &PgPool, data: CreatePassData) -> Result<Self, sqlx::Error> {
        let pass = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO passes (person_id, origin_club_id, destination_club_id, pass_date, notes)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(data.person_id)
        .bind(data.origin_club_id)
        .bind(data.destination_club_id)
        .bind(data.pass_date)
        .bind(data.notes)
        .fetch_one(pool)
        .await?;

        Ok(pass)
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let pass = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM passes WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(pass)
    }

    /// Locks a pass row for the rest of the transaction
    pub async fn find_for_update(
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let pass = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM passes WHERE id = $1 FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?;

        Ok(pass)
    }

    pub async fn list_by_person(pool: &PgPool, person_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let passes = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM passes
            WHERE person_id = $1
            ORDER BY pass_date DESC, created_at DESC
            "#,
        )
        .bind(person_id)
        .fetch_all(pool)
        .await?;

        Ok(passes)
    }

    pub async fn list_pending(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        let passes = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM passes
            WHERE authorization_status = 'PENDING'
            ORDER BY pass_date ASC
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(passes)
    }

    pub async fn count_pending(pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM passes WHERE authorization_status = 'PENDING'
            "#,
        )
        .fetch_one(pool)
        .await
    }

    /// Records the authorization decision on a pass
    pub async fn set_authorization(
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
        authorization: PassAuthorization,
    ) -> Result<Self, sqlx::Error> {
        let pass = sqlx::query_as::<_, Self>(
            r#"
            UPDATE passes
            SET authorization_status = $2, resolved_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(authorization)
        .fetch_one(&mut **tx)
        .await?;

        Ok(pass)
    }
}
