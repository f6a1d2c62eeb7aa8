use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Club {
    pub id: Uuid,
    pub name: String,
    pub short_name: Option<String>,
    pub city: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateClubData {
    pub name: String,
    pub short_name: Option<String>,
    pub city: Option<String>,
}

impl Club {
    /// Registers a new club
    pub async fn create(pool: &PgPool, data: CreateClubData) -> Result<Self, sqlx::Error> {
        let club = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO clubs (name, short_name, city)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(&data.name)
        .bind(&data.short_name)
        .bind(&data.city)
        .fetch_one(pool)
        .await?;

        Ok(club)
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let club = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM clubs WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(club)
    }

    /// Lists clubs alphabetically, optionally hiding inactive ones
    pub async fn list(pool: &PgPool, active_only: bool) -> Result<Vec<Self>, sqlx::Error> {
        let query = if active_only {
            r#"
            SELECT * FROM clubs
            WHERE is_active = TRUE
            ORDER BY name ASC
            "#
        } else {
            r#"
            SELECT * FROM clubs
            ORDER BY name ASC
            "#
        };

        let clubs = sqlx::query_as::<_, Self>(query).fetch_all(pool).await?;

        Ok(clubs)
    }

    pub async fn count_active(pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM clubs WHERE is_active = TRUE
            "#,
        )
        .fetch_one(pool)
        .await
    }

    /// Updates club details, leaving absent fields untouched
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        name: Option<String>,
        short_name: Option<String>,
        city: Option<String>,
    ) -> Result<Option<Self>, sqlx::Error> {
        let club = sqlx::query_as::<_, Self>(
            r#"
            UPDATE clubs
            SET
                name = COALESCE($2, name),
                short_name = COALESCE($3, short_name),
                city = COALESCE($4, city),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(short_name)
        .bind(city)
        .fetch_optional(pool)
        .await?;

        Ok(club)
    }

    /// Flips the active flag in a single statement
    pub async fn toggle_active(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let club = sqlx::query_as::<_, Self>(
            r#"
            UPDATE clubs
            SET is_active = NOT is_active, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(club)
    }

    /// Reads a club and holds a share lock on it until the transaction ends
    pub async fn find_for_share(
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let club = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM clubs WHERE id = $1 FOR SHARE
            "#,
        )
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?;

        Ok(club)
    }
}
