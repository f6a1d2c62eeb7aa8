use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct News {
    pub id: Uuid,
    pub title: String,
    pub body: String,
    pub is_published: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl News {
    /// Creates a draft article
    pub async fn create(pool: &PgPool, title: &str, body: &str) -> Result<Self, sqlx::Error> {
        let news = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO news (title, body)
            VALUES ($1, $2)
            RETURNING *
            "#,
        )
        .bind(title)
        .bind(body)
        .fetch_one(pool)
        .await?;

        Ok(news)
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let news = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM news WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(news)
    }

    /// Lists articles, newest first
    pub async fn list(pool: &PgPool, published_only: bool) -> Result<Vec<Self>, sqlx::Error> {
        let query = if published_only {
            r#"
            SELECT * FROM news
            WHERE is_published = TRUE
            ORDER BY published_at DESC
            "#
        } else {
            r#"
            SELECT * FROM news
            ORDER BY created_at DESC
            "#
        };

        let news = sqlx::query_as::<_, Self>(query).fetch_all(pool).await?;

        Ok(news)
    }

    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        title: Option<String>,
        body: Option<String>,
    ) -> Result<Option<Self>, sqlx::Error> {
        let news = sqlx::query_as::<_, Self>(
            r#"
            UPDATE news
            SET
                title = COALESCE($2, title),
                body = COALESCE($3, body),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(title)
        .bind(body)
        .fetch_optional(pool)
        .await?;

        Ok(news)
    }

    /// Publishes an article; the first publication date is kept on re-publish
    pub async fn publish(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let news = sqlx::query_as::<_, Self>(
            r#"
            UPDATE news
            SET
                is_published = TRUE,
                published_at = COALESCE(published_at, NOW()),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(news)
    }

    /// Deletes an article, returning whether a row was removed
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM news WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
