use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

/// A registered affiliate (player) of the federation
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Person {
    pub id: Uuid,
    pub document_number: String,
    pub first_name: String,
    pub last_name: String,
    pub birth_date: Option<NaiveDate>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub club_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreatePersonData {
    pub document_number: String,
    pub first_name: String,
    pub last_name: String,
    pub birth_date: Option<NaiveDate>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub club_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdatePersonData {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl Person {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Registers a new affiliate
    pub async fn create(pool: &PgPool, data: CreatePersonData) -> Result<Self, sqlx::Error> {
        let person = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO persons (document_number, first_name, last_name, birth_date, email, phone, club_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(&data.document_number)
        .bind(&data.first_name)
        .bind(&data.last_name)
        .bind(data.birth_date)
        .bind(&data.email)
        .bind(&data.phone)
        .bind(data.club_id)
        .fetch_one(pool)
        .await?;

        Ok(person)
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let person = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM persons WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(person)
    }

    pub async fn find_by_document_number(
        pool: &PgPool,
        document_number: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let person = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM persons WHERE document_number = $1
            "#,
        )
        .bind(document_number)
        .fetch_optional(pool)
        .await?;

        Ok(person)
    }

    /// Lists affiliates, optionally restricted to a club and/or a name fragment
    pub async fn list(
        pool: &PgPool,
        club_id: Option<Uuid>,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let pattern = search.map(|s| format!("%{}%", escape_like(s.trim())));

        let persons = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM persons
            WHERE ($1::uuid IS NULL OR club_id = $1)
              AND ($2::text IS NULL
                   OR first_name ILIKE $2 ESCAPE '\'
                   OR last_name ILIKE $2 ESCAPE '\'
                   OR document_number ILIKE $2 ESCAPE '\')
            ORDER BY last_name ASC, first_name ASC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(club_id)
        .bind(pattern)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        Ok(persons)
    }

    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM persons
            "#,
        )
        .fetch_one(pool)
        .await
    }

    /// Updates profile fields, leaving absent ones untouched
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdatePersonData,
    ) -> Result<Option<Self>, sqlx::Error> {
        let person = sqlx::query_as::<_, Self>(
            r#"
            UPDATE persons
            SET
                first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                birth_date = COALESCE($4, birth_date),
                email = COALESCE($5, email),
                phone = COALESCE($6, phone),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(data.first_name)
        .bind(data.last_name)
        .bind(data.birth_date)
        .bind(data.email)
        .bind(data.phone)
        .fetch_optional(pool)
        .await?;

        Ok(person)
    }

    /// Locks a person row for the rest of the transaction
    pub async fn find_for_update(
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let person = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM persons WHERE id = $1 FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?;

        Ok(person)
    }

    /// Moves a person to another club as part of a larger transaction
    pub async fn set_club(
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
        club_id: Uuid,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE persons
            SET club_id = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(club_id)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }
}

/// Escapes LIKE metacharacters so user input only matches literally
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
