use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Company {
    pub id: Uuid,
    pub name: String,
    pub website: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateCompany {
    pub name: String,
    pub website: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct UpdateCompany {
    pub name: Option<String>,
    pub website: Option<String>,
    pub notes: Option<String>,
}

impl Company {
    pub async fn create(pool: &SqlitePool, data: &CreateCompany) -> Result<Self, sqlx::Error> {
        let id = Uuid::new_v4();
        sqlx::query_as::<_, Company>(
            r#"INSERT INTO companies (id, name, website, notes)
               VALUES ($1, $2, $3, $4)
               RETURNING id, name, website, notes, created_at, updated_at"#,
        )
        .bind(id)
        .bind(&data.name)
        .bind(&data.website)
        .bind(&data.notes)
        .fetch_one(pool)
        .await
    }

    pub async fn find_all(pool: &SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Company>(
            r#"SELECT id, name, website, notes, created_at, updated_at
               FROM companies
               ORDER BY name ASC"#,
        )
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Company>(
            r#"SELECT id, name, website, notes, created_at, updated_at
               FROM companies
               WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn update(
        pool: &SqlitePool,
        id: Uuid,
        data: &UpdateCompany,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Company>(
            r#"UPDATE companies
               SET name = COALESCE($2, name),
                   website = COALESCE($3, website),
                   notes = COALESCE($4, notes),
                   updated_at = datetime('now', 'subsec')
               WHERE id = $1
               RETURNING id, name, website, notes, created_at, updated_at"#,
        )
        .bind(id)
        .bind(&data.name)
        .bind(&data.website)
        .bind(&data.notes)
        .fetch_optional(pool)
        .await
    }

    pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM companies WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
