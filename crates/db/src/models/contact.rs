use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Contact {
    pub id: Uuid,
    pub company_id: Option<Uuid>,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateContact {
    pub company_id: Option<Uuid>,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct UpdateContact {
    pub company_id: Option<Uuid>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role: Option<String>,
}

impl Contact {
    pub async fn create(pool: &SqlitePool, data: &CreateContact) -> Result<Self, sqlx::Error> {
        let id = Uuid::new_v4();
        sqlx::query_as::<_, Contact>(
            r#"INSERT INTO contacts (id, company_id, name, email, phone, role)
               VALUES ($1, $2, $3, $4, $5, $6)
               RETURNING id, company_id, name, email, phone, role, created_at, updated_at"#,
        )
        .bind(id)
        .bind(data.company_id)
        .bind(&data.name)
        .bind(&data.email)
        .bind(&data.phone)
        .bind(&data.role)
        .fetch_one(pool)
        .await
    }

    pub async fn find_all(pool: &SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Contact>(
            r#"SELECT id, company_id, name, email, phone, role, created_at, updated_at
               FROM contacts
               ORDER BY name ASC"#,
        )
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_company_id(
        pool: &SqlitePool,
        company_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Contact>(
            r#"SELECT id, company_id, name, email, phone, role, created_at, updated_at
               FROM contacts
               WHERE company_id = $1
               ORDER BY name ASC"#,
        )
        .bind(company_id)
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Contact>(
            r#"SELECT id, company_id, name, email, phone, role, created_at, updated_at
               FROM contacts
               WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn update(
        pool: &SqlitePool,
        id: Uuid,
        data: &UpdateContact,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Contact>(
            r#"UPDATE contacts
               SET company_id = COALESCE($2, company_id),
                   name = COALESCE($3, name),
                   email = COALESCE($4, email),
                   phone = COALESCE($5, phone),
                   role = COALESCE($6, role),
                   updated_at = datetime('now', 'subsec')
               WHERE id = $1
               RETURNING id, company_id, name, email, phone, role, created_at, updated_at"#,
        )
        .bind(id)
        .bind(data.company_id)
        .bind(&data.name)
        .bind(&data.email)
        .bind(&data.phone)
        .bind(&data.role)
        .fetch_optional(pool)
        .await
    }

    pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM contacts WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
