use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct User {
    pub id: Uuid,
    pub display_name: String,
    pub email: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateUser {
    pub display_name: String,
    pub email: String,
    pub role: Option<String>,
}

impl User {
    pub async fn create(pool: &SqlitePool, data: &CreateUser) -> Result<Self, sqlx::Error> {
        let id = Uuid::new_v4();
        let role = data.role.clone().unwrap_or_else(|| "member".to_string());
        sqlx::query_as::<_, User>(
            r#"INSERT INTO users (id, display_name, email, role)
               VALUES ($1, $2, $3, $4)
               RETURNING id, display_name, email, role, created_at"#,
        )
        .bind(id)
        .bind(&data.display_name)
        .bind(&data.email)
        .bind(role)
        .fetch_one(pool)
        .await
    }

    pub async fn find_all(pool: &SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"SELECT id, display_name, email, role, created_at
               FROM users
               ORDER BY display_name ASC"#,
        )
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"SELECT id, display_name, email, role, created_at
               FROM users
               WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }
}
