use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct ProjectNote {
    pub id: Uuid,
    pub project_id: Uuid,
    pub author_user_id: Option<Uuid>,
    pub body: String,
    pub pinned: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateNote {
    pub author_user_id: Option<Uuid>,
    pub body: String,
}

const NOTE_COLUMNS: &str =
    "id, project_id, author_user_id, body, pinned, created_at, updated_at";

impl ProjectNote {
    pub async fn create(
        pool: &SqlitePool,
        project_id: Uuid,
        data: &CreateNote,
    ) -> Result<Self, sqlx::Error> {
        let id = Uuid::new_v4();
        sqlx::query_as::<_, ProjectNote>(&format!(
            r#"INSERT INTO project_notes (id, project_id, author_user_id, body)
               VALUES ($1, $2, $3, $4)
               RETURNING {NOTE_COLUMNS}"#
        ))
        .bind(id)
        .bind(project_id)
        .bind(data.author_user_id)
        .bind(&data.body)
        .fetch_one(pool)
        .await
    }

    /// Pinned notes first, then newest first.
    pub async fn find_by_project_id(
        pool: &SqlitePool,
        project_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, ProjectNote>(&format!(
            r#"SELECT {NOTE_COLUMNS}
               FROM project_notes
               WHERE project_id = $1
               ORDER BY pinned DESC, created_at DESC"#
        ))
        .bind(project_id)
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, ProjectNote>(&format!(
            r#"SELECT {NOTE_COLUMNS}
               FROM project_notes
               WHERE id = $1"#
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn update_body(
        pool: &SqlitePool,
        id: Uuid,
        body: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, ProjectNote>(&format!(
            r#"UPDATE project_notes
               SET body = $2, updated_at = datetime('now', 'subsec')
               WHERE id = $1
               RETURNING {NOTE_COLUMNS}"#
        ))
        .bind(id)
        .bind(body)
        .fetch_optional(pool)
        .await
    }

    pub async fn set_pinned(
        pool: &SqlitePool,
        id: Uuid,
        pinned: bool,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, ProjectNote>(&format!(
            r#"UPDATE project_notes
               SET pinned = $2, updated_at = datetime('now', 'subsec')
               WHERE id = $1
               RETURNING {NOTE_COLUMNS}"#
        ))
        .bind(id)
        .bind(pinned)
        .fetch_optional(pool)
        .await
    }

    pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM project_notes WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
