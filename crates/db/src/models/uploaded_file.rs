use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

/// Record of a file pushed to object storage. `storage_key` is the
/// namespaced path (`project-documents/{project}/…` or
/// `workflows/{project}/{step}/…`); the bytes live under the asset root and
/// are served back at `/files/{storage_key}`.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct UploadedFile {
    pub id: Uuid,
    pub project_id: Uuid,
    pub step_id: Option<String>,
    pub storage_key: String,
    pub filename: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

const FILE_COLUMNS: &str =
    "id, project_id, step_id, storage_key, filename, content_type, size_bytes, active, created_at";

impl UploadedFile {
    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        pool: &SqlitePool,
        project_id: Uuid,
        step_id: Option<&str>,
        storage_key: &str,
        filename: &str,
        content_type: &str,
        size_bytes: i64,
    ) -> Result<Self, sqlx::Error> {
        let id = Uuid::new_v4();
        sqlx::query_as::<_, UploadedFile>(&format!(
            r#"INSERT INTO uploaded_files
                   (id, project_id, step_id, storage_key, filename, content_type, size_bytes)
               VALUES ($1, $2, $3, $4, $5, $6, $7)
               RETURNING {FILE_COLUMNS}"#
        ))
        .bind(id)
        .bind(project_id)
        .bind(step_id)
        .bind(storage_key)
        .bind(filename)
        .bind(content_type)
        .bind(size_bytes)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, UploadedFile>(&format!(
            r#"SELECT {FILE_COLUMNS}
               FROM uploaded_files
               WHERE id = $1"#
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_by_storage_key(
        pool: &SqlitePool,
        storage_key: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, UploadedFile>(&format!(
            r#"SELECT {FILE_COLUMNS}
               FROM uploaded_files
               WHERE storage_key = $1"#
        ))
        .bind(storage_key)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_by_project_id(
        pool: &SqlitePool,
        project_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, UploadedFile>(&format!(
            r#"SELECT {FILE_COLUMNS}
               FROM uploaded_files
               WHERE project_id = $1
               ORDER BY created_at DESC"#
        ))
        .bind(project_id)
        .fetch_all(pool)
        .await
    }

    /// Soft delete. The stored bytes are left in place.
    pub async fn set_active(
        pool: &SqlitePool,
        id: Uuid,
        active: bool,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, UploadedFile>(&format!(
            r#"UPDATE uploaded_files
               SET active = $2
               WHERE id = $1
               RETURNING {FILE_COLUMNS}"#
        ))
        .bind(id)
        .bind(active)
        .fetch_optional(pool)
        .await
    }
}
