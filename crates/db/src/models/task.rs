use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool, Type};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use uuid::Uuid;

/// Task status, mutated directly by the UI with no transition guard.
#[derive(
    Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display, Default,
)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    NotStarted,
    InProgress,
    Completed,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Task {
    pub id: Uuid,
    pub project_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub assigned_user_id: Option<Uuid>,
    pub due_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateTask {
    pub title: String,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub assigned_user_id: Option<Uuid>,
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub assigned_user_id: Option<Uuid>,
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct TaskChecklistItem {
    pub id: Uuid,
    pub task_id: Uuid,
    pub label: String,
    pub done: bool,
    pub position: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateChecklistItem {
    pub label: String,
    pub position: Option<i64>,
}

const TASK_COLUMNS: &str =
    "id, project_id, title, description, status, assigned_user_id, due_date, created_at, updated_at";

impl Task {
    pub async fn create(
        pool: &SqlitePool,
        project_id: Uuid,
        data: &CreateTask,
    ) -> Result<Self, sqlx::Error> {
        let id = Uuid::new_v4();
        let status = data.status.unwrap_or_default();
        sqlx::query_as::<_, Task>(&format!(
            r#"INSERT INTO tasks (id, project_id, title, description, status, assigned_user_id, due_date)
               VALUES ($1, $2, $3, $4, $5, $6, $7)
               RETURNING {TASK_COLUMNS}"#
        ))
        .bind(id)
        .bind(project_id)
        .bind(&data.title)
        .bind(&data.description)
        .bind(status)
        .bind(data.assigned_user_id)
        .bind(data.due_date)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_project_id(
        pool: &SqlitePool,
        project_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(&format!(
            r#"SELECT {TASK_COLUMNS}
               FROM tasks
               WHERE project_id = $1
               ORDER BY created_at DESC"#
        ))
        .bind(project_id)
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(&format!(
            r#"SELECT {TASK_COLUMNS}
               FROM tasks
               WHERE id = $1"#
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn update(
        pool: &SqlitePool,
        id: Uuid,
        data: &UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(&format!(
            r#"UPDATE tasks
               SET title = COALESCE($2, title),
                   description = COALESCE($3, description),
                   status = COALESCE($4, status),
                   assigned_user_id = COALESCE($5, assigned_user_id),
                   due_date = COALESCE($6, due_date),
                   updated_at = datetime('now', 'subsec')
               WHERE id = $1
               RETURNING {TASK_COLUMNS}"#
        ))
        .bind(id)
        .bind(&data.title)
        .bind(&data.description)
        .bind(data.status)
        .bind(data.assigned_user_id)
        .bind(data.due_date)
        .fetch_optional(pool)
        .await
    }

    pub async fn update_status(
        pool: &SqlitePool,
        id: Uuid,
        status: TaskStatus,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE tasks SET status = $2, updated_at = datetime('now', 'subsec') WHERE id = $1",
        )
        .bind(id)
        .bind(status)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}

impl TaskChecklistItem {
    pub async fn create(
        pool: &SqlitePool,
        task_id: Uuid,
        data: &CreateChecklistItem,
    ) -> Result<Self, sqlx::Error> {
        let id = Uuid::new_v4();
        let position = data.position.unwrap_or(0);
        sqlx::query_as::<_, TaskChecklistItem>(
            r#"INSERT INTO task_checklist_items (id, task_id, label, position)
               VALUES ($1, $2, $3, $4)
               RETURNING id, task_id, label, done, position"#,
        )
        .bind(id)
        .bind(task_id)
        .bind(&data.label)
        .bind(position)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_task_id(
        pool: &SqlitePool,
        task_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, TaskChecklistItem>(
            r#"SELECT id, task_id, label, done, position
               FROM task_checklist_items
               WHERE task_id = $1
               ORDER BY position ASC"#,
        )
        .bind(task_id)
        .fetch_all(pool)
        .await
    }

    pub async fn set_done(
        pool: &SqlitePool,
        id: Uuid,
        done: bool,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, TaskChecklistItem>(
            r#"UPDATE task_checklist_items
               SET done = $2
               WHERE id = $1
               RETURNING id, task_id, label, done, position"#,
        )
        .bind(id)
        .bind(done)
        .fetch_optional(pool)
        .await
    }

    pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM task_checklist_items WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
