use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool, Type};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use uuid::Uuid;

/// Which step catalog applies to a project's workflow.
#[derive(
    Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display, Default,
)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ProjectSubtype {
    #[default]
    Custom,
    Template,
    Saas,
}

impl ProjectSubtype {
    pub fn display_name(&self) -> &'static str {
        match self {
            ProjectSubtype::Custom => "Custom Build",
            ProjectSubtype::Template => "Template Build",
            ProjectSubtype::Saas => "SaaS Build",
        }
    }
}

/// Projects are archived, never hard-deleted. Status and pipeline stay
/// free-form strings, edited directly from the UI.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub company_id: Option<Uuid>,
    pub contact_id: Option<Uuid>,
    pub status: String,
    pub pipeline: String,
    pub subtype: ProjectSubtype,
    pub needs_figma: bool,
    pub value_cents: Option<i64>,
    pub start_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateProject {
    pub name: String,
    pub company_id: Option<Uuid>,
    pub contact_id: Option<Uuid>,
    pub status: Option<String>,
    pub pipeline: Option<String>,
    pub subtype: Option<ProjectSubtype>,
    pub needs_figma: Option<bool>,
    pub value_cents: Option<i64>,
    pub start_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct UpdateProject {
    pub name: Option<String>,
    pub company_id: Option<Uuid>,
    pub contact_id: Option<Uuid>,
    pub status: Option<String>,
    pub pipeline: Option<String>,
    pub value_cents: Option<i64>,
    pub start_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
}

const PROJECT_COLUMNS: &str = r#"id, name, company_id, contact_id, status, pipeline, subtype,
    needs_figma, value_cents, start_date, due_date, archived, created_at, updated_at"#;

impl Project {
    pub async fn create(pool: &SqlitePool, data: &CreateProject) -> Result<Self, sqlx::Error> {
        let id = Uuid::new_v4();
        let status = data.status.clone().unwrap_or_else(|| "open".to_string());
        let pipeline = data.pipeline.clone().unwrap_or_else(|| "lead".to_string());
        let subtype = data.subtype.unwrap_or_default();
        let needs_figma = data.needs_figma.unwrap_or(false);
        sqlx::query_as::<_, Project>(&format!(
            r#"INSERT INTO projects
                   (id, name, company_id, contact_id, status, pipeline, subtype, needs_figma,
                    value_cents, start_date, due_date)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
               RETURNING {PROJECT_COLUMNS}"#
        ))
        .bind(id)
        .bind(&data.name)
        .bind(data.company_id)
        .bind(data.contact_id)
        .bind(status)
        .bind(pipeline)
        .bind(subtype)
        .bind(needs_figma)
        .bind(data.value_cents)
        .bind(data.start_date)
        .bind(data.due_date)
        .fetch_one(pool)
        .await
    }

    pub async fn find_all(
        pool: &SqlitePool,
        include_archived: bool,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Project>(&format!(
            r#"SELECT {PROJECT_COLUMNS}
               FROM projects
               WHERE archived = 0 OR $1
               ORDER BY created_at DESC"#
        ))
        .bind(include_archived)
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Project>(&format!(
            r#"SELECT {PROJECT_COLUMNS}
               FROM projects
               WHERE id = $1"#
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn update(
        pool: &SqlitePool,
        id: Uuid,
        data: &UpdateProject,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Project>(&format!(
            r#"UPDATE projects
               SET name = COALESCE($2, name),
                   company_id = COALESCE($3, company_id),
                   contact_id = COALESCE($4, contact_id),
                   status = COALESCE($5, status),
                   pipeline = COALESCE($6, pipeline),
                   value_cents = COALESCE($7, value_cents),
                   start_date = COALESCE($8, start_date),
                   due_date = COALESCE($9, due_date),
                   updated_at = datetime('now', 'subsec')
               WHERE id = $1
               RETURNING {PROJECT_COLUMNS}"#
        ))
        .bind(id)
        .bind(&data.name)
        .bind(data.company_id)
        .bind(data.contact_id)
        .bind(&data.status)
        .bind(&data.pipeline)
        .bind(data.value_cents)
        .bind(data.start_date)
        .bind(data.due_date)
        .fetch_optional(pool)
        .await
    }

    pub async fn set_archived(
        pool: &SqlitePool,
        id: Uuid,
        archived: bool,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Project>(&format!(
            r#"UPDATE projects
               SET archived = $2, updated_at = datetime('now', 'subsec')
               WHERE id = $1
               RETURNING {PROJECT_COLUMNS}"#
        ))
        .bind(id)
        .bind(archived)
        .fetch_optional(pool)
        .await
    }
}
