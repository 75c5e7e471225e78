use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use strum_macros::{Display, EnumString};
use thiserror::Error;
use ts_rs::TS;
use uuid::Uuid;

use super::project::ProjectSubtype;

/// Step status. Monotonic forward except the explicit "mark incomplete"
/// regression handled by the transition engine.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display, Default,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StepStatus {
    #[default]
    Locked,
    Pending,
    InProgress,
    Completed,
}

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display, Default,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ReviewStatus {
    #[default]
    Awaiting,
    Passed,
    Failed,
}

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display, Default,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RevisionStatus {
    #[default]
    InRevision,
    Approved,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct StepFile {
    pub file_id: Uuid,
    pub filename: String,
    pub url: String,
    pub active: bool,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct StepComment {
    pub id: Uuid,
    pub author_user_id: Option<Uuid>,
    pub author_name: Option<String>,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct StepLink {
    pub label: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct RevisionChecklistItem {
    pub id: Uuid,
    pub label: String,
    pub done: bool,
}

/// Per-kind payload. Adding a step kind extends this enum and every
/// exhaustive match over it, rather than a string-id comparison scattered
/// through the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StepKind {
    /// Completed by uploading at least one active file (brief, brand
    /// guidelines, completion form).
    FileUpload,
    /// Entered or AI-generated document text (technical scope).
    Document { text: String },
    /// Gated on an explicit pass (technical review, UI/UX, scaffolding).
    Review { review_status: ReviewStatus },
    /// Associations to quotes and invoices, checked against the invoices
    /// table at completion time.
    Financials {
        quote_ids: Vec<Uuid>,
        invoice_ids: Vec<Uuid>,
    },
    /// Data-schema text for custom builds.
    Schema { schema_text: String },
    /// Reference links (template selection, integration plan).
    Links { links: Vec<StepLink> },
    /// Revision rounds with a client-approval gate.
    Revisions {
        checklist: Vec<RevisionChecklistItem>,
        revision_status: RevisionStatus,
    },
    /// No artifact required beyond an assignee (MVP production).
    Manual,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct Step {
    pub id: String,
    /// Ordering number. A concurrent pair shares one number and is told
    /// apart by `label` ("7a"/"7b").
    pub number: i64,
    pub label: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub status: StepStatus,
    #[serde(default)]
    pub assigned_user_id: Option<Uuid>,
    #[serde(default)]
    pub assigned_user_name: Option<String>,
    #[serde(default)]
    pub task_id: Option<Uuid>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub concurrent: bool,
    #[serde(default)]
    pub files: Vec<StepFile>,
    #[serde(default)]
    pub comments: Vec<StepComment>,
    pub kind: StepKind,
}

impl Step {
    pub fn is_completed(&self) -> bool {
        self.status == StepStatus::Completed
    }
}

/// The whole-document workflow state for one project. Documents created
/// before the `schema_version` field default to 0 and are brought forward
/// by the registered migrations on load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct WorkflowDocument {
    #[serde(default)]
    pub schema_version: u32,
    pub project_subtype: ProjectSubtype,
    pub subtype_name: String,
    #[serde(default)]
    pub needs_figma: bool,
    pub steps: Vec<Step>,
}

impl WorkflowDocument {
    pub fn step(&self, step_id: &str) -> Option<&Step> {
        self.steps.iter().find(|s| s.id == step_id)
    }

    pub fn step_mut(&mut self, step_id: &str) -> Option<&mut Step> {
        self.steps.iter_mut().find(|s| s.id == step_id)
    }

    pub fn step_index(&self, step_id: &str) -> Option<usize> {
        self.steps.iter().position(|s| s.id == step_id)
    }
}

#[derive(Debug, Error)]
pub enum WorkflowStoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("workflow document changed concurrently (expected version {expected})")]
    VersionConflict { expected: i64 },
    #[error("workflow document is not valid JSON: {0}")]
    Document(#[from] serde_json::Error),
}

/// One row per project; the document is stored wholesale as JSON and every
/// save is guarded by a compare-and-swap on `version`.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct ProjectWorkflow {
    pub id: Uuid,
    pub project_id: Uuid,
    /// JSON-serialized [`WorkflowDocument`].
    pub document: String,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const WORKFLOW_COLUMNS: &str = "id, project_id, document, version, created_at, updated_at";

impl ProjectWorkflow {
    pub fn parsed_document(&self) -> Result<WorkflowDocument, serde_json::Error> {
        serde_json::from_str(&self.document)
    }

    pub async fn find_by_project_id(
        pool: &SqlitePool,
        project_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, ProjectWorkflow>(&format!(
            r#"SELECT {WORKFLOW_COLUMNS}
               FROM project_workflows
               WHERE project_id = $1"#
        ))
        .bind(project_id)
        .fetch_optional(pool)
        .await
    }

    /// Create the project's single workflow row. Version starts at 1; a row
    /// already being present means another writer got there first.
    pub async fn insert(
        pool: &SqlitePool,
        project_id: Uuid,
        document: &WorkflowDocument,
    ) -> Result<Self, WorkflowStoreError> {
        let json = serde_json::to_string(document)?;
        let result = sqlx::query_as::<_, ProjectWorkflow>(&format!(
            r#"INSERT INTO project_workflows (id, project_id, document, version)
               VALUES ($1, $2, $3, 1)
               RETURNING {WORKFLOW_COLUMNS}"#
        ))
        .bind(Uuid::new_v4())
        .bind(project_id)
        .bind(json)
        .fetch_one(pool)
        .await;

        match result {
            Ok(row) => Ok(row),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(WorkflowStoreError::VersionConflict { expected: 0 })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Whole-document save, conditional on the version the caller loaded.
    /// A stale `expected_version` means a concurrent writer won; the caller
    /// re-reads instead of silently losing that writer's work.
    pub async fn update(
        pool: &SqlitePool,
        project_id: Uuid,
        document: &WorkflowDocument,
        expected_version: i64,
    ) -> Result<Self, WorkflowStoreError> {
        let json = serde_json::to_string(document)?;
        let row = sqlx::query_as::<_, ProjectWorkflow>(&format!(
            r#"UPDATE project_workflows
               SET document = $3,
                   version = version + 1,
                   updated_at = datetime('now', 'subsec')
               WHERE project_id = $1 AND version = $2
               RETURNING {WORKFLOW_COLUMNS}"#
        ))
        .bind(project_id)
        .bind(expected_version)
        .bind(json)
        .fetch_optional(pool)
        .await?;

        row.ok_or(WorkflowStoreError::VersionConflict {
            expected: expected_version,
        })
    }

    /// Insert when `expected_version` is 0, CAS-update otherwise.
    pub async fn save(
        pool: &SqlitePool,
        project_id: Uuid,
        document: &WorkflowDocument,
        expected_version: i64,
    ) -> Result<Self, WorkflowStoreError> {
        if expected_version == 0 {
            Self::insert(pool, project_id, document).await
        } else {
            Self::update(pool, project_id, document, expected_version).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::project::{CreateProject, Project};
    use crate::DBService;

    fn doc() -> WorkflowDocument {
        WorkflowDocument {
            schema_version: 1,
            project_subtype: ProjectSubtype::Custom,
            subtype_name: "Custom Build".into(),
            needs_figma: false,
            steps: vec![],
        }
    }

    async fn project(db: &DBService) -> Project {
        Project::create(
            &db.pool,
            &CreateProject {
                name: "p".into(),
                company_id: None,
                contact_id: None,
                status: None,
                pipeline: None,
                subtype: None,
                needs_figma: None,
                value_cents: None,
                start_date: None,
                due_date: None,
            },
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn save_bumps_version() {
        let db = DBService::new_in_memory().await.unwrap();
        let project = project(&db).await;

        let row = ProjectWorkflow::save(&db.pool, project.id, &doc(), 0).await.unwrap();
        assert_eq!(row.version, 1);

        let row = ProjectWorkflow::save(&db.pool, project.id, &doc(), 1).await.unwrap();
        assert_eq!(row.version, 2);
    }

    #[tokio::test]
    async fn stale_version_is_a_conflict() {
        let db = DBService::new_in_memory().await.unwrap();
        let project = project(&db).await;

        ProjectWorkflow::save(&db.pool, project.id, &doc(), 0).await.unwrap();
        ProjectWorkflow::save(&db.pool, project.id, &doc(), 1).await.unwrap();

        let err = ProjectWorkflow::save(&db.pool, project.id, &doc(), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowStoreError::VersionConflict { expected: 1 }));
    }

    #[test]
    fn legacy_documents_default_to_schema_version_zero() {
        let json = r#"{"project_subtype":"template","subtype_name":"Template Build","steps":[]}"#;
        let doc: WorkflowDocument = serde_json::from_str(json).unwrap();
        assert_eq!(doc.schema_version, 0);
        assert!(!doc.needs_figma);
    }
}
