//! The per-project workflow checklist: step catalog, document migrations,
//! the unlock/transition engine, and per-step completion predicates, tied
//! together by [`WorkflowService`].

pub mod catalog;
pub mod migrate;
pub mod predicates;
pub mod transition;

use chrono::Utc;
use db::models::invoice::{Invoice, InvoiceDocType, PaymentStatus};
use db::models::project::Project;
use db::models::uploaded_file::UploadedFile;
use db::models::user::User;
use db::models::workflow::{
    ProjectWorkflow, ReviewStatus, RevisionChecklistItem, RevisionStatus, Step, StepComment,
    StepFile, StepKind, StepLink, WorkflowDocument, WorkflowStoreError,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::info;
use ts_rs::TS;
use uuid::Uuid;

use predicates::FinancialStanding;
use transition::TransitionError;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Store(#[from] WorkflowStoreError),
    #[error("workflow document is not valid JSON: {0}")]
    Document(#[from] serde_json::Error),
    #[error("project {0} not found")]
    ProjectNotFound(Uuid),
    #[error("step {0} not found")]
    StepNotFound(String),
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error(transparent)]
    NotReady(#[from] predicates::ReadinessError),
    #[error("user {0} not found")]
    UserNotFound(Uuid),
    #[error("step {step_id} does not carry {expected} data")]
    KindMismatch {
        step_id: String,
        expected: &'static str,
    },
}

/// A document together with the row version it was loaded at; every save
/// passes the version back so concurrent writers are detected instead of
/// overwritten.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct LoadedWorkflow {
    pub document: WorkflowDocument,
    pub version: i64,
}

/// Payload updates for the step kinds that carry editable data.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StepDataPatch {
    Document {
        text: String,
    },
    Schema {
        schema_text: String,
    },
    Links {
        links: Vec<StepLink>,
    },
    Financials {
        quote_ids: Vec<Uuid>,
        invoice_ids: Vec<Uuid>,
    },
    Revisions {
        checklist: Vec<RevisionChecklistItem>,
        revision_status: Option<RevisionStatus>,
    },
}

pub struct WorkflowService {
    pool: SqlitePool,
}

impl WorkflowService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Load the project's document: seed a fresh catalog document when none
    /// exists, otherwise parse, run pending migrations, and re-persist
    /// immediately when a migration changed anything.
    pub async fn load(&self, project_id: Uuid) -> Result<LoadedWorkflow, WorkflowError> {
        match ProjectWorkflow::find_by_project_id(&self.pool, project_id).await? {
            None => {
                let project = Project::find_by_id(&self.pool, project_id)
                    .await?
                    .ok_or(WorkflowError::ProjectNotFound(project_id))?;
                let document = catalog::new_document(project.subtype, project.needs_figma);
                let row = ProjectWorkflow::insert(&self.pool, project_id, &document).await?;
                info!(project_id = %project_id, "Seeded workflow document");
                Ok(LoadedWorkflow {
                    document,
                    version: row.version,
                })
            }
            Some(row) => {
                let mut document = row.parsed_document()?;
                if migrate::migrate_document(&mut document) {
                    let saved =
                        ProjectWorkflow::update(&self.pool, project_id, &document, row.version)
                            .await?;
                    info!(
                        project_id = %project_id,
                        schema_version = document.schema_version,
                        "Migrated workflow document"
                    );
                    Ok(LoadedWorkflow {
                        document,
                        version: saved.version,
                    })
                } else {
                    Ok(LoadedWorkflow {
                        document,
                        version: row.version,
                    })
                }
            }
        }
    }

    /// Whole-document replace, used by the editor UI. The caller must hand
    /// back the version it loaded.
    pub async fn replace(
        &self,
        project_id: Uuid,
        mut document: WorkflowDocument,
        expected_version: i64,
    ) -> Result<LoadedWorkflow, WorkflowError> {
        migrate::migrate_document(&mut document);
        let row =
            ProjectWorkflow::save(&self.pool, project_id, &document, expected_version).await?;
        Ok(LoadedWorkflow {
            document,
            version: row.version,
        })
    }

    pub async fn start_step(
        &self,
        project_id: Uuid,
        step_id: &str,
    ) -> Result<LoadedWorkflow, WorkflowError> {
        self.mutate(project_id, |document| {
            transition::start_step(document, step_id).map_err(WorkflowError::from)
        })
        .await
    }

    /// Complete a step. The step's readiness predicate is enforced here, on
    /// the server, before the transition is applied.
    pub async fn complete_step(
        &self,
        project_id: Uuid,
        step_id: &str,
    ) -> Result<LoadedWorkflow, WorkflowError> {
        let loaded = self.load(project_id).await?;
        let step = loaded
            .document
            .step(step_id)
            .ok_or_else(|| WorkflowError::StepNotFound(step_id.to_string()))?;

        let standing = self.financial_standing(step).await?;
        predicates::may_complete(step, &standing)?;

        let mut document = loaded.document;
        transition::complete_step(&mut document, step_id, Utc::now())?;

        let row =
            ProjectWorkflow::update(&self.pool, project_id, &document, loaded.version).await?;
        Ok(LoadedWorkflow {
            document,
            version: row.version,
        })
    }

    /// Regress a completed step to in-progress, locking every later step
    /// while preserving their payloads.
    pub async fn mark_step_incomplete(
        &self,
        project_id: Uuid,
        step_id: &str,
    ) -> Result<LoadedWorkflow, WorkflowError> {
        self.mutate(project_id, |document| {
            transition::mark_step_incomplete(document, step_id).map_err(WorkflowError::from)
        })
        .await
    }

    pub async fn assign_step(
        &self,
        project_id: Uuid,
        step_id: &str,
        user_id: Option<Uuid>,
    ) -> Result<LoadedWorkflow, WorkflowError> {
        let assignee = match user_id {
            Some(id) => Some(
                User::find_by_id(&self.pool, id)
                    .await?
                    .ok_or(WorkflowError::UserNotFound(id))?,
            ),
            None => None,
        };

        self.mutate(project_id, |document| {
            let step = document
                .step_mut(step_id)
                .ok_or_else(|| WorkflowError::StepNotFound(step_id.to_string()))?;
            match &assignee {
                Some(user) => {
                    step.assigned_user_id = Some(user.id);
                    step.assigned_user_name = Some(user.display_name.clone());
                }
                None => {
                    step.assigned_user_id = None;
                    step.assigned_user_name = None;
                }
            }
            Ok(())
        })
        .await
    }

    pub async fn add_comment(
        &self,
        project_id: Uuid,
        step_id: &str,
        author_user_id: Option<Uuid>,
        body: String,
    ) -> Result<LoadedWorkflow, WorkflowError> {
        let author = match author_user_id {
            Some(id) => User::find_by_id(&self.pool, id).await?,
            None => None,
        };

        self.mutate(project_id, |document| {
            let step = document
                .step_mut(step_id)
                .ok_or_else(|| WorkflowError::StepNotFound(step_id.to_string()))?;
            step.comments.push(StepComment {
                id: Uuid::new_v4(),
                author_user_id,
                author_name: author.as_ref().map(|u| u.display_name.clone()),
                body: body.clone(),
                created_at: Utc::now(),
            });
            Ok(())
        })
        .await
    }

    /// Record an uploaded file against a step.
    pub async fn attach_file(
        &self,
        project_id: Uuid,
        step_id: &str,
        file: &UploadedFile,
        public_url: String,
    ) -> Result<LoadedWorkflow, WorkflowError> {
        let entry = StepFile {
            file_id: file.id,
            filename: file.filename.clone(),
            url: public_url,
            active: true,
            uploaded_at: file.created_at,
        };
        self.mutate(project_id, |document| {
            let step = document
                .step_mut(step_id)
                .ok_or_else(|| WorkflowError::StepNotFound(step_id.to_string()))?;
            step.files.push(entry.clone());
            Ok(())
        })
        .await
    }

    pub async fn set_review_status(
        &self,
        project_id: Uuid,
        step_id: &str,
        review_status: ReviewStatus,
    ) -> Result<LoadedWorkflow, WorkflowError> {
        self.mutate(project_id, |document| {
            let step = document
                .step_mut(step_id)
                .ok_or_else(|| WorkflowError::StepNotFound(step_id.to_string()))?;
            match &mut step.kind {
                StepKind::Review { review_status: rs } => {
                    *rs = review_status;
                    Ok(())
                }
                _ => Err(WorkflowError::KindMismatch {
                    step_id: step_id.to_string(),
                    expected: "review",
                }),
            }
        })
        .await
    }

    /// Update the kind-specific payload of a step. The patch variant must
    /// match the step's kind.
    pub async fn update_step_data(
        &self,
        project_id: Uuid,
        step_id: &str,
        patch: StepDataPatch,
    ) -> Result<LoadedWorkflow, WorkflowError> {
        self.mutate(project_id, |document| {
            let step = document
                .step_mut(step_id)
                .ok_or_else(|| WorkflowError::StepNotFound(step_id.to_string()))?;
            apply_patch(step, &patch)
        })
        .await
    }

    /// Load, apply a closure to the document, and CAS-save the result.
    async fn mutate<F>(&self, project_id: Uuid, apply: F) -> Result<LoadedWorkflow, WorkflowError>
    where
        F: FnOnce(&mut WorkflowDocument) -> Result<(), WorkflowError>,
    {
        let loaded = self.load(project_id).await?;
        let mut document = loaded.document;
        apply(&mut document)?;
        let row =
            ProjectWorkflow::update(&self.pool, project_id, &document, loaded.version).await?;
        Ok(LoadedWorkflow {
            document,
            version: row.version,
        })
    }

    /// Resolve the financials step's quote/invoice associations against the
    /// invoices table. Steps of any other kind get a default standing the
    /// predicate ignores.
    async fn financial_standing(&self, step: &Step) -> Result<FinancialStanding, WorkflowError> {
        let StepKind::Financials {
            quote_ids,
            invoice_ids,
        } = &step.kind
        else {
            return Ok(FinancialStanding::default());
        };

        let mut standing = FinancialStanding::default();
        for id in quote_ids {
            if let Some(invoice) = Invoice::find_by_id(&self.pool, *id).await? {
                if invoice.doc_type == InvoiceDocType::Quote && invoice.approved_by_client {
                    standing.has_approved_quote = true;
                }
            }
        }
        for id in invoice_ids {
            if let Some(invoice) = Invoice::find_by_id(&self.pool, *id).await? {
                if invoice.doc_type == InvoiceDocType::Invoice
                    && matches!(
                        invoice.payment_status,
                        PaymentStatus::Paid | PaymentStatus::PartiallyPaid
                    )
                {
                    standing.has_paid_invoice = true;
                }
            }
        }
        Ok(standing)
    }
}

fn apply_patch(step: &mut Step, patch: &StepDataPatch) -> Result<(), WorkflowError> {
    let step_id = step.id.clone();
    let mismatch = move |expected: &'static str| WorkflowError::KindMismatch {
        step_id,
        expected,
    };

    match (&mut step.kind, patch) {
        (StepKind::Document { text }, StepDataPatch::Document { text: new }) => {
            *text = new.clone();
            Ok(())
        }
        (StepKind::Schema { schema_text }, StepDataPatch::Schema { schema_text: new }) => {
            *schema_text = new.clone();
            Ok(())
        }
        (StepKind::Links { links }, StepDataPatch::Links { links: new }) => {
            *links = new.clone();
            Ok(())
        }
        (
            StepKind::Financials {
                quote_ids,
                invoice_ids,
            },
            StepDataPatch::Financials {
                quote_ids: new_quotes,
                invoice_ids: new_invoices,
            },
        ) => {
            *quote_ids = new_quotes.clone();
            *invoice_ids = new_invoices.clone();
            Ok(())
        }
        (
            StepKind::Revisions {
                checklist,
                revision_status,
            },
            StepDataPatch::Revisions {
                checklist: new_checklist,
                revision_status: new_status,
            },
        ) => {
            *checklist = new_checklist.clone();
            if let Some(status) = new_status {
                *revision_status = *status;
            }
            Ok(())
        }
        (_, StepDataPatch::Document { .. }) => Err(mismatch("document")),
        (_, StepDataPatch::Schema { .. }) => Err(mismatch("schema")),
        (_, StepDataPatch::Links { .. }) => Err(mismatch("links")),
        (_, StepDataPatch::Financials { .. }) => Err(mismatch("financials")),
        (_, StepDataPatch::Revisions { .. }) => Err(mismatch("revisions")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use db::models::project::{CreateProject, ProjectSubtype};
    use db::models::workflow::StepStatus;

    async fn setup() -> (db::DBService, Uuid) {
        let db = db::DBService::new_in_memory().await.unwrap();
        let project = Project::create(
            &db.pool,
            &CreateProject {
                name: "Relaunch".into(),
                company_id: None,
                contact_id: None,
                status: None,
                pipeline: None,
                subtype: Some(ProjectSubtype::Template),
                needs_figma: Some(false),
                value_cents: None,
                start_date: None,
                due_date: None,
            },
        )
        .await
        .unwrap();
        (db, project.id)
    }

    async fn user(db: &db::DBService) -> User {
        User::create(
            &db.pool,
            &db::models::user::CreateUser {
                display_name: "Dana".into(),
                email: "dana@example.com".into(),
                role: None,
            },
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn load_seeds_a_fresh_document_once() {
        let (db, project_id) = setup().await;
        let service = WorkflowService::new(db.pool.clone());

        let first = service.load(project_id).await.unwrap();
        assert_eq!(first.version, 1);
        assert_eq!(first.document.steps.len(), 11);
        assert_eq!(first.document.steps[0].status, StepStatus::Pending);

        let second = service.load(project_id).await.unwrap();
        assert_eq!(second.version, 1);
        assert_eq!(second.document, first.document);
    }

    #[tokio::test]
    async fn loading_a_legacy_document_migrates_and_persists_it() {
        let (db, project_id) = setup().await;

        let mut legacy = catalog::new_document(ProjectSubtype::Template, false);
        legacy.schema_version = 0;
        legacy
            .steps
            .retain(|s| !["financials", "mvp_production", "revisions", "project_completion"]
                .contains(&s.id.as_str()));
        catalog::renumber_steps(&mut legacy.steps);
        ProjectWorkflow::insert(&db.pool, project_id, &legacy).await.unwrap();

        let service = WorkflowService::new(db.pool.clone());
        let loaded = service.load(project_id).await.unwrap();
        assert_eq!(loaded.document.steps.len(), 11);
        assert_eq!(loaded.version, 2);

        // the migrated form is what is now stored
        let row = ProjectWorkflow::find_by_project_id(&db.pool, project_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.parsed_document().unwrap(), loaded.document);
    }

    #[tokio::test]
    async fn completing_an_unready_step_is_refused() {
        let (db, project_id) = setup().await;
        let service = WorkflowService::new(db.pool.clone());
        service.load(project_id).await.unwrap();

        // brief is pending but unassigned with no file
        let err = service.complete_step(project_id, "brief").await.unwrap_err();
        assert!(matches!(err, WorkflowError::NotReady(_)));
    }

    #[tokio::test]
    async fn completing_the_financials_step_checks_the_invoices_table() {
        use db::models::invoice::{CreateInvoice, CreateInvoiceItem, InvoiceDocType, PaymentStatus};

        let (db, project_id) = setup().await;
        let service = WorkflowService::new(db.pool.clone());
        let assignee = user(&db).await;

        // bring the document to the financials step without replaying the UI
        let mut loaded = service.load(project_id).await.unwrap();
        for step in loaded.document.steps.iter_mut().take(5) {
            step.status = StepStatus::Completed;
            step.completed_at = Some(Utc::now());
        }
        loaded.document.step_mut("financials").unwrap().status = StepStatus::InProgress;
        let loaded = service
            .replace(project_id, loaded.document, loaded.version)
            .await
            .unwrap();

        service
            .assign_step(project_id, "financials", Some(assignee.id))
            .await
            .unwrap();

        let quote = Invoice::create_with_items(
            &db.pool,
            project_id,
            &CreateInvoice {
                doc_type: InvoiceDocType::Quote,
                number: "Q-1".into(),
                issue_date: None,
                due_date: None,
                discount_cents: None,
                tax_rate_bp: None,
                notes: None,
                items: vec![CreateInvoiceItem {
                    description: "build".into(),
                    quantity_milli: None,
                    unit_price_cents: 100_000,
                    position: None,
                }],
            },
        )
        .await
        .unwrap();
        let invoice = Invoice::create_with_items(
            &db.pool,
            project_id,
            &CreateInvoice {
                doc_type: InvoiceDocType::Invoice,
                number: "INV-1".into(),
                issue_date: None,
                due_date: None,
                discount_cents: None,
                tax_rate_bp: None,
                notes: None,
                items: vec![CreateInvoiceItem {
                    description: "deposit".into(),
                    quantity_milli: None,
                    unit_price_cents: 50_000,
                    position: None,
                }],
            },
        )
        .await
        .unwrap();

        service
            .update_step_data(
                project_id,
                "financials",
                StepDataPatch::Financials {
                    quote_ids: vec![quote.id],
                    invoice_ids: vec![invoice.id],
                },
            )
            .await
            .unwrap();

        // quote unapproved, invoice unpaid: refused
        let err = service.complete_step(project_id, "financials").await.unwrap_err();
        assert!(matches!(err, WorkflowError::NotReady(_)));

        Invoice::set_client_approval(&db.pool, quote.id, true).await.unwrap();
        Invoice::set_payment_status(&db.pool, invoice.id, PaymentStatus::PartiallyPaid)
            .await
            .unwrap();

        let after = service.complete_step(project_id, "financials").await.unwrap();
        assert_eq!(after.document.step("financials").unwrap().status, StepStatus::Completed);
        // fan-out to both pair members
        assert_eq!(after.document.step("ui_ux_design").unwrap().status, StepStatus::Pending);
        assert_eq!(after.document.step("scaffolding").unwrap().status, StepStatus::Pending);

        let version_before = loaded.version;
        assert!(after.version > version_before);
    }

    #[tokio::test]
    async fn replace_with_a_stale_version_conflicts() {
        let (db, project_id) = setup().await;
        let service = WorkflowService::new(db.pool.clone());
        let loaded = service.load(project_id).await.unwrap();

        service
            .replace(project_id, loaded.document.clone(), loaded.version)
            .await
            .unwrap();

        let err = service
            .replace(project_id, loaded.document, loaded.version)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            WorkflowError::Store(WorkflowStoreError::VersionConflict { .. })
        ));
    }

    #[tokio::test]
    async fn comments_and_assignments_round_trip() {
        let (db, project_id) = setup().await;
        let service = WorkflowService::new(db.pool.clone());
        let assignee = user(&db).await;
        service.load(project_id).await.unwrap();

        let loaded = service
            .assign_step(project_id, "brief", Some(assignee.id))
            .await
            .unwrap();
        let step = loaded.document.step("brief").unwrap();
        assert_eq!(step.assigned_user_id, Some(assignee.id));
        assert_eq!(step.assigned_user_name.as_deref(), Some("Dana"));

        let loaded = service
            .add_comment(project_id, "brief", Some(assignee.id), "client called".into())
            .await
            .unwrap();
        let step = loaded.document.step("brief").unwrap();
        assert_eq!(step.comments.len(), 1);
        assert_eq!(step.comments[0].body, "client called");
    }
}
