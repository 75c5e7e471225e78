//! Document migrations. Each migration moves a document from one schema
//! version to the next; documents report their version explicitly rather
//! than being sniffed for missing keys.

use db::models::workflow::{Step, StepStatus, WorkflowDocument};

use super::catalog::{self, STEP_FINANCIALS};

/// Version written by the current catalog.
pub const SCHEMA_VERSION: u32 = 1;

type Migration = fn(&mut WorkflowDocument);

/// Registered migrations, keyed by the version they upgrade *from*.
const MIGRATIONS: &[(u32, Migration)] = &[(0, insert_financial_and_delivery_steps)];

/// Bring a document up to [`SCHEMA_VERSION`]. Returns whether anything
/// changed, so callers can re-persist exactly when needed. Running this on
/// an up-to-date document is a no-op.
pub fn migrate_document(document: &mut WorkflowDocument) -> bool {
    let mut changed = false;
    for (from, migration) in MIGRATIONS {
        if document.schema_version == *from {
            migration(document);
            document.schema_version = from + 1;
            changed = true;
        }
    }
    changed
}

/// v0 → v1: documents created under the original 7-step catalog gain the
/// financials step (spliced directly before the concurrent pair) and the
/// delivery run (MVP production, revisions, project completion) at the
/// end. Existing steps keep their status, assignee, files and comments;
/// only `number`/`label` are rewritten.
fn insert_financial_and_delivery_steps(document: &mut WorkflowDocument) {
    if document.step_index(STEP_FINANCIALS).is_none() {
        let at = pair_start(&document.steps).unwrap_or(document.steps.len());
        let mut step = catalog::financials_step();
        step.status = initial_status(&document.steps[..at]);
        document.steps.insert(at, step);
    }

    for template in [
        catalog::mvp_production_step(),
        catalog::revisions_step(),
        catalog::project_completion_step(),
    ] {
        if document.step_index(&template.id).is_none() {
            let mut step = template;
            step.status = initial_status(&document.steps);
            document.steps.push(step);
        }
    }

    catalog::renumber_steps(&mut document.steps);
}

/// A step inserted ahead of unfinished work starts locked; inserted behind
/// fully completed work it starts pending, so the migration never stalls a
/// document that had already progressed past the insertion point.
fn initial_status(prior: &[Step]) -> StepStatus {
    if prior.iter().all(Step::is_completed) {
        StepStatus::Pending
    } else {
        StepStatus::Locked
    }
}

fn pair_start(steps: &[Step]) -> Option<usize> {
    steps
        .windows(2)
        .position(|w| w[0].concurrent && w[1].concurrent)
}

#[cfg(test)]
mod tests {
    use super::super::catalog::{STEP_MVP_PRODUCTION, STEP_PROJECT_COMPLETION, STEP_REVISIONS};
    use super::*;
    use chrono::Utc;
    use db::models::project::ProjectSubtype;
    use db::models::workflow::{StepFile, StepStatus};
    use uuid::Uuid;

    /// A document as the original 7-step catalog would have written it.
    fn legacy_document(subtype: ProjectSubtype) -> WorkflowDocument {
        let mut document = catalog::new_document(subtype, false);
        document.schema_version = 0;
        document.steps.retain(|s| {
            ![
                STEP_FINANCIALS,
                STEP_MVP_PRODUCTION,
                STEP_REVISIONS,
                STEP_PROJECT_COMPLETION,
            ]
            .contains(&s.id.as_str())
        });
        catalog::renumber_steps(&mut document.steps);
        document
    }

    #[test]
    fn legacy_template_document_grows_from_seven_to_eleven_steps() {
        let mut document = legacy_document(ProjectSubtype::Template);
        assert_eq!(document.steps.len(), 7);

        assert!(migrate_document(&mut document));

        assert_eq!(document.steps.len(), 11);
        assert_eq!(document.schema_version, SCHEMA_VERSION);
        for pair in document.steps.windows(2) {
            if pair[0].concurrent && pair[1].concurrent {
                assert_eq!(pair[0].number, pair[1].number);
            } else {
                assert!(pair[0].number < pair[1].number);
            }
        }
    }

    #[test]
    fn pair_labels_move_to_7a_7b() {
        let mut document = legacy_document(ProjectSubtype::Custom);
        assert_eq!(document.steps[5].label, "6a");

        migrate_document(&mut document);

        let labels: Vec<&str> = document
            .steps
            .iter()
            .filter(|s| s.concurrent)
            .map(|s| s.label.as_str())
            .collect();
        assert_eq!(labels, ["7a", "7b"]);
    }

    #[test]
    fn second_run_is_a_no_op() {
        let mut document = legacy_document(ProjectSubtype::Saas);
        assert!(migrate_document(&mut document));
        let after_first = document.clone();

        assert!(!migrate_document(&mut document));
        assert_eq!(document, after_first);
    }

    #[test]
    fn financials_pends_when_everything_before_it_was_complete() {
        let mut document = legacy_document(ProjectSubtype::Template);
        for step in document.steps.iter_mut().take(5) {
            step.status = StepStatus::Completed;
            step.completed_at = Some(Utc::now());
        }

        migrate_document(&mut document);

        assert_eq!(
            document.step(STEP_FINANCIALS).unwrap().status,
            StepStatus::Pending
        );
        assert_eq!(
            document.step(STEP_MVP_PRODUCTION).unwrap().status,
            StepStatus::Locked
        );
    }

    #[test]
    fn financials_stays_locked_behind_unfinished_work() {
        let mut document = legacy_document(ProjectSubtype::Template);
        document.steps[0].status = StepStatus::Completed;

        migrate_document(&mut document);

        assert_eq!(
            document.step(STEP_FINANCIALS).unwrap().status,
            StepStatus::Locked
        );
    }

    #[test]
    fn existing_step_state_survives_the_migration() {
        let mut document = legacy_document(ProjectSubtype::Custom);
        let file = StepFile {
            file_id: Uuid::new_v4(),
            filename: "brief.pdf".into(),
            url: "/files/project-documents/p/brief.pdf".into(),
            active: true,
            uploaded_at: Utc::now(),
        };
        document.steps[0].status = StepStatus::Completed;
        document.steps[0].files.push(file.clone());

        migrate_document(&mut document);

        let brief = document.step("brief").unwrap();
        assert_eq!(brief.status, StepStatus::Completed);
        assert_eq!(brief.files, vec![file]);
    }
}
