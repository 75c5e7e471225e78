//! Per-step readiness checks, enforced server-side before a completion
//! transition is applied.

use db::models::workflow::{ReviewStatus, RevisionStatus, Step, StepKind};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReadinessError {
    #[error("step {0} has no assignee")]
    Unassigned(String),
    #[error("step {0} needs at least one active uploaded file")]
    NoActiveFile(String),
    #[error("step {0} needs document text or an active uploaded file")]
    EmptyDocument(String),
    #[error("step {0} has not passed review (currently {1})")]
    ReviewNotPassed(String, ReviewStatus),
    #[error("step {0} needs a client-approved quote")]
    NoApprovedQuote(String),
    #[error("step {0} needs an invoice with payment recorded")]
    NoPaidInvoice(String),
    #[error("step {0} has no schema text")]
    EmptySchema(String),
    #[error("step {0} needs at least one link")]
    NoLinks(String),
    #[error("step {0} has unapproved revisions")]
    RevisionsNotApproved(String),
}

/// What the invoices table says about a financials step's associations.
/// Default (all false) is what steps of every other kind receive.
#[derive(Debug, Clone, Copy, Default)]
pub struct FinancialStanding {
    pub has_approved_quote: bool,
    pub has_paid_invoice: bool,
}

fn has_active_file(step: &Step) -> bool {
    step.files.iter().any(|f| f.active)
}

/// Whether `step` may be marked complete. Every kind additionally requires
/// an assignee.
pub fn may_complete(step: &Step, standing: &FinancialStanding) -> Result<(), ReadinessError> {
    if step.assigned_user_id.is_none() {
        return Err(ReadinessError::Unassigned(step.id.clone()));
    }

    match &step.kind {
        StepKind::FileUpload => {
            if !has_active_file(step) {
                return Err(ReadinessError::NoActiveFile(step.id.clone()));
            }
        }
        StepKind::Document { text } => {
            if text.trim().is_empty() && !has_active_file(step) {
                return Err(ReadinessError::EmptyDocument(step.id.clone()));
            }
        }
        StepKind::Review { review_status } => {
            if *review_status != ReviewStatus::Passed {
                return Err(ReadinessError::ReviewNotPassed(
                    step.id.clone(),
                    *review_status,
                ));
            }
        }
        StepKind::Financials { .. } => {
            if !standing.has_approved_quote {
                return Err(ReadinessError::NoApprovedQuote(step.id.clone()));
            }
            if !standing.has_paid_invoice {
                return Err(ReadinessError::NoPaidInvoice(step.id.clone()));
            }
        }
        StepKind::Schema { schema_text } => {
            if schema_text.trim().is_empty() {
                return Err(ReadinessError::EmptySchema(step.id.clone()));
            }
        }
        StepKind::Links { links } => {
            if links.is_empty() {
                return Err(ReadinessError::NoLinks(step.id.clone()));
            }
        }
        StepKind::Revisions {
            revision_status, ..
        } => {
            if *revision_status != RevisionStatus::Approved {
                return Err(ReadinessError::RevisionsNotApproved(step.id.clone()));
            }
        }
        StepKind::Manual => {}
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::catalog;
    use super::*;
    use chrono::Utc;
    use db::models::workflow::StepFile;
    use uuid::Uuid;

    fn assigned(mut step: Step) -> Step {
        step.assigned_user_id = Some(Uuid::new_v4());
        step
    }

    fn active_file() -> StepFile {
        StepFile {
            file_id: Uuid::new_v4(),
            filename: "brief.pdf".into(),
            url: "/files/project-documents/x/brief.pdf".into(),
            active: true,
            uploaded_at: Utc::now(),
        }
    }

    #[test]
    fn every_kind_requires_an_assignee() {
        let step = catalog::mvp_production_step();
        assert_eq!(
            may_complete(&step, &FinancialStanding::default()),
            Err(ReadinessError::Unassigned(step.id.clone()))
        );
        assert!(may_complete(&assigned(step), &FinancialStanding::default()).is_ok());
    }

    #[test]
    fn file_steps_need_an_active_file() {
        let mut step = assigned(catalog::brief_step());
        assert!(matches!(
            may_complete(&step, &FinancialStanding::default()),
            Err(ReadinessError::NoActiveFile(_))
        ));

        let mut inactive = active_file();
        inactive.active = false;
        step.files.push(inactive);
        assert!(may_complete(&step, &FinancialStanding::default()).is_err());

        step.files.push(active_file());
        assert!(may_complete(&step, &FinancialStanding::default()).is_ok());
    }

    #[test]
    fn technical_scope_accepts_text_or_file() {
        let mut step = assigned(catalog::technical_scope_step());
        assert!(may_complete(&step, &FinancialStanding::default()).is_err());

        step.kind = StepKind::Document {
            text: "Phased delivery plan".into(),
        };
        assert!(may_complete(&step, &FinancialStanding::default()).is_ok());

        step.kind = StepKind::Document { text: "  ".into() };
        step.files.push(active_file());
        assert!(may_complete(&step, &FinancialStanding::default()).is_ok());
    }

    #[test]
    fn review_steps_need_a_pass() {
        let mut step = assigned(catalog::technical_review_step());
        assert!(matches!(
            may_complete(&step, &FinancialStanding::default()),
            Err(ReadinessError::ReviewNotPassed(_, ReviewStatus::Awaiting))
        ));

        step.kind = StepKind::Review {
            review_status: ReviewStatus::Passed,
        };
        assert!(may_complete(&step, &FinancialStanding::default()).is_ok());
    }

    #[test]
    fn financials_needs_approval_even_with_a_paid_invoice() {
        let step = assigned(catalog::financials_step());
        let standing = FinancialStanding {
            has_approved_quote: false,
            has_paid_invoice: true,
        };
        assert_eq!(
            may_complete(&step, &standing),
            Err(ReadinessError::NoApprovedQuote(step.id.clone()))
        );

        let standing = FinancialStanding {
            has_approved_quote: true,
            has_paid_invoice: false,
        };
        assert_eq!(
            may_complete(&step, &standing),
            Err(ReadinessError::NoPaidInvoice(step.id.clone()))
        );

        let standing = FinancialStanding {
            has_approved_quote: true,
            has_paid_invoice: true,
        };
        assert!(may_complete(&step, &standing).is_ok());
    }

    #[test]
    fn revisions_need_approval() {
        let mut step = assigned(catalog::revisions_step());
        assert!(may_complete(&step, &FinancialStanding::default()).is_err());

        step.kind = StepKind::Revisions {
            checklist: vec![],
            revision_status: RevisionStatus::Approved,
        };
        assert!(may_complete(&step, &FinancialStanding::default()).is_ok());
    }
}
