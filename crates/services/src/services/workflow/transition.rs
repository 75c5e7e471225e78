//! The unlock/transition engine. Pure functions over a [`WorkflowDocument`];
//! persistence and readiness checks live in the service layer.

use chrono::{DateTime, Utc};
use db::models::workflow::{Step, StepKind, StepStatus, WorkflowDocument};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("step {0} not found")]
    StepNotFound(String),
    #[error("step {step_id} cannot move from {from} via {action}")]
    InvalidTransition {
        step_id: String,
        from: StepStatus,
        action: &'static str,
    },
}

/// `Pending → InProgress`.
pub fn start_step(document: &mut WorkflowDocument, step_id: &str) -> Result<(), TransitionError> {
    let step = step_mut(document, step_id)?;
    if step.status != StepStatus::Pending {
        return Err(TransitionError::InvalidTransition {
            step_id: step.id.clone(),
            from: step.status,
            action: "start",
        });
    }
    step.status = StepStatus::InProgress;
    Ok(())
}

/// Complete a step and unlock whatever it gates:
/// - a financials step pends both members of the following concurrent pair;
/// - a concurrent member pends the pair's successor once its sibling is
///   also complete;
/// - any other step pends its immediate successor, unless that successor is
///   part of a concurrent pair (the pair only unlocks through financials).
///
/// Unlocking only ever lifts `Locked` to `Pending`; steps already moving
/// are left alone.
pub fn complete_step(
    document: &mut WorkflowDocument,
    step_id: &str,
    now: DateTime<Utc>,
) -> Result<(), TransitionError> {
    let index = document
        .step_index(step_id)
        .ok_or_else(|| TransitionError::StepNotFound(step_id.to_string()))?;

    {
        let step = &mut document.steps[index];
        if !matches!(step.status, StepStatus::Pending | StepStatus::InProgress) {
            return Err(TransitionError::InvalidTransition {
                step_id: step.id.clone(),
                from: step.status,
                action: "complete",
            });
        }
        step.status = StepStatus::Completed;
        step.completed_at = Some(now);
    }

    let completed = document.steps[index].clone();

    if matches!(completed.kind, StepKind::Financials { .. }) {
        unlock_following_pair(document, index);
    } else if completed.concurrent {
        unlock_after_pair_if_done(document, &completed);
    } else if let Some(next) = document.steps.get_mut(index + 1) {
        if !next.concurrent {
            pend_if_locked(next);
        }
    }

    Ok(())
}

/// `Completed → InProgress`, cascading `Locked` onto every strictly later
/// step. Payloads (`kind` data, files, comments) and assignments are
/// preserved; a concurrent sibling shares the number and is left untouched.
pub fn mark_step_incomplete(
    document: &mut WorkflowDocument,
    step_id: &str,
) -> Result<(), TransitionError> {
    let number = {
        let step = step_mut(document, step_id)?;
        if step.status != StepStatus::Completed {
            return Err(TransitionError::InvalidTransition {
                step_id: step.id.clone(),
                from: step.status,
                action: "mark_incomplete",
            });
        }
        step.status = StepStatus::InProgress;
        step.completed_at = None;
        step.number
    };

    for step in document.steps.iter_mut().filter(|s| s.number > number) {
        step.status = StepStatus::Locked;
        step.completed_at = None;
    }

    Ok(())
}

fn step_mut<'a>(
    document: &'a mut WorkflowDocument,
    step_id: &str,
) -> Result<&'a mut Step, TransitionError> {
    document
        .step_mut(step_id)
        .ok_or_else(|| TransitionError::StepNotFound(step_id.to_string()))
}

fn pend_if_locked(step: &mut Step) {
    if step.status == StepStatus::Locked {
        step.status = StepStatus::Pending;
    }
}

/// Fan-out: pend both members of the first concurrent pair after `index`.
fn unlock_following_pair(document: &mut WorkflowDocument, index: usize) {
    let len = document.steps.len();
    for i in index + 1..len.saturating_sub(1) {
        if document.steps[i].concurrent && document.steps[i + 1].concurrent {
            pend_if_locked(&mut document.steps[i]);
            pend_if_locked(&mut document.steps[i + 1]);
            return;
        }
    }
}

/// Fan-in: when both members of `member`'s pair are complete, pend the
/// first step past the pair.
fn unlock_after_pair_if_done(document: &mut WorkflowDocument, member: &Step) {
    let pair_done = document
        .steps
        .iter()
        .filter(|s| s.concurrent && s.number == member.number)
        .all(|s| s.status == StepStatus::Completed);
    if !pair_done {
        return;
    }
    if let Some(next) = document
        .steps
        .iter_mut()
        .find(|s| s.number > member.number)
    {
        pend_if_locked(next);
    }
}

#[cfg(test)]
mod tests {
    use super::super::catalog::{self, STEP_FINANCIALS, STEP_SCAFFOLDING, STEP_UI_UX_DESIGN};
    use super::*;
    use db::models::project::ProjectSubtype;

    fn completed_through(doc: &mut WorkflowDocument, count: usize) {
        for step in doc.steps.iter_mut().take(count) {
            step.status = StepStatus::Completed;
            step.completed_at = Some(Utc::now());
        }
    }

    fn doc() -> WorkflowDocument {
        catalog::new_document(ProjectSubtype::Custom, false)
    }

    #[test]
    fn completing_a_step_pends_only_its_successor() {
        let mut doc = doc();
        doc.steps[0].status = StepStatus::InProgress;

        complete_step(&mut doc, "brief", Utc::now()).unwrap();

        assert_eq!(doc.steps[0].status, StepStatus::Completed);
        assert_eq!(doc.steps[1].status, StepStatus::Pending);
        assert!(doc.steps[2..].iter().all(|s| s.status == StepStatus::Locked));
    }

    #[test]
    fn unlock_does_not_regress_a_moving_successor() {
        let mut doc = doc();
        doc.steps[0].status = StepStatus::InProgress;
        doc.steps[1].status = StepStatus::InProgress;

        complete_step(&mut doc, "brief", Utc::now()).unwrap();

        assert_eq!(doc.steps[1].status, StepStatus::InProgress);
    }

    #[test]
    fn completing_a_locked_step_is_rejected() {
        let mut doc = doc();
        let err = complete_step(&mut doc, STEP_SCAFFOLDING, Utc::now()).unwrap_err();
        assert!(matches!(err, TransitionError::InvalidTransition { .. }));
    }

    #[test]
    fn financials_fans_out_to_both_pair_members() {
        let mut doc = doc();
        completed_through(&mut doc, 5);
        doc.step_mut(STEP_FINANCIALS).unwrap().status = StepStatus::InProgress;

        complete_step(&mut doc, STEP_FINANCIALS, Utc::now()).unwrap();

        assert_eq!(doc.step(STEP_UI_UX_DESIGN).unwrap().status, StepStatus::Pending);
        assert_eq!(doc.step(STEP_SCAFFOLDING).unwrap().status, StepStatus::Pending);
        // fan-out does not leak past the pair
        assert_eq!(doc.step("mvp_production").unwrap().status, StepStatus::Locked);
    }

    #[test]
    fn financials_leaves_a_non_locked_member_alone() {
        let mut doc = doc();
        completed_through(&mut doc, 5);
        doc.step_mut(STEP_FINANCIALS).unwrap().status = StepStatus::InProgress;
        doc.step_mut(STEP_UI_UX_DESIGN).unwrap().status = StepStatus::InProgress;

        complete_step(&mut doc, STEP_FINANCIALS, Utc::now()).unwrap();

        assert_eq!(
            doc.step(STEP_UI_UX_DESIGN).unwrap().status,
            StepStatus::InProgress
        );
        assert_eq!(doc.step(STEP_SCAFFOLDING).unwrap().status, StepStatus::Pending);
    }

    #[test]
    fn pair_successor_waits_for_both_members() {
        let mut doc = doc();
        completed_through(&mut doc, 6);
        doc.step_mut(STEP_UI_UX_DESIGN).unwrap().status = StepStatus::InProgress;
        doc.step_mut(STEP_SCAFFOLDING).unwrap().status = StepStatus::Pending;

        complete_step(&mut doc, STEP_UI_UX_DESIGN, Utc::now()).unwrap();
        assert_eq!(doc.step("mvp_production").unwrap().status, StepStatus::Locked);

        complete_step(&mut doc, STEP_SCAFFOLDING, Utc::now()).unwrap();
        assert_eq!(doc.step("mvp_production").unwrap().status, StepStatus::Pending);
    }

    #[test]
    fn mark_incomplete_locks_later_steps_and_preserves_payloads() {
        let mut doc = doc();
        completed_through(&mut doc, 9);

        // leave traces on a later step's payload
        let revisions = doc.step_mut("revisions").unwrap();
        revisions.status = StepStatus::InProgress;
        if let StepKind::Revisions { checklist, .. } = &mut revisions.kind {
            checklist.push(db::models::workflow::RevisionChecklistItem {
                id: uuid::Uuid::new_v4(),
                label: "fix header".into(),
                done: true,
            });
        }
        let before_kind = doc.step("revisions").unwrap().kind.clone();

        mark_step_incomplete(&mut doc, STEP_FINANCIALS).unwrap();

        assert_eq!(doc.step(STEP_FINANCIALS).unwrap().status, StepStatus::InProgress);
        for step in doc.steps.iter().filter(|s| s.number > 6) {
            assert_eq!(step.status, StepStatus::Locked, "step {}", step.id);
        }
        assert_eq!(doc.step("revisions").unwrap().kind, before_kind);
        // earlier steps untouched
        assert_eq!(doc.steps[0].status, StepStatus::Completed);
    }

    #[test]
    fn mark_incomplete_on_a_pair_member_spares_the_sibling() {
        let mut doc = doc();
        completed_through(&mut doc, 8);

        mark_step_incomplete(&mut doc, STEP_UI_UX_DESIGN).unwrap();

        assert_eq!(
            doc.step(STEP_UI_UX_DESIGN).unwrap().status,
            StepStatus::InProgress
        );
        assert_eq!(
            doc.step(STEP_SCAFFOLDING).unwrap().status,
            StepStatus::Completed
        );
        assert_eq!(doc.step("mvp_production").unwrap().status, StepStatus::Locked);
    }

    #[test]
    fn mark_incomplete_requires_a_completed_step() {
        let mut doc = doc();
        let err = mark_step_incomplete(&mut doc, "brief").unwrap_err();
        assert!(matches!(err, TransitionError::InvalidTransition { .. }));
    }
}
