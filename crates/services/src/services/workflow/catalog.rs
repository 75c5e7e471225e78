//! The static step catalog. `catalog(subtype, needs_figma)` is total over
//! its input domain and has no side effects; everything else in the engine
//! treats its output as the template for a fresh document.

use db::models::project::ProjectSubtype;
use db::models::workflow::{
    ReviewStatus, RevisionStatus, Step, StepKind, StepStatus, WorkflowDocument,
};

pub const STEP_BRIEF: &str = "brief";
pub const STEP_BRAND_GUIDELINES: &str = "brand_guidelines";
pub const STEP_TECHNICAL_SCOPE: &str = "technical_scope";
pub const STEP_TECHNICAL_REVIEW: &str = "technical_review";
pub const STEP_DATA_SCHEMA: &str = "data_schema";
pub const STEP_TEMPLATE_SELECTION: &str = "template_selection";
pub const STEP_INTEGRATION_PLAN: &str = "integration_plan";
pub const STEP_FINANCIALS: &str = "financials";
pub const STEP_UI_UX_DESIGN: &str = "ui_ux_design";
pub const STEP_SCAFFOLDING: &str = "scaffolding";
pub const STEP_MVP_PRODUCTION: &str = "mvp_production";
pub const STEP_REVISIONS: &str = "revisions";
pub const STEP_PROJECT_COMPLETION: &str = "project_completion";

fn step(id: &str, title: &str, description: &str, kind: StepKind) -> Step {
    Step {
        id: id.to_string(),
        number: 0,
        label: String::new(),
        title: title.to_string(),
        description: description.to_string(),
        status: StepStatus::Locked,
        assigned_user_id: None,
        assigned_user_name: None,
        task_id: None,
        completed_at: None,
        concurrent: false,
        files: Vec::new(),
        comments: Vec::new(),
        kind,
    }
}

fn concurrent(mut s: Step) -> Step {
    s.concurrent = true;
    s
}

pub fn brief_step() -> Step {
    step(
        STEP_BRIEF,
        "Client brief",
        "Collect and upload the signed client brief.",
        StepKind::FileUpload,
    )
}

pub fn brand_guidelines_step() -> Step {
    step(
        STEP_BRAND_GUIDELINES,
        "Brand guidelines",
        "Upload the client's brand guidelines, or the extracted summary.",
        StepKind::FileUpload,
    )
}

pub fn technical_scope_step() -> Step {
    step(
        STEP_TECHNICAL_SCOPE,
        "Technical scope",
        "Write or generate the technical scope document.",
        StepKind::Document {
            text: String::new(),
        },
    )
}

pub fn technical_review_step() -> Step {
    step(
        STEP_TECHNICAL_REVIEW,
        "Technical review",
        "Internal review of the technical scope.",
        StepKind::Review {
            review_status: ReviewStatus::Awaiting,
        },
    )
}

pub fn financials_step() -> Step {
    step(
        STEP_FINANCIALS,
        "Financials",
        "Client-approved quote plus an invoice with payment recorded.",
        StepKind::Financials {
            quote_ids: Vec::new(),
            invoice_ids: Vec::new(),
        },
    )
}

pub fn ui_ux_design_step(needs_figma: bool) -> Step {
    let description = if needs_figma {
        "Design the key flows in Figma and pass design review."
    } else {
        "Prepare static design mockups and pass design review."
    };
    concurrent(step(
        STEP_UI_UX_DESIGN,
        "UI/UX design",
        description,
        StepKind::Review {
            review_status: ReviewStatus::Awaiting,
        },
    ))
}

pub fn scaffolding_step() -> Step {
    concurrent(step(
        STEP_SCAFFOLDING,
        "Scaffolding",
        "Stand up the repository, environments and CI, and pass review.",
        StepKind::Review {
            review_status: ReviewStatus::Awaiting,
        },
    ))
}

pub fn mvp_production_step() -> Step {
    step(
        STEP_MVP_PRODUCTION,
        "MVP production",
        "Build the MVP against the approved scope.",
        StepKind::Manual,
    )
}

pub fn revisions_step() -> Step {
    step(
        STEP_REVISIONS,
        "Revisions",
        "Work through client revision rounds until approved.",
        StepKind::Revisions {
            checklist: Vec::new(),
            revision_status: RevisionStatus::InRevision,
        },
    )
}

pub fn project_completion_step() -> Step {
    step(
        STEP_PROJECT_COMPLETION,
        "Project completion",
        "Upload the signed completion form.",
        StepKind::FileUpload,
    )
}

fn subtype_step(subtype: ProjectSubtype) -> Step {
    match subtype {
        ProjectSubtype::Custom => step(
            STEP_DATA_SCHEMA,
            "Data schema",
            "Model the data schema for the custom build.",
            StepKind::Schema {
                schema_text: String::new(),
            },
        ),
        ProjectSubtype::Template => step(
            STEP_TEMPLATE_SELECTION,
            "Template selection",
            "Shortlist and confirm the template with the client.",
            StepKind::Links { links: Vec::new() },
        ),
        ProjectSubtype::Saas => step(
            STEP_INTEGRATION_PLAN,
            "Integration plan",
            "List the SaaS integrations and confirm feasibility.",
            StepKind::Links { links: Vec::new() },
        ),
    }
}

/// Assign `number`/`label` from positional order. A concurrent pair shares
/// one number and is labelled `{n}a`/`{n}b`.
pub fn renumber_steps(steps: &mut [Step]) {
    let mut number = 0i64;
    let mut i = 0;
    while i < steps.len() {
        number += 1;
        if steps[i].concurrent && i + 1 < steps.len() && steps[i + 1].concurrent {
            steps[i].number = number;
            steps[i].label = format!("{number}a");
            steps[i + 1].number = number;
            steps[i + 1].label = format!("{number}b");
            i += 2;
        } else {
            steps[i].number = number;
            steps[i].label = number.to_string();
            i += 1;
        }
    }
}

/// The ordered step template for a subtype. Every subtype yields 11 steps:
/// a shared opening, one subtype-specific step, financials directly before
/// the `7a`/`7b` concurrent pair, and the shared closing run.
pub fn catalog(subtype: ProjectSubtype, needs_figma: bool) -> Vec<Step> {
    let mut steps = vec![
        brief_step(),
        brand_guidelines_step(),
        technical_scope_step(),
        technical_review_step(),
        subtype_step(subtype),
        financials_step(),
        ui_ux_design_step(needs_figma),
        scaffolding_step(),
        mvp_production_step(),
        revisions_step(),
        project_completion_step(),
    ];
    renumber_steps(&mut steps);
    steps
}

/// A fresh document at the current schema version, with the first step
/// ready to pick up.
pub fn new_document(subtype: ProjectSubtype, needs_figma: bool) -> WorkflowDocument {
    let mut steps = catalog(subtype, needs_figma);
    if let Some(first) = steps.first_mut() {
        first.status = StepStatus::Pending;
    }
    WorkflowDocument {
        schema_version: super::migrate::SCHEMA_VERSION,
        project_subtype: subtype,
        subtype_name: subtype.display_name().to_string(),
        needs_figma,
        steps,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_subtype_yields_eleven_steps() {
        for subtype in [
            ProjectSubtype::Custom,
            ProjectSubtype::Template,
            ProjectSubtype::Saas,
        ] {
            for needs_figma in [false, true] {
                let steps = catalog(subtype, needs_figma);
                assert_eq!(steps.len(), 11, "{subtype} needs_figma={needs_figma}");
            }
        }
    }

    #[test]
    fn concurrent_pair_is_labelled_7a_7b() {
        let steps = catalog(ProjectSubtype::Template, false);
        let ui_ux = steps.iter().find(|s| s.id == STEP_UI_UX_DESIGN).unwrap();
        let scaffolding = steps.iter().find(|s| s.id == STEP_SCAFFOLDING).unwrap();
        assert!(ui_ux.concurrent && scaffolding.concurrent);
        assert_eq!((ui_ux.number, ui_ux.label.as_str()), (7, "7a"));
        assert_eq!((scaffolding.number, scaffolding.label.as_str()), (7, "7b"));
    }

    #[test]
    fn numbers_increase_strictly_outside_the_pair() {
        let steps = catalog(ProjectSubtype::Custom, true);
        for pair in steps.windows(2) {
            if pair[0].concurrent && pair[1].concurrent {
                assert_eq!(pair[0].number, pair[1].number);
            } else {
                assert!(pair[0].number < pair[1].number);
            }
        }
        assert_eq!(steps.last().unwrap().number, 10);
    }

    #[test]
    fn financials_sits_directly_before_the_pair() {
        for subtype in [
            ProjectSubtype::Custom,
            ProjectSubtype::Template,
            ProjectSubtype::Saas,
        ] {
            let steps = catalog(subtype, false);
            let fin = steps.iter().position(|s| s.id == STEP_FINANCIALS).unwrap();
            assert!(steps[fin + 1].concurrent && steps[fin + 2].concurrent);
        }
    }

    #[test]
    fn new_document_starts_at_the_brief() {
        let doc = new_document(ProjectSubtype::Saas, true);
        assert_eq!(doc.schema_version, super::super::migrate::SCHEMA_VERSION);
        assert_eq!(doc.steps[0].status, StepStatus::Pending);
        assert!(doc.steps[1..].iter().all(|s| s.status == StepStatus::Locked));
    }
}
