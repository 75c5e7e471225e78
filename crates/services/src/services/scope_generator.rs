//! AI-assisted technical scope documents.

use db::models::project::Project;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::info;
use ts_rs::TS;
use uuid::Uuid;

use super::claude_api::{ClaudeApiClient, ClaudeApiError};

/// Returned verbatim when generation is not configured, and as the body of
/// a failed generation.
pub const SCOPE_FALLBACK: &str = "Automatic scope generation is unavailable. \
Draft the technical scope manually: goals, deliverables, milestones, \
assumptions, and out-of-scope items.";

#[derive(Debug, Error)]
pub enum ScopeGeneratorError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("project {0} not found")]
    ProjectNotFound(Uuid),
    #[error("scope generation failed: {0}")]
    Upstream(#[from] ClaudeApiError),
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct GeneratedScope {
    pub scope: String,
    pub questions: Vec<String>,
}

impl GeneratedScope {
    pub fn fallback() -> Self {
        Self {
            scope: SCOPE_FALLBACK.to_string(),
            questions: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ScopeReply {
    scope: String,
    #[serde(default)]
    questions: Vec<String>,
}

pub struct ScopeGenerator {
    pool: SqlitePool,
    claude: Option<ClaudeApiClient>,
}

impl ScopeGenerator {
    pub fn new(pool: SqlitePool, claude: Option<ClaudeApiClient>) -> Self {
        Self { pool, claude }
    }

    /// Generate a scope document for a project. Without a configured API
    /// key this returns the canned fallback rather than failing; an
    /// upstream failure is surfaced as an error for the route to map.
    pub async fn generate(
        &self,
        project_id: Uuid,
        brief_url: Option<&str>,
    ) -> Result<GeneratedScope, ScopeGeneratorError> {
        let project = Project::find_by_id(&self.pool, project_id)
            .await?
            .ok_or(ScopeGeneratorError::ProjectNotFound(project_id))?;

        let Some(claude) = &self.claude else {
            info!(project_id = %project_id, "Scope generation not configured, returning fallback");
            return Ok(GeneratedScope::fallback());
        };

        let mut prompt = format!(
            "Write a technical scope document for the project below.\n\n\
             ## Project\n\
             Name: {}\n\
             Build type: {}\n",
            project.name,
            project.subtype.display_name(),
        );
        if let Some(url) = brief_url {
            prompt.push_str(&format!("Client brief: {url}\n"));
        }
        prompt.push_str(
            "\n## Instructions\n\
             Cover goals, deliverables, milestones, assumptions, and explicit \
             out-of-scope items, as plain text. List anything you could not \
             infer as open questions.\n\n\
             ## Output format\n\
             Return ONLY valid JSON: {\"scope\": \"...\", \"questions\": [\"...\"]}\n",
        );

        let system = Some(
            "You are a delivery lead at a web studio writing concise, practical \
             scope documents for client projects. Output valid JSON only."
                .to_string(),
        );

        let reply: ScopeReply = claude.ask_json(&prompt, system).await?;

        info!(
            project_id = %project_id,
            question_count = reply.questions.len(),
            "Generated scope document"
        );

        Ok(GeneratedScope {
            scope: reply.scope,
            questions: reply.questions,
        })
    }
}
