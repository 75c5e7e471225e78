//! AI-assisted brand-guideline extraction from client material.

use db::models::project::Project;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::info;
use ts_rs::TS;
use uuid::Uuid;

use super::claude_api::{ClaudeApiClient, ClaudeApiError};

pub const GUIDELINES_FALLBACK: &str = "Automatic brand-guideline extraction is \
unavailable. Summarise the client's palette, typography, logo usage and \
tone of voice by hand.";

#[derive(Debug, Error)]
pub enum BrandGuidelinesError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("project {0} not found")]
    ProjectNotFound(Uuid),
    #[error("nothing to extract from: provide source_url or source_text")]
    NoSource,
    #[error("guideline extraction failed: {0}")]
    Upstream(#[from] ClaudeApiError),
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct GeneratedGuidelines {
    pub guidelines: String,
}

impl GeneratedGuidelines {
    pub fn fallback() -> Self {
        Self {
            guidelines: GUIDELINES_FALLBACK.to_string(),
        }
    }
}

pub struct BrandGuidelineExtractor {
    pool: SqlitePool,
    claude: Option<ClaudeApiClient>,
}

impl BrandGuidelineExtractor {
    pub fn new(pool: SqlitePool, claude: Option<ClaudeApiClient>) -> Self {
        Self { pool, claude }
    }

    /// Distill brand guidelines from a site URL or pasted material. Same
    /// degradation contract as the scope generator: no API key means the
    /// canned fallback, an upstream failure is the route's to map.
    pub async fn extract(
        &self,
        project_id: Uuid,
        source_url: Option<&str>,
        source_text: Option<&str>,
    ) -> Result<GeneratedGuidelines, BrandGuidelinesError> {
        let project = Project::find_by_id(&self.pool, project_id)
            .await?
            .ok_or(BrandGuidelinesError::ProjectNotFound(project_id))?;

        if source_url.is_none() && source_text.is_none() {
            return Err(BrandGuidelinesError::NoSource);
        }

        let Some(claude) = &self.claude else {
            info!(project_id = %project_id, "Guideline extraction not configured, returning fallback");
            return Ok(GeneratedGuidelines::fallback());
        };

        let mut prompt = format!(
            "Extract brand guidelines for the client project \"{}\".\n",
            project.name
        );
        if let Some(url) = source_url {
            prompt.push_str(&format!("The client's existing site: {url}\n"));
        }
        if let Some(text) = source_text {
            prompt.push_str(&format!("\n## Client material\n{text}\n"));
        }
        prompt.push_str(
            "\nSummarise, as plain text with short headed sections: colour \
             palette, typography, logo usage, imagery, and tone of voice. \
             Note gaps where the material is silent.\n",
        );

        let system = Some(
            "You are a brand designer producing working notes for a web \
             studio. Plain text only, no markdown tables."
                .to_string(),
        );

        let guidelines = claude.ask(&prompt, system).await?;

        info!(project_id = %project_id, "Extracted brand guidelines");

        Ok(GeneratedGuidelines { guidelines })
    }
}
