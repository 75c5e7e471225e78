//! AI text-generation endpoints. Both degrade rather than break: with no
//! API key configured the canned fallback comes back with HTTP 200, and an
//! upstream failure maps to HTTP 500 with the fallback still in the body.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::post,
    Router,
};
use serde::Deserialize;
use services::services::brand_guidelines::{
    BrandGuidelineExtractor, BrandGuidelinesError, GeneratedGuidelines,
};
use services::services::scope_generator::{GeneratedScope, ScopeGenerator, ScopeGeneratorError};
use tracing::error;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{error::ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct GenerateScopeRequest {
    pub project_id: Uuid,
    pub brief_url: Option<String>,
}

/// POST /api/ai/generate-scope
pub async fn generate_scope(
    State(state): State<AppState>,
    axum::Json(payload): axum::Json<GenerateScopeRequest>,
) -> Result<Response, ApiError> {
    let generator = ScopeGenerator::new(state.db().pool.clone(), state.claude());

    match generator
        .generate(payload.project_id, payload.brief_url.as_deref())
        .await
    {
        Ok(scope) => Ok(Json(ApiResponse::success(scope)).into_response()),
        Err(err @ ScopeGeneratorError::Upstream(_)) => {
            error!(project_id = %payload.project_id, error = %err, "Scope generation failed");
            Ok((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error_with_data(
                    GeneratedScope::fallback(),
                    err.to_string(),
                )),
            )
                .into_response())
        }
        Err(err) => Err(err.into()),
    }
}

#[derive(Debug, Deserialize)]
pub struct BrandGuidelinesRequest {
    pub project_id: Uuid,
    pub source_url: Option<String>,
    pub source_text: Option<String>,
}

/// POST /api/ai/brand-guidelines
pub async fn brand_guidelines(
    State(state): State<AppState>,
    axum::Json(payload): axum::Json<BrandGuidelinesRequest>,
) -> Result<Response, ApiError> {
    let extractor = BrandGuidelineExtractor::new(state.db().pool.clone(), state.claude());

    match extractor
        .extract(
            payload.project_id,
            payload.source_url.as_deref(),
            payload.source_text.as_deref(),
        )
        .await
    {
        Ok(guidelines) => Ok(Json(ApiResponse::success(guidelines)).into_response()),
        Err(err @ BrandGuidelinesError::Upstream(_)) => {
            error!(project_id = %payload.project_id, error = %err, "Guideline extraction failed");
            Ok((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error_with_data(
                    GeneratedGuidelines::fallback(),
                    err.to_string(),
                )),
            )
                .into_response())
        }
        Err(err) => Err(err.into()),
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/ai/generate-scope", post(generate_scope))
        .route("/ai/brand-guidelines", post(brand_guidelines))
}
