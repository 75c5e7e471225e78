//! Routes for the per-project workflow document. Every mutation loads the
//! document, applies one change, and persists it wholesale under the
//! version check.

use axum::{
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::{get, post, put},
    Router,
};
use base64::Engine;
use db::models::uploaded_file::UploadedFile;
use db::models::workflow::{ReviewStatus, WorkflowDocument};
use serde::Deserialize;
use services::services::storage::FileStorage;
use services::services::workflow::{LoadedWorkflow, StepDataPatch, WorkflowService};
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{error::ApiError, AppState};

fn workflow_service(state: &AppState) -> WorkflowService {
    WorkflowService::new(state.db().pool.clone())
}

/// GET /api/projects/{project_id}/workflow
///
/// Seeds a fresh catalog document on first load and runs any pending
/// document migrations.
pub async fn get_workflow(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<LoadedWorkflow>>, ApiError> {
    let loaded = workflow_service(&state).load(project_id).await?;
    Ok(ResponseJson(ApiResponse::success(loaded)))
}

#[derive(Debug, Deserialize)]
pub struct ReplaceWorkflowRequest {
    pub document: WorkflowDocument,
    pub expected_version: i64,
}

/// PUT /api/projects/{project_id}/workflow
pub async fn replace_workflow(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
    axum::Json(payload): axum::Json<ReplaceWorkflowRequest>,
) -> Result<ResponseJson<ApiResponse<LoadedWorkflow>>, ApiError> {
    let loaded = workflow_service(&state)
        .replace(project_id, payload.document, payload.expected_version)
        .await?;
    Ok(ResponseJson(ApiResponse::success(loaded)))
}

/// POST /api/projects/{project_id}/workflow/steps/{step_id}/start
pub async fn start_step(
    State(state): State<AppState>,
    Path((project_id, step_id)): Path<(Uuid, String)>,
) -> Result<ResponseJson<ApiResponse<LoadedWorkflow>>, ApiError> {
    let loaded = workflow_service(&state).start_step(project_id, &step_id).await?;
    Ok(ResponseJson(ApiResponse::success(loaded)))
}

/// POST /api/projects/{project_id}/workflow/steps/{step_id}/complete
///
/// Refused unless the step's readiness predicate holds.
pub async fn complete_step(
    State(state): State<AppState>,
    Path((project_id, step_id)): Path<(Uuid, String)>,
) -> Result<ResponseJson<ApiResponse<LoadedWorkflow>>, ApiError> {
    let loaded = workflow_service(&state)
        .complete_step(project_id, &step_id)
        .await?;
    Ok(ResponseJson(ApiResponse::success(loaded)))
}

/// POST /api/projects/{project_id}/workflow/steps/{step_id}/mark-incomplete
pub async fn mark_step_incomplete(
    State(state): State<AppState>,
    Path((project_id, step_id)): Path<(Uuid, String)>,
) -> Result<ResponseJson<ApiResponse<LoadedWorkflow>>, ApiError> {
    let loaded = workflow_service(&state)
        .mark_step_incomplete(project_id, &step_id)
        .await?;
    Ok(ResponseJson(ApiResponse::success(loaded)))
}

#[derive(Debug, Deserialize)]
pub struct AssignStepRequest {
    pub user_id: Option<Uuid>,
}

/// POST /api/projects/{project_id}/workflow/steps/{step_id}/assign
pub async fn assign_step(
    State(state): State<AppState>,
    Path((project_id, step_id)): Path<(Uuid, String)>,
    axum::Json(payload): axum::Json<AssignStepRequest>,
) -> Result<ResponseJson<ApiResponse<LoadedWorkflow>>, ApiError> {
    let loaded = workflow_service(&state)
        .assign_step(project_id, &step_id, payload.user_id)
        .await?;
    Ok(ResponseJson(ApiResponse::success(loaded)))
}

#[derive(Debug, Deserialize)]
pub struct AddCommentRequest {
    pub author_user_id: Option<Uuid>,
    pub body: String,
}

/// POST /api/projects/{project_id}/workflow/steps/{step_id}/comments
pub async fn add_comment(
    State(state): State<AppState>,
    Path((project_id, step_id)): Path<(Uuid, String)>,
    axum::Json(payload): axum::Json<AddCommentRequest>,
) -> Result<ResponseJson<ApiResponse<LoadedWorkflow>>, ApiError> {
    if payload.body.trim().is_empty() {
        return Err(ApiError::BadRequest("comment body is required".into()));
    }
    let loaded = workflow_service(&state)
        .add_comment(project_id, &step_id, payload.author_user_id, payload.body)
        .await?;
    Ok(ResponseJson(ApiResponse::success(loaded)))
}

#[derive(Debug, Deserialize)]
pub struct UploadStepFileRequest {
    pub filename: String,
    pub content_type: Option<String>,
    /// Base64-encoded file body.
    pub data_base64: String,
}

/// POST /api/projects/{project_id}/workflow/steps/{step_id}/files
///
/// Stores the bytes under `workflows/{project_id}/{step_id}/…`, records the
/// upload, and attaches it to the step.
pub async fn upload_step_file(
    State(state): State<AppState>,
    Path((project_id, step_id)): Path<(Uuid, String)>,
    axum::Json(payload): axum::Json<UploadStepFileRequest>,
) -> Result<ResponseJson<ApiResponse<LoadedWorkflow>>, ApiError> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload.data_base64.as_bytes())
        .map_err(|e| ApiError::BadRequest(format!("invalid base64 payload: {e}")))?;

    let key = FileStorage::workflow_key(project_id, &step_id, &payload.filename);
    state.storage().store(&key, &bytes).await?;

    let record = UploadedFile::create(
        &state.db().pool,
        project_id,
        Some(&step_id),
        &key,
        &payload.filename,
        payload
            .content_type
            .as_deref()
            .unwrap_or("application/octet-stream"),
        bytes.len() as i64,
    )
    .await?;

    let loaded = workflow_service(&state)
        .attach_file(project_id, &step_id, &record, FileStorage::public_url(&key))
        .await?;
    Ok(ResponseJson(ApiResponse::success(loaded)))
}

#[derive(Debug, Deserialize)]
pub struct SetReviewStatusRequest {
    pub review_status: ReviewStatus,
}

/// PUT /api/projects/{project_id}/workflow/steps/{step_id}/review
pub async fn set_review_status(
    State(state): State<AppState>,
    Path((project_id, step_id)): Path<(Uuid, String)>,
    axum::Json(payload): axum::Json<SetReviewStatusRequest>,
) -> Result<ResponseJson<ApiResponse<LoadedWorkflow>>, ApiError> {
    let loaded = workflow_service(&state)
        .set_review_status(project_id, &step_id, payload.review_status)
        .await?;
    Ok(ResponseJson(ApiResponse::success(loaded)))
}

/// PUT /api/projects/{project_id}/workflow/steps/{step_id}/data
///
/// The patch variant must match the step's kind.
pub async fn update_step_data(
    State(state): State<AppState>,
    Path((project_id, step_id)): Path<(Uuid, String)>,
    axum::Json(payload): axum::Json<StepDataPatch>,
) -> Result<ResponseJson<ApiResponse<LoadedWorkflow>>, ApiError> {
    let loaded = workflow_service(&state)
        .update_step_data(project_id, &step_id, payload)
        .await?;
    Ok(ResponseJson(ApiResponse::success(loaded)))
}

pub fn router() -> Router<AppState> {
    Router::new().nest(
        "/projects/{project_id}/workflow",
        Router::new()
            .route("/", get(get_workflow).put(replace_workflow))
            .route("/steps/{step_id}/start", post(start_step))
            .route("/steps/{step_id}/complete", post(complete_step))
            .route("/steps/{step_id}/mark-incomplete", post(mark_step_incomplete))
            .route("/steps/{step_id}/assign", post(assign_step))
            .route("/steps/{step_id}/comments", post(add_comment))
            .route("/steps/{step_id}/files", post(upload_step_file))
            .route("/steps/{step_id}/review", put(set_review_status))
            .route("/steps/{step_id}/data", put(update_step_data)),
    )
}
