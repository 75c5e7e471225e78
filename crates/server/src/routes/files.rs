//! Project file uploads and serving of stored bytes.

use axum::{
    body::Body,
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Json as ResponseJson, Response},
    routing::{get, put},
    Router,
};
use base64::Engine;
use db::models::uploaded_file::UploadedFile;
use serde::Deserialize;
use services::services::storage::FileStorage;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{error::ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct UploadFileRequest {
    pub filename: String,
    pub content_type: Option<String>,
    /// Base64-encoded file body.
    pub data_base64: String,
}

/// GET /api/projects/{project_id}/files
pub async fn list_project_files(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<Vec<UploadedFile>>>, ApiError> {
    let files = UploadedFile::find_by_project_id(&state.db().pool, project_id).await?;
    Ok(ResponseJson(ApiResponse::success(files)))
}

/// POST /api/projects/{project_id}/files
pub async fn upload_project_file(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
    axum::Json(payload): axum::Json<UploadFileRequest>,
) -> Result<ResponseJson<ApiResponse<UploadedFile>>, ApiError> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload.data_base64.as_bytes())
        .map_err(|e| ApiError::BadRequest(format!("invalid base64 payload: {e}")))?;

    let key = FileStorage::project_document_key(project_id, &payload.filename);
    state.storage().store(&key, &bytes).await?;

    let record = UploadedFile::create(
        &state.db().pool,
        project_id,
        None,
        &key,
        &payload.filename,
        payload
            .content_type
            .as_deref()
            .unwrap_or("application/octet-stream"),
        bytes.len() as i64,
    )
    .await?;

    Ok(ResponseJson(ApiResponse::success(record)))
}

#[derive(Debug, Deserialize)]
pub struct SetActiveRequest {
    pub active: bool,
}

/// PUT /api/files/{file_id}/active
///
/// Soft delete / restore.
pub async fn set_file_active(
    State(state): State<AppState>,
    Path(file_id): Path<Uuid>,
    axum::Json(payload): axum::Json<SetActiveRequest>,
) -> Result<ResponseJson<ApiResponse<UploadedFile>>, ApiError> {
    let file = UploadedFile::set_active(&state.db().pool, file_id, payload.active)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("file {file_id}")))?;
    Ok(ResponseJson(ApiResponse::success(file)))
}

/// GET /files/{*key}
///
/// Serves stored bytes with the recorded content type.
pub async fn serve_file(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Response, ApiError> {
    let record = UploadedFile::find_by_storage_key(&state.db().pool, &key)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("file {key}")))?;

    let bytes = state.storage().read(&record.storage_key).await?;

    Ok((
        [
            (header::CONTENT_TYPE, record.content_type.clone()),
            (
                header::CONTENT_DISPOSITION,
                format!("inline; filename=\"{}\"", record.filename),
            ),
        ],
        Body::from(bytes),
    )
        .into_response())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/projects/{project_id}/files",
            get(list_project_files).post(upload_project_file),
        )
        .route("/files/{file_id}/active", put(set_file_active))
}

/// Mounted outside `/api`: public URLs for stored uploads.
pub fn serve_router() -> Router<AppState> {
    Router::new().route("/files/{*key}", get(serve_file))
}
