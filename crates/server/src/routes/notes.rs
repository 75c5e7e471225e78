//! Routes for project notes.

use axum::{
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::{get, put},
    Router,
};
use db::models::note::{CreateNote, ProjectNote};
use serde::Deserialize;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{error::ApiError, AppState};

/// GET /api/projects/{project_id}/notes
pub async fn list_project_notes(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<Vec<ProjectNote>>>, ApiError> {
    let notes = ProjectNote::find_by_project_id(&state.db().pool, project_id).await?;
    Ok(ResponseJson(ApiResponse::success(notes)))
}

/// POST /api/projects/{project_id}/notes
pub async fn create_note(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
    axum::Json(payload): axum::Json<CreateNote>,
) -> Result<ResponseJson<ApiResponse<ProjectNote>>, ApiError> {
    if payload.body.trim().is_empty() {
        return Err(ApiError::BadRequest("note body is required".into()));
    }
    let note = ProjectNote::create(&state.db().pool, project_id, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(note)))
}

#[derive(Debug, Deserialize)]
pub struct UpdateNoteRequest {
    pub body: String,
}

/// PUT /api/notes/{note_id}
pub async fn update_note(
    State(state): State<AppState>,
    Path(note_id): Path<Uuid>,
    axum::Json(payload): axum::Json<UpdateNoteRequest>,
) -> Result<ResponseJson<ApiResponse<ProjectNote>>, ApiError> {
    let note = ProjectNote::update_body(&state.db().pool, note_id, &payload.body)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("note {note_id}")))?;
    Ok(ResponseJson(ApiResponse::success(note)))
}

#[derive(Debug, Deserialize)]
pub struct PinNoteRequest {
    pub pinned: bool,
}

/// PUT /api/notes/{note_id}/pin
pub async fn pin_note(
    State(state): State<AppState>,
    Path(note_id): Path<Uuid>,
    axum::Json(payload): axum::Json<PinNoteRequest>,
) -> Result<ResponseJson<ApiResponse<ProjectNote>>, ApiError> {
    let note = ProjectNote::set_pinned(&state.db().pool, note_id, payload.pinned)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("note {note_id}")))?;
    Ok(ResponseJson(ApiResponse::success(note)))
}

/// DELETE /api/notes/{note_id}
pub async fn delete_note(
    State(state): State<AppState>,
    Path(note_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let deleted = ProjectNote::delete(&state.db().pool, note_id).await?;
    if deleted == 0 {
        return Err(ApiError::NotFound(format!("note {note_id}")));
    }
    Ok(ResponseJson(ApiResponse::success(())))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/projects/{project_id}/notes",
            get(list_project_notes).post(create_note),
        )
        .route("/notes/{note_id}", put(update_note).delete(delete_note))
        .route("/notes/{note_id}/pin", put(pin_note))
}
