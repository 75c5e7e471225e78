//! Routes for projects. Projects are archived rather than deleted.

use axum::{
    extract::{Path, Query, State},
    response::Json as ResponseJson,
    routing::{get, post},
    Router,
};
use db::models::project::{CreateProject, Project, UpdateProject};
use serde::Deserialize;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{error::ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct ListProjectsQuery {
    #[serde(default)]
    pub include_archived: bool,
}

/// GET /api/projects
pub async fn list_projects(
    State(state): State<AppState>,
    Query(query): Query<ListProjectsQuery>,
) -> Result<ResponseJson<ApiResponse<Vec<Project>>>, ApiError> {
    let projects = Project::find_all(&state.db().pool, query.include_archived).await?;
    Ok(ResponseJson(ApiResponse::success(projects)))
}

/// POST /api/projects
pub async fn create_project(
    State(state): State<AppState>,
    axum::Json(payload): axum::Json<CreateProject>,
) -> Result<ResponseJson<ApiResponse<Project>>, ApiError> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::BadRequest("project name is required".into()));
    }
    let project = Project::create(&state.db().pool, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(project)))
}

/// GET /api/projects/{project_id}
pub async fn get_project(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<Project>>, ApiError> {
    let project = Project::find_by_id(&state.db().pool, project_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("project {project_id}")))?;
    Ok(ResponseJson(ApiResponse::success(project)))
}

/// PUT /api/projects/{project_id}
pub async fn update_project(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
    axum::Json(payload): axum::Json<UpdateProject>,
) -> Result<ResponseJson<ApiResponse<Project>>, ApiError> {
    let project = Project::update(&state.db().pool, project_id, &payload)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("project {project_id}")))?;
    Ok(ResponseJson(ApiResponse::success(project)))
}

/// POST /api/projects/{project_id}/archive
pub async fn archive_project(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<Project>>, ApiError> {
    let project = Project::set_archived(&state.db().pool, project_id, true)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("project {project_id}")))?;
    Ok(ResponseJson(ApiResponse::success(project)))
}

/// POST /api/projects/{project_id}/unarchive
pub async fn unarchive_project(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<Project>>, ApiError> {
    let project = Project::set_archived(&state.db().pool, project_id, false)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("project {project_id}")))?;
    Ok(ResponseJson(ApiResponse::success(project)))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/projects", get(list_projects).post(create_project))
        .route(
            "/projects/{project_id}",
            get(get_project).put(update_project),
        )
        .route("/projects/{project_id}/archive", post(archive_project))
        .route("/projects/{project_id}/unarchive", post(unarchive_project))
}
