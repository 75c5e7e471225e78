//! Routes for tasks and their checklists.

use axum::{
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::{get, put},
    Router,
};
use db::models::task::{
    CreateChecklistItem, CreateTask, Task, TaskChecklistItem, TaskStatus, UpdateTask,
};
use serde::Deserialize;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{error::ApiError, AppState};

/// GET /api/projects/{project_id}/tasks
pub async fn list_project_tasks(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<Vec<Task>>>, ApiError> {
    let tasks = Task::find_by_project_id(&state.db().pool, project_id).await?;
    Ok(ResponseJson(ApiResponse::success(tasks)))
}

/// POST /api/projects/{project_id}/tasks
pub async fn create_task(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
    axum::Json(payload): axum::Json<CreateTask>,
) -> Result<ResponseJson<ApiResponse<Task>>, ApiError> {
    if payload.title.trim().is_empty() {
        return Err(ApiError::BadRequest("task title is required".into()));
    }
    let task = Task::create(&state.db().pool, project_id, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(task)))
}

/// GET /api/tasks/{task_id}
pub async fn get_task(
    State(state): State<AppState>,
    Path(task_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<Task>>, ApiError> {
    let task = Task::find_by_id(&state.db().pool, task_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("task {task_id}")))?;
    Ok(ResponseJson(ApiResponse::success(task)))
}

/// PUT /api/tasks/{task_id}
pub async fn update_task(
    State(state): State<AppState>,
    Path(task_id): Path<Uuid>,
    axum::Json(payload): axum::Json<UpdateTask>,
) -> Result<ResponseJson<ApiResponse<Task>>, ApiError> {
    let task = Task::update(&state.db().pool, task_id, &payload)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("task {task_id}")))?;
    Ok(ResponseJson(ApiResponse::success(task)))
}

#[derive(Debug, Deserialize)]
pub struct UpdateTaskStatusRequest {
    pub status: TaskStatus,
}

/// PUT /api/tasks/{task_id}/status
///
/// Direct status write, no transition guard.
pub async fn update_task_status(
    State(state): State<AppState>,
    Path(task_id): Path<Uuid>,
    axum::Json(payload): axum::Json<UpdateTaskStatusRequest>,
) -> Result<ResponseJson<ApiResponse<Task>>, ApiError> {
    Task::update_status(&state.db().pool, task_id, payload.status).await?;
    let task = Task::find_by_id(&state.db().pool, task_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("task {task_id}")))?;
    Ok(ResponseJson(ApiResponse::success(task)))
}

/// DELETE /api/tasks/{task_id}
pub async fn delete_task(
    State(state): State<AppState>,
    Path(task_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let deleted = Task::delete(&state.db().pool, task_id).await?;
    if deleted == 0 {
        return Err(ApiError::NotFound(format!("task {task_id}")));
    }
    Ok(ResponseJson(ApiResponse::success(())))
}

/// GET /api/tasks/{task_id}/checklist
pub async fn list_checklist(
    State(state): State<AppState>,
    Path(task_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<Vec<TaskChecklistItem>>>, ApiError> {
    let items = TaskChecklistItem::find_by_task_id(&state.db().pool, task_id).await?;
    Ok(ResponseJson(ApiResponse::success(items)))
}

/// POST /api/tasks/{task_id}/checklist
pub async fn create_checklist_item(
    State(state): State<AppState>,
    Path(task_id): Path<Uuid>,
    axum::Json(payload): axum::Json<CreateChecklistItem>,
) -> Result<ResponseJson<ApiResponse<TaskChecklistItem>>, ApiError> {
    if payload.label.trim().is_empty() {
        return Err(ApiError::BadRequest("checklist label is required".into()));
    }
    let item = TaskChecklistItem::create(&state.db().pool, task_id, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(item)))
}

#[derive(Debug, Deserialize)]
pub struct ToggleChecklistRequest {
    pub done: bool,
}

/// PUT /api/tasks/{task_id}/checklist/{item_id}
pub async fn toggle_checklist_item(
    State(state): State<AppState>,
    Path((_task_id, item_id)): Path<(Uuid, Uuid)>,
    axum::Json(payload): axum::Json<ToggleChecklistRequest>,
) -> Result<ResponseJson<ApiResponse<TaskChecklistItem>>, ApiError> {
    let item = TaskChecklistItem::set_done(&state.db().pool, item_id, payload.done)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("checklist item {item_id}")))?;
    Ok(ResponseJson(ApiResponse::success(item)))
}

/// DELETE /api/tasks/{task_id}/checklist/{item_id}
pub async fn delete_checklist_item(
    State(state): State<AppState>,
    Path((_task_id, item_id)): Path<(Uuid, Uuid)>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let deleted = TaskChecklistItem::delete(&state.db().pool, item_id).await?;
    if deleted == 0 {
        return Err(ApiError::NotFound(format!("checklist item {item_id}")));
    }
    Ok(ResponseJson(ApiResponse::success(())))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/projects/{project_id}/tasks",
            get(list_project_tasks).post(create_task),
        )
        .route(
            "/tasks/{task_id}",
            get(get_task).put(update_task).delete(delete_task),
        )
        .route("/tasks/{task_id}/status", put(update_task_status))
        .route(
            "/tasks/{task_id}/checklist",
            get(list_checklist).post(create_checklist_item),
        )
        .route(
            "/tasks/{task_id}/checklist/{item_id}",
            put(toggle_checklist_item).delete(delete_checklist_item),
        )
}
