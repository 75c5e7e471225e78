//! Routes for users (assignment pickers; no auth layer).

use axum::{
    extract::State,
    response::Json as ResponseJson,
    routing::get,
    Router,
};
use db::models::user::{CreateUser, User};
use utils::response::ApiResponse;

use crate::{error::ApiError, AppState};

/// GET /api/users
pub async fn list_users(
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Vec<User>>>, ApiError> {
    let users = User::find_all(&state.db().pool).await?;
    Ok(ResponseJson(ApiResponse::success(users)))
}

/// POST /api/users
pub async fn create_user(
    State(state): State<AppState>,
    axum::Json(payload): axum::Json<CreateUser>,
) -> Result<ResponseJson<ApiResponse<User>>, ApiError> {
    if payload.display_name.trim().is_empty() || payload.email.trim().is_empty() {
        return Err(ApiError::BadRequest("display_name and email are required".into()));
    }
    let user = User::create(&state.db().pool, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(user)))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/users", get(list_users).post(create_user))
}
