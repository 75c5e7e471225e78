//! Routes for the per-project note board, stored and returned wholesale.

use axum::{
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use db::models::board::{Board, BoardLayout};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{error::ApiError, AppState};

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct BoardResponse {
    pub id: Uuid,
    pub project_id: Uuid,
    pub title: String,
    pub layout: BoardLayout,
    pub updated_at: DateTime<Utc>,
}

impl From<Board> for BoardResponse {
    fn from(board: Board) -> Self {
        let layout = board.parsed_layout();
        Self {
            id: board.id,
            project_id: board.project_id,
            title: board.title,
            layout,
            updated_at: board.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PutBoardRequest {
    pub title: String,
    pub layout: BoardLayout,
}

/// GET /api/projects/{project_id}/board
pub async fn get_board(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<Option<BoardResponse>>>, ApiError> {
    let board = Board::find_by_project_id(&state.db().pool, project_id).await?;
    Ok(ResponseJson(ApiResponse::success(board.map(Into::into))))
}

/// PUT /api/projects/{project_id}/board
pub async fn put_board(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
    axum::Json(payload): axum::Json<PutBoardRequest>,
) -> Result<ResponseJson<ApiResponse<BoardResponse>>, ApiError> {
    let board = Board::upsert(&state.db().pool, project_id, &payload.title, &payload.layout).await?;
    Ok(ResponseJson(ApiResponse::success(board.into())))
}

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/projects/{project_id}/board",
        get(get_board).put(put_board),
    )
}
