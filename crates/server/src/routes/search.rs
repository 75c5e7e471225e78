//! Global search.

use axum::{
    extract::{Query, State},
    response::Json as ResponseJson,
    routing::get,
    Router,
};
use serde::Deserialize;
use services::services::search::{self, SearchHit};
use utils::response::ApiResponse;

use crate::{error::ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// GET /api/search?q=
pub async fn global_search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<ResponseJson<ApiResponse<Vec<SearchHit>>>, ApiError> {
    let hits = search::search(&state.db().pool, &query.q).await?;
    Ok(ResponseJson(ApiResponse::success(hits)))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/search", get(global_search))
}
