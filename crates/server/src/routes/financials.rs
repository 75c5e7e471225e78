//! The studio-wide financial summary.

use axum::{
    extract::State,
    response::Json as ResponseJson,
    routing::get,
    Router,
};
use services::services::financials::{self, ProjectFinancialSummary};
use utils::response::ApiResponse;

use crate::{error::ApiError, AppState};

/// GET /api/financials/summary
pub async fn financial_summary(
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Vec<ProjectFinancialSummary>>>, ApiError> {
    let rows = financials::summary(&state.db().pool).await?;
    Ok(ResponseJson(ApiResponse::success(rows)))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/financials/summary", get(financial_summary))
}
