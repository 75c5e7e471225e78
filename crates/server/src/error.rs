use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use services::services::{
    brand_guidelines::BrandGuidelinesError,
    scope_generator::ScopeGeneratorError,
    storage::StorageError,
    workflow::WorkflowError,
};
use thiserror::Error;
use tracing::error;
use utils::response::ApiResponse;

use db::models::workflow::WorkflowStoreError;

/// One funnel from service errors to HTTP responses. Everything is scoped
/// to the request; nothing here is fatal to the process.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    Workflow(#[from] WorkflowError),
    #[error(transparent)]
    Scope(#[from] ScopeGeneratorError),
    #[error(transparent)]
    BrandGuidelines(#[from] BrandGuidelinesError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Workflow(err) => match err {
                WorkflowError::ProjectNotFound(_)
                | WorkflowError::StepNotFound(_)
                | WorkflowError::UserNotFound(_) => StatusCode::NOT_FOUND,
                WorkflowError::Store(WorkflowStoreError::VersionConflict { .. }) => {
                    StatusCode::CONFLICT
                }
                WorkflowError::Transition(_)
                | WorkflowError::NotReady(_)
                | WorkflowError::KindMismatch { .. } => StatusCode::BAD_REQUEST,
                WorkflowError::Database(_)
                | WorkflowError::Store(_)
                | WorkflowError::Document(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Scope(ScopeGeneratorError::ProjectNotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::BrandGuidelines(BrandGuidelinesError::ProjectNotFound(_)) => {
                StatusCode::NOT_FOUND
            }
            ApiError::BrandGuidelines(BrandGuidelinesError::NoSource) => StatusCode::BAD_REQUEST,
            ApiError::Storage(StorageError::InvalidKey(_)) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "Request failed");
        }
        (status, Json(ApiResponse::<()>::error(self.to_string()))).into_response()
    }
}
