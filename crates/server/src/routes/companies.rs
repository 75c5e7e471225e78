//! Routes for companies.

use axum::{
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::get,
    Router,
};
use db::models::company::{Company, CreateCompany, UpdateCompany};
use db::models::contact::Contact;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{error::ApiError, AppState};

/// GET /api/companies
pub async fn list_companies(
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Vec<Company>>>, ApiError> {
    let companies = Company::find_all(&state.db().pool).await?;
    Ok(ResponseJson(ApiResponse::success(companies)))
}

/// POST /api/companies
pub async fn create_company(
    State(state): State<AppState>,
    axum::Json(payload): axum::Json<CreateCompany>,
) -> Result<ResponseJson<ApiResponse<Company>>, ApiError> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::BadRequest("company name is required".into()));
    }
    let company = Company::create(&state.db().pool, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(company)))
}

/// GET /api/companies/{company_id}
pub async fn get_company(
    State(state): State<AppState>,
    Path(company_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<Company>>, ApiError> {
    let company = Company::find_by_id(&state.db().pool, company_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("company {company_id}")))?;
    Ok(ResponseJson(ApiResponse::success(company)))
}

/// PUT /api/companies/{company_id}
pub async fn update_company(
    State(state): State<AppState>,
    Path(company_id): Path<Uuid>,
    axum::Json(payload): axum::Json<UpdateCompany>,
) -> Result<ResponseJson<ApiResponse<Company>>, ApiError> {
    let company = Company::update(&state.db().pool, company_id, &payload)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("company {company_id}")))?;
    Ok(ResponseJson(ApiResponse::success(company)))
}

/// DELETE /api/companies/{company_id}
pub async fn delete_company(
    State(state): State<AppState>,
    Path(company_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let deleted = Company::delete(&state.db().pool, company_id).await?;
    if deleted == 0 {
        return Err(ApiError::NotFound(format!("company {company_id}")));
    }
    Ok(ResponseJson(ApiResponse::success(())))
}

/// GET /api/companies/{company_id}/contacts
pub async fn list_company_contacts(
    State(state): State<AppState>,
    Path(company_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<Vec<Contact>>>, ApiError> {
    let contacts = Contact::find_by_company_id(&state.db().pool, company_id).await?;
    Ok(ResponseJson(ApiResponse::success(contacts)))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/companies", get(list_companies).post(create_company))
        .route(
            "/companies/{company_id}",
            get(get_company).put(update_company).delete(delete_company),
        )
        .route("/companies/{company_id}/contacts", get(list_company_contacts))
}
