//! Routes for contacts.

use axum::{
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::get,
    Router,
};
use db::models::contact::{Contact, CreateContact, UpdateContact};
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{error::ApiError, AppState};

/// GET /api/contacts
pub async fn list_contacts(
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Vec<Contact>>>, ApiError> {
    let contacts = Contact::find_all(&state.db().pool).await?;
    Ok(ResponseJson(ApiResponse::success(contacts)))
}

/// POST /api/contacts
pub async fn create_contact(
    State(state): State<AppState>,
    axum::Json(payload): axum::Json<CreateContact>,
) -> Result<ResponseJson<ApiResponse<Contact>>, ApiError> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::BadRequest("contact name is required".into()));
    }
    let contact = Contact::create(&state.db().pool, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(contact)))
}

/// GET /api/contacts/{contact_id}
pub async fn get_contact(
    State(state): State<AppState>,
    Path(contact_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<Contact>>, ApiError> {
    let contact = Contact::find_by_id(&state.db().pool, contact_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("contact {contact_id}")))?;
    Ok(ResponseJson(ApiResponse::success(contact)))
}

/// PUT /api/contacts/{contact_id}
pub async fn update_contact(
    State(state): State<AppState>,
    Path(contact_id): Path<Uuid>,
    axum::Json(payload): axum::Json<UpdateContact>,
) -> Result<ResponseJson<ApiResponse<Contact>>, ApiError> {
    let contact = Contact::update(&state.db().pool, contact_id, &payload)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("contact {contact_id}")))?;
    Ok(ResponseJson(ApiResponse::success(contact)))
}

/// DELETE /api/contacts/{contact_id}
pub async fn delete_contact(
    State(state): State<AppState>,
    Path(contact_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let deleted = Contact::delete(&state.db().pool, contact_id).await?;
    if deleted == 0 {
        return Err(ApiError::NotFound(format!("contact {contact_id}")));
    }
    Ok(ResponseJson(ApiResponse::success(())))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/contacts", get(list_contacts).post(create_contact))
        .route(
            "/contacts/{contact_id}",
            get(get_contact).put(update_contact).delete(delete_contact),
        )
}
