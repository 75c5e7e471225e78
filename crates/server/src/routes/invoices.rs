//! Routes for quotes and invoices. All derived amounts are computed
//! server-side; the client only ever sends line items and rates.

use axum::{
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::{get, put},
    Router,
};
use db::models::invoice::{
    CreateInvoice, CreateInvoiceItem, Invoice, InvoiceStatus, InvoiceWithItems, PaymentStatus,
};
use serde::Deserialize;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{error::ApiError, AppState};

/// GET /api/projects/{project_id}/invoices
pub async fn list_project_invoices(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<Vec<Invoice>>>, ApiError> {
    let invoices = Invoice::find_by_project_id(&state.db().pool, project_id).await?;
    Ok(ResponseJson(ApiResponse::success(invoices)))
}

/// POST /api/projects/{project_id}/invoices
pub async fn create_invoice(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
    axum::Json(payload): axum::Json<CreateInvoice>,
) -> Result<ResponseJson<ApiResponse<InvoiceWithItems>>, ApiError> {
    if payload.number.trim().is_empty() {
        return Err(ApiError::BadRequest("document number is required".into()));
    }
    let invoice = Invoice::create_with_items(&state.db().pool, project_id, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(invoice)))
}

/// GET /api/invoices/{invoice_id}
pub async fn get_invoice(
    State(state): State<AppState>,
    Path(invoice_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<InvoiceWithItems>>, ApiError> {
    let invoice = Invoice::with_items(&state.db().pool, invoice_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("invoice {invoice_id}")))?;
    Ok(ResponseJson(ApiResponse::success(invoice)))
}

#[derive(Debug, Deserialize)]
pub struct ReplaceItemsRequest {
    pub items: Vec<CreateInvoiceItem>,
}

/// PUT /api/invoices/{invoice_id}/items
pub async fn replace_invoice_items(
    State(state): State<AppState>,
    Path(invoice_id): Path<Uuid>,
    axum::Json(payload): axum::Json<ReplaceItemsRequest>,
) -> Result<ResponseJson<ApiResponse<InvoiceWithItems>>, ApiError> {
    let invoice = Invoice::replace_items(&state.db().pool, invoice_id, &payload.items)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("invoice {invoice_id}")))?;
    Ok(ResponseJson(ApiResponse::success(invoice)))
}

#[derive(Debug, Deserialize)]
pub struct UpdateInvoiceStatusRequest {
    pub status: InvoiceStatus,
}

/// PUT /api/invoices/{invoice_id}/status
pub async fn update_invoice_status(
    State(state): State<AppState>,
    Path(invoice_id): Path<Uuid>,
    axum::Json(payload): axum::Json<UpdateInvoiceStatusRequest>,
) -> Result<ResponseJson<ApiResponse<Invoice>>, ApiError> {
    let invoice = Invoice::update_status(&state.db().pool, invoice_id, payload.status)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("invoice {invoice_id}")))?;
    Ok(ResponseJson(ApiResponse::success(invoice)))
}

#[derive(Debug, Deserialize)]
pub struct UpdatePaymentStatusRequest {
    pub payment_status: PaymentStatus,
}

/// PUT /api/invoices/{invoice_id}/payment-status
pub async fn update_payment_status(
    State(state): State<AppState>,
    Path(invoice_id): Path<Uuid>,
    axum::Json(payload): axum::Json<UpdatePaymentStatusRequest>,
) -> Result<ResponseJson<ApiResponse<Invoice>>, ApiError> {
    let invoice = Invoice::set_payment_status(&state.db().pool, invoice_id, payload.payment_status)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("invoice {invoice_id}")))?;
    Ok(ResponseJson(ApiResponse::success(invoice)))
}

#[derive(Debug, Deserialize)]
pub struct ClientApprovalRequest {
    pub approved: bool,
}

/// PUT /api/invoices/{invoice_id}/approval
pub async fn set_client_approval(
    State(state): State<AppState>,
    Path(invoice_id): Path<Uuid>,
    axum::Json(payload): axum::Json<ClientApprovalRequest>,
) -> Result<ResponseJson<ApiResponse<Invoice>>, ApiError> {
    let invoice = Invoice::set_client_approval(&state.db().pool, invoice_id, payload.approved)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("invoice {invoice_id}")))?;
    Ok(ResponseJson(ApiResponse::success(invoice)))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/projects/{project_id}/invoices",
            get(list_project_invoices).post(create_invoice),
        )
        .route("/invoices/{invoice_id}", get(get_invoice))
        .route("/invoices/{invoice_id}/items", put(replace_invoice_items))
        .route("/invoices/{invoice_id}/status", put(update_invoice_status))
        .route(
            "/invoices/{invoice_id}/payment-status",
            put(update_payment_status),
        )
        .route("/invoices/{invoice_id}/approval", put(set_client_approval))
}
