//! Payment method handlers

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::extract::{Path, Query};
use crate::{read_json, AppError, AppState};
use gastos_core::models::{NewPaymentMethod, PaymentMethod, PaymentMethodUpdate};

/// Query parameters for listing payment methods
#[derive(Debug, Deserialize)]
pub struct PaymentMethodQuery {
    pub banco_id: Option<i64>,
    pub activo: Option<bool>,
}

/// GET /medios-pago - List payment methods
pub async fn list_payment_methods(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PaymentMethodQuery>,
) -> Result<Json<Vec<PaymentMethod>>, AppError> {
    let methods = state
        .db
        .list_payment_methods(params.banco_id, params.activo)?;
    Ok(Json(methods))
}

/// GET /medios-pago/:id - Get a payment method
pub async fn get_payment_method(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<PaymentMethod>, AppError> {
    let method = state
        .db
        .get_payment_method(id)?
        .ok_or_else(|| AppError::not_found("Payment method not found"))?;
    Ok(Json(method))
}

/// POST /medios-pago - Create a payment method
pub async fn create_payment_method(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<(StatusCode, Json<PaymentMethod>), AppError> {
    let new: NewPaymentMethod = read_json(request).await?;
    let method = state.db.create_payment_method(&new)?;
    Ok((StatusCode::CREATED, Json(method)))
}

/// PUT /medios-pago/:id - Update the supplied fields of a payment method
pub async fn update_payment_method(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    request: Request,
) -> Result<Json<PaymentMethod>, AppError> {
    let patch: PaymentMethodUpdate = read_json(request).await?;
    let method = state
        .db
        .update_payment_method(id, &patch)?
        .ok_or_else(|| AppError::not_found("Payment method not found"))?;
    Ok(Json(method))
}

/// DELETE /medios-pago/:id - Delete a payment method
pub async fn delete_payment_method(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    if !state.db.delete_payment_method(id)? {
        return Err(AppError::not_found("Payment method not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}
