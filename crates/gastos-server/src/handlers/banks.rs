//! Bank handlers

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::extract::{Path, Query};
use crate::{read_json, AppError, AppState};
use gastos_core::models::{Bank, BankUpdate, NewBank};

/// Query parameters for listing banks
#[derive(Debug, Deserialize)]
pub struct BankQuery {
    pub activo: Option<bool>,
}

/// GET /bancos - List banks
pub async fn list_banks(
    State(state): State<Arc<AppState>>,
    Query(params): Query<BankQuery>,
) -> Result<Json<Vec<Bank>>, AppError> {
    let banks = state.db.list_banks(params.activo)?;
    Ok(Json(banks))
}

/// GET /bancos/:id - Get a bank
pub async fn get_bank(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Bank>, AppError> {
    let bank = state
        .db
        .get_bank(id)?
        .ok_or_else(|| AppError::not_found("Bank not found"))?;
    Ok(Json(bank))
}

/// POST /bancos - Create a bank
pub async fn create_bank(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<(StatusCode, Json<Bank>), AppError> {
    let new: NewBank = read_json(request).await?;
    let bank = state.db.create_bank(&new)?;
    Ok((StatusCode::CREATED, Json(bank)))
}

/// PUT /bancos/:id - Rename or (de)activate a bank
pub async fn update_bank(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    request: Request,
) -> Result<Json<Bank>, AppError> {
    let patch: BankUpdate = read_json(request).await?;
    let bank = state
        .db
        .update_bank(id, &patch)?
        .ok_or_else(|| AppError::not_found("Bank not found"))?;
    Ok(Json(bank))
}

/// DELETE /bancos/:id - Delete a bank
pub async fn delete_bank(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    if !state.db.delete_bank(id)? {
        return Err(AppError::not_found("Bank not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}
