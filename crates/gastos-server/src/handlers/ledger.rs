//! Income and transfer handlers
//!
//! Both write paths adjust account balances inside the core ledger.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::extract::{Path, Query};
use super::categories::default_limit;
use crate::{read_json, AppError, AppState};
use gastos_core::models::{Income, IncomeUpdate, NewIncome, NewTransfer, Pagination, Transfer};

/// Query parameters for listing incomes
#[derive(Debug, Deserialize)]
pub struct IncomeQuery {
    pub cuenta_bancaria_id: Option<i64>,
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

/// GET /ingresos - List incomes, newest first
pub async fn list_incomes(
    State(state): State<Arc<AppState>>,
    Query(params): Query<IncomeQuery>,
) -> Result<Json<Vec<Income>>, AppError> {
    let page = Pagination::new(params.skip, params.limit);
    let incomes = state.db.list_incomes(params.cuenta_bancaria_id, page)?;
    Ok(Json(incomes))
}

/// GET /ingresos/:id - Get an income
pub async fn get_income(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Income>, AppError> {
    let income = state
        .db
        .get_income(id)?
        .ok_or_else(|| AppError::not_found("Income not found"))?;
    Ok(Json(income))
}

/// POST /ingresos - Record an income and credit its account
pub async fn create_income(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<(StatusCode, Json<Income>), AppError> {
    let new: NewIncome = read_json(request).await?;
    let income = state.db.create_income(&new)?;
    Ok((StatusCode::CREATED, Json(income)))
}

/// PUT /ingresos/:id - Update an income, moving its balance effect
pub async fn update_income(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    request: Request,
) -> Result<Json<Income>, AppError> {
    let patch: IncomeUpdate = read_json(request).await?;
    let income = state
        .db
        .update_income(id, &patch)?
        .ok_or_else(|| AppError::not_found("Income not found"))?;
    Ok(Json(income))
}

/// DELETE /ingresos/:id - Delete an income and reverse its credit
pub async fn delete_income(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    if !state.db.delete_income(id)? {
        return Err(AppError::not_found("Income not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// GET /transferencias - List transfers, newest first
pub async fn list_transfers(
    State(state): State<Arc<AppState>>,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<Transfer>>, AppError> {
    let transfers = state.db.list_transfers(page)?;
    Ok(Json(transfers))
}

/// GET /transferencias/:id - Get a transfer
pub async fn get_transfer(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Transfer>, AppError> {
    let transfer = state
        .db
        .get_transfer(id)?
        .ok_or_else(|| AppError::not_found("Transfer not found"))?;
    Ok(Json(transfer))
}

/// POST /transferencias - Move transactional funds between two accounts
pub async fn create_transfer(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<(StatusCode, Json<Transfer>), AppError> {
    let new: NewTransfer = read_json(request).await?;
    let transfer = state.db.create_transfer(&new)?;
    Ok((StatusCode::CREATED, Json(transfer)))
}
