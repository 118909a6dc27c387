//! Bank account handlers

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::extract::{Path, Query};
use crate::{read_json, AppError, AppState};
use gastos_core::models::{AccountsSummary, BankAccount, BankAccountUpdate, NewBankAccount};

/// Query parameters for listing bank accounts
#[derive(Debug, Deserialize)]
pub struct BankAccountQuery {
    pub activa: Option<bool>,
}

/// GET /cuentas-bancarias - List bank accounts
pub async fn list_bank_accounts(
    State(state): State<Arc<AppState>>,
    Query(params): Query<BankAccountQuery>,
) -> Result<Json<Vec<BankAccount>>, AppError> {
    let accounts = state.db.list_bank_accounts(params.activa)?;
    Ok(Json(accounts))
}

/// GET /cuentas-bancarias/resumen - Balance totals across active accounts
pub async fn accounts_summary(
    State(state): State<Arc<AppState>>,
) -> Result<Json<AccountsSummary>, AppError> {
    let summary = state.db.accounts_summary()?;
    Ok(Json(summary))
}

/// GET /cuentas-bancarias/:id - Get a bank account
pub async fn get_bank_account(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<BankAccount>, AppError> {
    let account = state
        .db
        .get_bank_account(id)?
        .ok_or_else(|| AppError::not_found("Bank account not found"))?;
    Ok(Json(account))
}

/// POST /cuentas-bancarias - Open a bank account
pub async fn create_bank_account(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<(StatusCode, Json<BankAccount>), AppError> {
    let new: NewBankAccount = read_json(request).await?;
    let account = state.db.create_bank_account(&new)?;
    Ok((StatusCode::CREATED, Json(account)))
}

/// PUT /cuentas-bancarias/:id - Update the supplied fields of a bank account
pub async fn update_bank_account(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    request: Request,
) -> Result<Json<BankAccount>, AppError> {
    let patch: BankAccountUpdate = read_json(request).await?;
    let account = state
        .db
        .update_bank_account(id, &patch)?
        .ok_or_else(|| AppError::not_found("Bank account not found"))?;
    Ok(Json(account))
}

/// DELETE /cuentas-bancarias/:id - Delete a bank account
pub async fn delete_bank_account(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    if !state.db.delete_bank_account(id)? {
        return Err(AppError::not_found("Bank account not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}
