//! Expense handlers

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use super::categories::default_limit;
use crate::extract::{Path, Query};
use crate::{read_json, AppError, AppState};
use gastos_core::models::{ExpenseDetail, ExpenseFilter, ExpenseUpdate, NewExpense, Pagination};

/// Query parameters for listing expenses
#[derive(Debug, Deserialize)]
pub struct ExpenseQuery {
    pub categoria_id: Option<i64>,
    /// Month 1-12
    pub mes: Option<u32>,
    /// Year, 2000 or later
    pub anio: Option<i32>,
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

/// GET /gastos - List expenses, newest first
pub async fn list_expenses(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ExpenseQuery>,
) -> Result<Json<Vec<ExpenseDetail>>, AppError> {
    let filter = ExpenseFilter {
        category_id: params.categoria_id,
        month: params.mes,
        year: params.anio,
    };
    let page = Pagination::new(params.skip, params.limit);

    let expenses = state.db.list_expenses(&filter, page)?;
    Ok(Json(expenses))
}

/// GET /gastos/:id - Get an expense with its category and subcategory
pub async fn get_expense(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<ExpenseDetail>, AppError> {
    let expense = state
        .db
        .get_expense_detail(id)?
        .ok_or_else(|| AppError::not_found("Expense not found"))?;
    Ok(Json(expense))
}

/// POST /gastos - Record an expense
pub async fn create_expense(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<(StatusCode, Json<ExpenseDetail>), AppError> {
    let new: NewExpense = read_json(request).await?;
    let expense = state.db.create_expense(&new)?;
    Ok((StatusCode::CREATED, Json(expense)))
}

/// PUT /gastos/:id - Update the supplied fields of an expense
///
/// Sending `null` for `subcategoria_id`, `medio_pago_id` or `banco_id`
/// clears that reference; omitting it leaves it unchanged.
pub async fn update_expense(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    request: Request,
) -> Result<Json<ExpenseDetail>, AppError> {
    let patch: ExpenseUpdate = read_json(request).await?;
    let expense = state
        .db
        .update_expense(id, &patch)?
        .ok_or_else(|| AppError::not_found("Expense not found"))?;
    Ok(Json(expense))
}

/// DELETE /gastos/:id - Delete an expense
pub async fn delete_expense(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    if !state.db.delete_expense(id)? {
        return Err(AppError::not_found("Expense not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}
