//! Report handlers

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Deserialize;

use crate::extract::Query;
use crate::{AppError, AppState};
use gastos_core::models::MonthlySummary;

/// Query parameters for the monthly summary; both are required
#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    pub mes: Option<u32>,
    pub anio: Option<i32>,
}

/// GET /resumen?mes=&anio= - Budget vs. spending per category for one month
pub async fn monthly_summary(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SummaryQuery>,
) -> Result<Json<MonthlySummary>, AppError> {
    let (Some(month), Some(year)) = (params.mes, params.anio) else {
        return Err(AppError::bad_request(
            "Both 'mes' and 'anio' query parameters are required",
        ));
    };

    let summary = state.db.monthly_summary(month, year)?;
    Ok(Json(summary))
}
