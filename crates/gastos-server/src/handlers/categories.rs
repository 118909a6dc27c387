//! Category and subcategory handlers

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::extract::{Path, Query};
use crate::{read_json, AppError, AppState};
use gastos_core::models::{
    Category, CategoryUpdate, CategoryWithSubcategories, NewCategory, NewSubcategory, Pagination,
    Subcategory, SubcategoryUpdate,
};

/// Query parameters for listing subcategories
#[derive(Debug, Deserialize)]
pub struct SubcategoryQuery {
    pub categoria_id: Option<i64>,
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

pub(crate) fn default_limit() -> i64 {
    Pagination::default().limit
}

/// GET /categorias - List categories with their subcategories
pub async fn list_categories(
    State(state): State<Arc<AppState>>,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<CategoryWithSubcategories>>, AppError> {
    let categories = state.db.list_categories_detailed(page)?;
    Ok(Json(categories))
}

/// GET /categorias/:id - Get a category with its subcategories
pub async fn get_category(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<CategoryWithSubcategories>, AppError> {
    let category = state
        .db
        .get_category_with_subcategories(id)?
        .ok_or_else(|| AppError::not_found("Category not found"))?;
    Ok(Json(category))
}

/// POST /categorias - Create a category
pub async fn create_category(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<(StatusCode, Json<Category>), AppError> {
    let new: NewCategory = read_json(request).await?;
    let category = state.db.create_category(&new)?;
    Ok((StatusCode::CREATED, Json(category)))
}

/// PUT /categorias/:id - Update the supplied fields of a category
pub async fn update_category(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    request: Request,
) -> Result<Json<Category>, AppError> {
    let patch: CategoryUpdate = read_json(request).await?;
    let category = state
        .db
        .update_category(id, &patch)?
        .ok_or_else(|| AppError::not_found("Category not found"))?;
    Ok(Json(category))
}

/// DELETE /categorias/:id - Delete a category and its subcategories
pub async fn delete_category(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    if !state.db.delete_category(id)? {
        return Err(AppError::not_found("Category not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// GET /subcategorias - List subcategories, optionally for one category
pub async fn list_subcategories(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SubcategoryQuery>,
) -> Result<Json<Vec<Subcategory>>, AppError> {
    let page = Pagination::new(params.skip, params.limit);
    let subcategories = state.db.list_subcategories(params.categoria_id, page)?;
    Ok(Json(subcategories))
}

/// GET /subcategorias/:id - Get a subcategory
pub async fn get_subcategory(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Subcategory>, AppError> {
    let subcategory = state
        .db
        .get_subcategory(id)?
        .ok_or_else(|| AppError::not_found("Subcategory not found"))?;
    Ok(Json(subcategory))
}

/// POST /subcategorias - Create a subcategory
pub async fn create_subcategory(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<(StatusCode, Json<Subcategory>), AppError> {
    let new: NewSubcategory = read_json(request).await?;
    let subcategory = state.db.create_subcategory(&new)?;
    Ok((StatusCode::CREATED, Json(subcategory)))
}

/// PUT /subcategorias/:id - Update the supplied fields of a subcategory
pub async fn update_subcategory(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    request: Request,
) -> Result<Json<Subcategory>, AppError> {
    let patch: SubcategoryUpdate = read_json(request).await?;
    let subcategory = state
        .db
        .update_subcategory(id, &patch)?
        .ok_or_else(|| AppError::not_found("Subcategory not found"))?;
    Ok(Json(subcategory))
}

/// DELETE /subcategorias/:id - Delete a subcategory
pub async fn delete_subcategory(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    if !state.db.delete_subcategory(id)? {
        return Err(AppError::not_found("Subcategory not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}
