//! Extractors whose rejections use the API's `{"error": ...}` body
//!
//! axum's own `Query` and `Path` reject with plain text; these wrappers run
//! the same extraction and route failures through [`AppError`].

use axum::extract::FromRequestParts;

use crate::AppError;

/// Query string extractor
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct Query<T>(pub T);

/// Path parameter extractor
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct Path<T>(pub T);
