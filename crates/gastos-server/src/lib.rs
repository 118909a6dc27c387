//! Gastos Web Server
//!
//! Axum-based REST API for the Gastos household finance tracker.
//!
//! Security features:
//! - Restrictive CORS policy (configurable allowed origins)
//! - Input validation (pagination limits, request body size limit)
//! - Sanitized error responses

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        Request,
    },
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::de::DeserializeOwned;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};
use tracing::{error, info, warn};

use gastos_core::db::Database;

mod extract;
mod handlers;

/// Maximum accepted JSON request body (64 KB)
pub const MAX_BODY_SIZE: usize = 64 * 1024;

/// Environment variable holding comma-separated allowed CORS origins
pub const ALLOWED_ORIGINS_ENV: &str = "GASTOS_ALLOWED_ORIGINS";

/// Server configuration
#[derive(Clone, Debug, Default)]
pub struct ServerConfig {
    /// Allowed CORS origins (empty = same-origin only, `*` = any origin)
    pub allowed_origins: Vec<String>,
}

impl ServerConfig {
    /// Build configuration from `GASTOS_ALLOWED_ORIGINS`
    pub fn from_env() -> Self {
        let allowed_origins = std::env::var(ALLOWED_ORIGINS_ENV)
            .map(|v| parse_origins(&v))
            .unwrap_or_default();
        Self { allowed_origins }
    }
}

/// Split a comma-separated origin list, dropping blanks
pub fn parse_origins(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Shared application state
pub struct AppState {
    pub db: Database,
    pub config: ServerConfig,
}

/// Create the application router
pub fn create_router(db: Database, static_dir: Option<&str>, config: ServerConfig) -> Router {
    let cors = build_cors(&config.allowed_origins);
    let state = Arc::new(AppState { db, config });

    let api_routes = Router::new()
        .route("/api", get(handlers::api_info))
        // Categories
        .route(
            "/categorias",
            get(handlers::list_categories).post(handlers::create_category),
        )
        .route(
            "/categorias/:id",
            get(handlers::get_category)
                .put(handlers::update_category)
                .delete(handlers::delete_category),
        )
        // Subcategories
        .route(
            "/subcategorias",
            get(handlers::list_subcategories).post(handlers::create_subcategory),
        )
        .route(
            "/subcategorias/:id",
            get(handlers::get_subcategory)
                .put(handlers::update_subcategory)
                .delete(handlers::delete_subcategory),
        )
        // Expenses
        .route(
            "/gastos",
            get(handlers::list_expenses).post(handlers::create_expense),
        )
        .route(
            "/gastos/:id",
            get(handlers::get_expense)
                .put(handlers::update_expense)
                .delete(handlers::delete_expense),
        )
        // Monthly budget report
        .route("/resumen", get(handlers::monthly_summary))
        // Banks and payment methods
        .route("/bancos", get(handlers::list_banks).post(handlers::create_bank))
        .route(
            "/bancos/:id",
            get(handlers::get_bank)
                .put(handlers::update_bank)
                .delete(handlers::delete_bank),
        )
        .route(
            "/medios-pago",
            get(handlers::list_payment_methods).post(handlers::create_payment_method),
        )
        .route(
            "/medios-pago/:id",
            get(handlers::get_payment_method)
                .put(handlers::update_payment_method)
                .delete(handlers::delete_payment_method),
        )
        // Bank accounts (the static `resumen` segment wins over `:id`)
        .route(
            "/cuentas-bancarias",
            get(handlers::list_bank_accounts).post(handlers::create_bank_account),
        )
        .route("/cuentas-bancarias/resumen", get(handlers::accounts_summary))
        .route(
            "/cuentas-bancarias/:id",
            get(handlers::get_bank_account)
                .put(handlers::update_bank_account)
                .delete(handlers::delete_bank_account),
        )
        // Ledger
        .route(
            "/ingresos",
            get(handlers::list_incomes).post(handlers::create_income),
        )
        .route(
            "/ingresos/:id",
            get(handlers::get_income)
                .put(handlers::update_income)
                .delete(handlers::delete_income),
        )
        .route(
            "/transferencias",
            get(handlers::list_transfers).post(handlers::create_transfer),
        )
        .route("/transferencias/:id", get(handlers::get_transfer));

    let mut app = api_routes
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // Security headers
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ));

    // Serve static files if directory provided
    if let Some(dir) = static_dir {
        app = app.fallback_service(ServeDir::new(dir));
    }

    app
}

fn build_cors(allowed_origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE]);

    if allowed_origins.is_empty() {
        // Restrictive default: only allow same-origin
        cors
    } else if allowed_origins.iter().any(|o| o == "*") {
        cors.allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = allowed_origins
            .iter()
            .filter_map(|o| match o.parse() {
                Ok(v) => Some(v),
                Err(_) => {
                    warn!("Ignoring invalid CORS origin: {}", o);
                    None
                }
            })
            .collect();
        cors.allow_origin(origins)
    }
}

/// Start the server
pub async fn serve_with_config(
    db: Database,
    host: &str,
    port: u16,
    static_dir: Option<&str>,
    config: ServerConfig,
) -> anyhow::Result<()> {
    if config.allowed_origins.iter().any(|o| o == "*") {
        warn!("⚠️  CORS allows any origin - do not expose to network!");
    }

    let app = create_router(db, static_dir, config);
    let addr = format!("{}:{}", host, port);

    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Read and parse a JSON request body
pub(crate) async fn read_json<T: DeserializeOwned>(request: Request) -> Result<T, AppError> {
    let bytes = axum::body::to_bytes(request.into_body(), MAX_BODY_SIZE)
        .await
        .map_err(|_| AppError::bad_request("Invalid request body"))?;
    serde_json::from_slice(&bytes).map_err(|_| AppError::bad_request("Invalid JSON"))
}

// ============================================================================
// Error Handling
// ============================================================================

/// Application error type with proper HTTP status codes
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
    internal: Option<anyhow::Error>,
}

impl AppError {
    pub fn bad_request(msg: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn not_found(msg: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.to_string(),
            internal: None,
        }
    }

    fn rejected(status: StatusCode, message: String) -> Self {
        Self {
            status,
            message,
            internal: None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the full internal error if present
        if let Some(err) = &self.internal {
            error!(error = %err, "Internal error");
        }

        let body = Json(serde_json::json!({
            "error": self.message
        }));

        (self.status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        let err = err.into();

        // Malformed query strings and path segments
        if let Some(rejection) = err.downcast_ref::<QueryRejection>() {
            return Self::rejected(rejection.status(), rejection.body_text());
        }
        if let Some(rejection) = err.downcast_ref::<PathRejection>() {
            return Self::rejected(rejection.status(), rejection.body_text());
        }

        // Caller mistakes reported by the core library keep their message
        match err.downcast_ref::<gastos_core::Error>() {
            Some(gastos_core::Error::NotFound(msg)) => return Self::not_found(msg),
            Some(gastos_core::Error::InvalidData(msg)) => return Self::bad_request(msg),
            _ => {}
        }

        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            // Return generic message to client
            message: "An internal error occurred".to_string(),
            // Keep full error for logging
            internal: Some(err),
        }
    }
}

#[cfg(test)]
mod tests;
