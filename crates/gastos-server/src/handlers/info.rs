//! API info handler

use axum::Json;
use serde_json::{json, Value};

/// GET /api - API name, version and main endpoints
pub async fn api_info() -> Json<Value> {
    Json(json!({
        "name": "Gastos API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "categorias": "/categorias",
            "subcategorias": "/subcategorias",
            "gastos": "/gastos",
            "resumen": "/resumen?mes=&anio=",
            "bancos": "/bancos",
            "medios_pago": "/medios-pago",
            "cuentas_bancarias": "/cuentas-bancarias",
            "ingresos": "/ingresos",
            "transferencias": "/transferencias"
        }
    }))
}
