//! Server API tests

use super::*;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use gastos_core::db::Database;
use gastos_core::models::{IncomeType, NewBankAccount, NewIncome};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

fn setup_test_app() -> (Router, Database) {
    let db = Database::in_memory().unwrap();
    db.seed_defaults().unwrap();
    let app = create_router(db.clone(), None, ServerConfig::default());
    (app, db)
}

async fn get_body_json(response: axum::response::Response) -> Value {
    let body = response.into_body();
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> axum::response::Response {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.clone().oneshot(request).await.unwrap()
}

fn bank_id(db: &Database, name: &str) -> i64 {
    db.get_bank_by_name(name).unwrap().unwrap().id
}

fn open_account(db: &Database, transactional: f64) -> i64 {
    db.create_bank_account(&NewBankAccount {
        name: "Cuenta".into(),
        bank_id: bank_id(db, "Bancolombia"),
        total_balance: None,
        savings_balance: 0.0,
        transactional_balance: transactional,
    })
    .unwrap()
    .id
}

// ========== General ==========

#[tokio::test]
async fn test_api_info() {
    let (app, _db) = setup_test_app();

    let response = send(&app, "GET", "/api", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["name"], "Gastos API");
    assert_eq!(json["endpoints"]["gastos"], "/gastos");
}

#[tokio::test]
async fn test_malformed_query_and_path_return_json_errors() {
    let (app, _db) = setup_test_app();

    for uri in [
        "/gastos?mes=abc",
        "/resumen?mes=-1&anio=2024",
        "/gastos/abc",
        "/bancos?activo=maybe",
        "/categorias?limit=ten",
    ] {
        let response = send(&app, "GET", uri, None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "application/json",
            "{}",
            uri
        );

        let json = get_body_json(response).await;
        assert!(json["error"].as_str().is_some_and(|m| !m.is_empty()), "{}", uri);
    }
}

#[tokio::test]
async fn test_security_headers() {
    let (app, _db) = setup_test_app();

    let response = send(&app, "GET", "/bancos", None).await;
    let headers = response.headers();
    assert_eq!(headers.get("x-content-type-options").unwrap(), "nosniff");
    assert_eq!(headers.get("x-frame-options").unwrap(), "DENY");
}

#[tokio::test]
async fn test_invalid_json_rejected() {
    let (app, _db) = setup_test_app();

    let request = Request::builder()
        .method("POST")
        .uri("/categorias")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = get_body_json(response).await;
    assert_eq!(json["error"], "Invalid JSON");
}

#[test]
fn test_parse_origins() {
    assert_eq!(
        parse_origins(" http://a.test , ,http://b.test"),
        vec!["http://a.test".to_string(), "http://b.test".to_string()]
    );
    assert!(parse_origins("").is_empty());
}

// ========== Category API Tests ==========

#[tokio::test]
async fn test_list_seeded_categories() {
    let (app, _db) = setup_test_app();

    let response = send(&app, "GET", "/categorias", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    let categories = json.as_array().unwrap();
    assert_eq!(categories.len(), 9);
    assert_eq!(categories[0]["nombre"], "Alimentación");
    assert!(categories[0]["subcategorias"].as_array().unwrap().is_empty());

    let response = send(&app, "GET", "/categorias?skip=2&limit=3", None).await;
    let json = get_body_json(response).await;
    let page = json.as_array().unwrap();
    assert_eq!(page.len(), 3);
    assert_eq!(page[0]["nombre"], "Transporte");
}

#[tokio::test]
async fn test_create_category_defaults_and_duplicate() {
    let (app, _db) = setup_test_app();

    let response = send(&app, "POST", "/categorias", Some(json!({"nombre": "Mascotas"}))).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = get_body_json(response).await;
    assert_eq!(json["color"], "#3B82F6");
    assert_eq!(json["icono"], "💰");
    assert_eq!(json["presupuesto_mensual"], 0.0);

    let response = send(&app, "POST", "/categorias", Some(json!({"nombre": "Mascotas"}))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = get_body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("Mascotas"));
}

#[tokio::test]
async fn test_category_lifecycle() {
    let (app, _db) = setup_test_app();

    let response = send(&app, "POST", "/categorias", Some(json!({"nombre": "Viajes"}))).await;
    let id = get_body_json(response).await["id"].as_i64().unwrap();

    let response = send(
        &app,
        "POST",
        "/subcategorias",
        Some(json!({"nombre": "Hoteles", "categoria_id": id})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let sub_id = get_body_json(response).await["id"].as_i64().unwrap();

    let response = send(
        &app,
        "PUT",
        &format!("/categorias/{}", id),
        Some(json!({"presupuesto_mensual": 300.0})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["nombre"], "Viajes");
    assert_eq!(json["presupuesto_mensual"], 300.0);

    let response = send(&app, "GET", &format!("/categorias/{}", id), None).await;
    let json = get_body_json(response).await;
    assert_eq!(json["subcategorias"][0]["nombre"], "Hoteles");

    let response = send(&app, "DELETE", &format!("/categorias/{}", id), None).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = send(&app, "GET", &format!("/subcategorias/{}", sub_id), None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(&app, "DELETE", &format!("/categorias/{}", id), None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_subcategory_for_missing_category() {
    let (app, _db) = setup_test_app();

    let response = send(
        &app,
        "POST",
        "/subcategorias",
        Some(json!({"nombre": "Huérfana", "categoria_id": 999})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ========== Expense API Tests ==========

#[tokio::test]
async fn test_expense_crud_and_filters() {
    let (app, db) = setup_test_app();
    let food = db.get_category_by_name("Alimentación").unwrap().unwrap();

    let response = send(
        &app,
        "POST",
        "/gastos",
        Some(json!({
            "fecha": "2024-03-15",
            "monto": 45.5,
            "descripcion": "Almuerzo",
            "categoria_id": food.id
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = get_body_json(response).await;
    assert_eq!(created["categoria"]["nombre"], "Alimentación");
    assert!(created["subcategoria"].is_null());
    let id = created["id"].as_i64().unwrap();

    send(
        &app,
        "POST",
        "/gastos",
        Some(json!({
            "fecha": "2024-04-01",
            "monto": 10.0,
            "descripcion": "Café",
            "categoria_id": food.id
        })),
    )
    .await;

    let response = send(&app, "GET", "/gastos?mes=3&anio=2024", None).await;
    let json = get_body_json(response).await;
    let listed = json.as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["descripcion"], "Almuerzo");

    let response = send(
        &app,
        "PUT",
        &format!("/gastos/{}", id),
        Some(json!({"monto": 50.0})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["monto"], 50.0);
    assert_eq!(json["fecha"], "2024-03-15");
    assert_eq!(json["descripcion"], "Almuerzo");

    let response = send(&app, "DELETE", &format!("/gastos/{}", id), None).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = send(&app, "GET", &format!("/gastos/{}", id), None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_expense_unknown_references() {
    let (app, db) = setup_test_app();

    let response = send(
        &app,
        "POST",
        "/gastos",
        Some(json!({
            "fecha": "2024-03-15",
            "monto": 1.0,
            "descripcion": "x",
            "categoria_id": 999
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let food = db.get_category_by_name("Alimentación").unwrap().unwrap();
    let response = send(
        &app,
        "POST",
        "/gastos",
        Some(json!({
            "fecha": "2024-03-15",
            "monto": 1.0,
            "descripcion": "x",
            "categoria_id": food.id,
            "subcategoria_id": 999
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_expense_bad_period_filter() {
    let (app, _db) = setup_test_app();

    let response = send(&app, "GET", "/gastos?mes=13", None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(&app, "GET", "/gastos?anio=1999", None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ========== Summary API Tests ==========

#[tokio::test]
async fn test_monthly_summary() {
    let (app, db) = setup_test_app();
    let food = db.get_category_by_name("Alimentación").unwrap().unwrap();

    send(
        &app,
        "PUT",
        &format!("/categorias/{}", food.id),
        Some(json!({"presupuesto_mensual": 200.0})),
    )
    .await;
    send(
        &app,
        "POST",
        "/gastos",
        Some(json!({
            "fecha": "2024-03-02",
            "monto": 50.0,
            "descripcion": "Mercado",
            "categoria_id": food.id
        })),
    )
    .await;

    let response = send(&app, "GET", "/resumen?mes=3&anio=2024", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["mes"], 3);
    assert_eq!(json["anio"], 2024);

    let line = &json["categorias"][0];
    assert_eq!(line["categoria"], "Alimentación");
    assert_eq!(line["total_gastado"], 50.0);
    assert_eq!(line["diferencia"], 150.0);
    assert_eq!(line["porcentaje_usado"], 25.0);
    assert_eq!(json["categorias"].as_array().unwrap().len(), 9);

    assert_eq!(json["totales"]["presupuesto_total"], 200.0);
    assert_eq!(json["totales"]["gastado_total"], 50.0);
    assert_eq!(json["totales"]["diferencia_total"], 150.0);
}

#[tokio::test]
async fn test_monthly_summary_requires_period() {
    let (app, _db) = setup_test_app();

    let response = send(&app, "GET", "/resumen?mes=3", None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(&app, "GET", "/resumen?mes=0&anio=2024", None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ========== Bank and Payment Method API Tests ==========

#[tokio::test]
async fn test_bank_filters() {
    let (app, db) = setup_test_app();
    let nequi = bank_id(&db, "Nequi");

    let response = send(
        &app,
        "PUT",
        &format!("/bancos/{}", nequi),
        Some(json!({"activo": false})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&app, "GET", "/bancos?activo=true", None).await;
    let json = get_body_json(response).await;
    assert_eq!(json.as_array().unwrap().len(), 4);

    let response = send(&app, "GET", "/bancos?activo=false", None).await;
    let json = get_body_json(response).await;
    assert_eq!(json[0]["nombre"], "Nequi");

    let response = send(&app, "POST", "/bancos", Some(json!({"nombre": "Nequi"}))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_payment_methods() {
    let (app, db) = setup_test_app();
    let bbva = bank_id(&db, "BBVA");

    let response = send(
        &app,
        "POST",
        "/medios-pago",
        Some(json!({"tipo": "Crédito", "nombre": "Visa", "banco_id": bbva})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = get_body_json(response).await;
    assert_eq!(json["tipo"], "Crédito");
    assert_eq!(json["activo"], true);

    let response = send(
        &app,
        "POST",
        "/medios-pago",
        Some(json!({"tipo": "Cheque", "nombre": "x", "banco_id": bbva})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(&app, "GET", &format!("/medios-pago?banco_id={}", bbva), None).await;
    let json = get_body_json(response).await;
    assert_eq!(json.as_array().unwrap().len(), 1);
}

// ========== Account and Ledger API Tests ==========

#[tokio::test]
async fn test_accounts_summary_route() {
    let (app, db) = setup_test_app();
    open_account(&db, 100.0);
    open_account(&db, 20.0);

    let response = send(&app, "GET", "/cuentas-bancarias/resumen", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["total_general"], 120.0);
    assert_eq!(json["total_transaccional"], 120.0);
    assert_eq!(json["total_ahorro"], 0.0);
    assert_eq!(json["cuentas"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_income_credits_and_delete_reverses() {
    let (app, db) = setup_test_app();
    let account = open_account(&db, 0.0);

    let response = send(
        &app,
        "POST",
        "/ingresos",
        Some(json!({
            "nombre": "Prima",
            "monto": 80.0,
            "fecha": "2024-06-30",
            "cuenta_bancaria_id": account,
            "tipo": "ahorro"
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let income_id = get_body_json(response).await["id"].as_i64().unwrap();

    let response = send(&app, "GET", &format!("/cuentas-bancarias/{}", account), None).await;
    let json = get_body_json(response).await;
    assert_eq!(json["saldo_ahorro"], 80.0);
    assert_eq!(json["saldo_total"], 80.0);
    assert_eq!(json["saldo_transaccional"], 0.0);

    let response = send(&app, "DELETE", &format!("/ingresos/{}", income_id), None).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = send(&app, "GET", &format!("/cuentas-bancarias/{}", account), None).await;
    let json = get_body_json(response).await;
    assert_eq!(json["saldo_ahorro"], 0.0);
    assert_eq!(json["saldo_total"], 0.0);
}

#[tokio::test]
async fn test_income_for_missing_account() {
    let (app, _db) = setup_test_app();

    let response = send(
        &app,
        "POST",
        "/ingresos",
        Some(json!({
            "nombre": "Salario",
            "monto": 10.0,
            "fecha": "2024-06-30",
            "cuenta_bancaria_id": 999
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_income_update_route() {
    let (app, db) = setup_test_app();
    let account = open_account(&db, 0.0);
    let income = db
        .create_income(&NewIncome {
            name: "Salario".into(),
            amount: 100.0,
            date: chrono::NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            account_id: account,
            income_type: IncomeType::Transactional,
        })
        .unwrap();

    let response = send(
        &app,
        "PUT",
        &format!("/ingresos/{}", income.id),
        Some(json!({"monto": 150.0})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let balance = db.get_bank_account(account).unwrap().unwrap();
    assert_eq!(balance.transactional_balance, 150.0);
    assert_eq!(balance.total_balance, 150.0);
}

#[tokio::test]
async fn test_transfer_rules() {
    let (app, db) = setup_test_app();
    let from = open_account(&db, 100.0);
    let to = open_account(&db, 0.0);

    // Same account
    let response = send(
        &app,
        "POST",
        "/transferencias",
        Some(json!({
            "cuenta_origen_id": from,
            "cuenta_destino_id": from,
            "monto": 10.0,
            "fecha": "2024-06-01"
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Insufficient funds
    let response = send(
        &app,
        "POST",
        "/transferencias",
        Some(json!({
            "cuenta_origen_id": from,
            "cuenta_destino_id": to,
            "monto": 100.5,
            "fecha": "2024-06-01"
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Missing destination
    let response = send(
        &app,
        "POST",
        "/transferencias",
        Some(json!({
            "cuenta_origen_id": from,
            "cuenta_destino_id": 999,
            "monto": 1.0,
            "fecha": "2024-06-01"
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(
        &app,
        "POST",
        "/transferencias",
        Some(json!({
            "cuenta_origen_id": from,
            "cuenta_destino_id": to,
            "monto": 60.0,
            "fecha": "2024-06-01",
            "descripcion": "Arriendo"
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let transfer = get_body_json(response).await;
    assert_eq!(transfer["descripcion"], "Arriendo");

    let response = send(&app, "GET", "/transferencias", None).await;
    let json = get_body_json(response).await;
    assert_eq!(json.as_array().unwrap().len(), 1);

    let response = send(
        &app,
        "GET",
        &format!("/transferencias/{}", transfer["id"]),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    assert_eq!(
        db.get_bank_account(from).unwrap().unwrap().transactional_balance,
        40.0
    );
    assert_eq!(
        db.get_bank_account(to).unwrap().unwrap().transactional_balance,
        60.0
    );
}

#[tokio::test]
async fn test_ledger_listings_paginate() {
    let (app, db) = setup_test_app();
    let acct = open_account(&db, 0.0);
    for amount in [1.0, 2.0, 3.0] {
        db.create_income(&NewIncome {
            name: "Salario".into(),
            amount,
            date: chrono::NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            account_id: acct,
            income_type: IncomeType::Transactional,
        })
        .unwrap();
    }

    let response = send(&app, "GET", "/ingresos?limit=2", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    let amounts: Vec<f64> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["monto"].as_f64().unwrap())
        .collect();
    assert_eq!(amounts, vec![3.0, 2.0]);

    let response = send(
        &app,
        "GET",
        &format!("/ingresos?cuenta_bancaria_id={}&skip=2&limit=100", acct),
        None,
    )
    .await;
    let json = get_body_json(response).await;
    assert_eq!(json.as_array().unwrap().len(), 1);

    let response = send(&app, "GET", "/transferencias?skip=0&limit=10", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(get_body_json(response).await.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_create_account_derives_total() {
    let (app, db) = setup_test_app();

    let response = send(
        &app,
        "POST",
        "/cuentas-bancarias",
        Some(json!({
            "nombre": "Principal",
            "banco_id": bank_id(&db, "Nequi"),
            "saldo_ahorro": 40.0,
            "saldo_transaccional": 60.0
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = get_body_json(response).await;
    assert_eq!(json["saldo_total"], 100.0);
}

#[tokio::test]
async fn test_delete_account_with_history_rejected() {
    let (app, db) = setup_test_app();
    let from = open_account(&db, 100.0);
    let to = open_account(&db, 0.0);

    send(
        &app,
        "POST",
        "/transferencias",
        Some(json!({
            "cuenta_origen_id": from,
            "cuenta_destino_id": to,
            "monto": 1.0,
            "fecha": "2024-06-01"
        })),
    )
    .await;

    let response = send(&app, "DELETE", &format!("/cuentas-bancarias/{}", to), None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
