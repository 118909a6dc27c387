//! CLI command tests
//!
//! This module contains all tests for the CLI commands.

use chrono::{Datelike, NaiveDate, Utc};
use gastos_core::db::Database;
use gastos_core::models::{NewBankAccount, NewExpense};

use crate::commands::{self, resolve_month, truncate};

fn setup_test_db() -> Database {
    let db = Database::in_memory().unwrap();
    db.seed_defaults().unwrap();
    db
}

// ========== Init Command Tests ==========

#[test]
fn test_cmd_init_creates_and_seeds() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gastos.db");

    commands::cmd_init(&path).unwrap();
    assert!(path.exists());

    let db = commands::open_db(&path).unwrap();
    assert!(db.get_category_by_name("Alimentación").unwrap().is_some());
    assert!(db.get_bank_by_name("Nequi").unwrap().is_some());

    // Running init again does not duplicate defaults
    commands::cmd_init(&path).unwrap();
    let banks = db.list_banks(None).unwrap();
    assert_eq!(banks.len(), 5);
}

// ========== Report Command Tests ==========

#[test]
fn test_resolve_month_defaults_to_today() {
    let today = Utc::now().date_naive();
    assert_eq!(resolve_month(None, None), (today.month(), today.year()));
    assert_eq!(resolve_month(Some(2), Some(2023)), (2, 2023));
}

#[test]
fn test_cmd_summary() {
    let db = setup_test_db();
    let food = db.get_category_by_name("Alimentación").unwrap().unwrap();
    db.create_expense(&NewExpense {
        date: NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
        amount: 25.0,
        description: "Pan".into(),
        category_id: food.id,
        subcategory_id: None,
        payment_method_id: None,
        bank_id: None,
    })
    .unwrap();

    assert!(commands::cmd_summary(&db, Some(3), Some(2024)).is_ok());
}

#[test]
fn test_cmd_summary_rejects_invalid_month() {
    let db = setup_test_db();
    assert!(commands::cmd_summary(&db, Some(13), Some(2024)).is_err());
}

#[test]
fn test_cmd_accounts() {
    let db = setup_test_db();
    // Empty list is fine
    assert!(commands::cmd_accounts(&db).is_ok());

    let bank = db.get_bank_by_name("Davivienda").unwrap().unwrap();
    db.create_bank_account(&NewBankAccount {
        name: "Cuenta de ahorros principal".into(),
        bank_id: bank.id,
        total_balance: Some(10.0),
        savings_balance: 4.0,
        transactional_balance: 6.0,
    })
    .unwrap();
    assert!(commands::cmd_accounts(&db).is_ok());
}

// ========== Helper Tests ==========

#[test]
fn test_truncate() {
    assert_eq!(truncate("Hogar", 10), "Hogar");
    assert_eq!(truncate("Entretenimiento", 10), "Entrete...");
    // Multi-byte characters are counted, not sliced
    assert_eq!(truncate("Alimentación y más", 12), "Alimentac...");
}
