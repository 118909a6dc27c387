//! Gastos Core Library
//!
//! Shared functionality for the Gastos household finance tracker:
//! - Database access, migrations and default data seeding
//! - Category, expense, bank, payment method and account repositories
//! - Balance ledger for incomes and transfers
//! - Monthly budget vs. actual report

pub mod db;
pub mod error;
pub mod models;

pub use db::Database;
pub use error::{Error, Result};
