//! Database access layer with connection pooling and migrations
//!
//! This module is organized by domain:
//! - `categories` - Categories and subcategories
//! - `expenses` - Expense CRUD and filtering
//! - `banks` - Banks and payment methods
//! - `accounts` - Bank accounts and the balance summary
//! - `ledger` - Incomes and transfers, which move account balances
//! - `reports` - Monthly budget vs. actual report
//! - `seed` - Default categories and banks

use chrono::{DateTime, NaiveDate, Utc};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use tracing::info;

use crate::error::{Error, Result};

mod accounts;
mod banks;
mod categories;
mod expenses;
mod ledger;
mod patch;
mod reports;
mod seed;

pub use reports::month_range;

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConn = PooledConnection<SqliteConnectionManager>;

/// Parse a SQLite datetime string into a DateTime<Utc>
pub(crate) fn parse_datetime(s: &str) -> DateTime<Utc> {
    // SQLite stores as "YYYY-MM-DD HH:MM:SS" format
    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map(|dt| dt.and_utc())
        .unwrap_or_else(|_| Utc::now())
}

/// Read a `YYYY-MM-DD` column as a NaiveDate
pub(crate) fn date_column(row: &Row, idx: usize) -> rusqlite::Result<NaiveDate> {
    let s: String = row.get(idx)?;
    NaiveDate::parse_from_str(&s, "%Y-%m-%d").map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

/// Translate SQLite constraint violations into validation errors
///
/// Unique and foreign-key violations are caused by the request, not by the
/// store, so they surface as `InvalidData` with a caller-facing message.
pub(crate) fn constraint_error(err: rusqlite::Error, message: &str) -> Error {
    if let rusqlite::Error::SqliteFailure(ref failure, _) = err {
        match failure.extended_code {
            rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
            | rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY
            | rusqlite::ffi::SQLITE_CONSTRAINT_CHECK => {
                return Error::InvalidData(message.to_string());
            }
            _ => {}
        }
    }
    Error::Database(err)
}

/// Whether a row with `id` exists in `table`
pub(crate) fn row_exists(conn: &Connection, table: &str, id: i64) -> Result<bool> {
    let found: Option<i64> = conn
        .query_row(
            &format!("SELECT 1 FROM {} WHERE id = ?", table),
            params![id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

/// Fail with NotFound unless `table` has a row with `id`
pub(crate) fn require_row(conn: &Connection, table: &str, id: i64, what: &str) -> Result<()> {
    if row_exists(conn, table, id)? {
        Ok(())
    } else {
        Err(Error::NotFound(format!("{} {} not found", what, id)))
    }
}

/// Reject blank names
pub(crate) fn require_name(name: &str, what: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::InvalidData(format!("{} name must not be empty", what)));
    }
    Ok(())
}

/// Reject zero, negative and non-finite amounts
pub(crate) fn require_positive(amount: f64, what: &str) -> Result<()> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(Error::InvalidData(format!(
            "{} amount must be greater than 0",
            what
        )));
    }
    Ok(())
}

/// Database wrapper with connection pooling
#[derive(Clone)]
pub struct Database {
    pool: DbPool,
    /// Path to the database file
    db_path: String,
}

impl Database {
    /// Open (creating if needed) the database at `path` and run migrations
    pub fn new(path: &str) -> Result<Self> {
        // Foreign keys are a per-connection setting in SQLite
        let manager = SqliteConnectionManager::file(path).with_init(|conn| {
            conn.execute_batch("PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 5000;")
        });

        let pool = Pool::builder().max_size(10).build(manager)?;

        let db = Self {
            pool,
            db_path: path.to_string(),
        };
        db.run_migrations()?;

        Ok(db)
    }

    /// Get the path to the database file
    pub fn path(&self) -> &str {
        &self.db_path
    }

    /// Create a throwaway database (for testing)
    ///
    /// Note: Uses a temporary file rather than `:memory:` because every pooled
    /// connection to `:memory:` would see its own empty database.
    pub fn in_memory() -> Result<Self> {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);

        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        let path = std::env::temp_dir().join(format!(
            "gastos_test_{}_{}.db",
            std::process::id(),
            id
        ));

        // Remove any existing file
        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{}", path.display(), suffix));
        }

        Self::new(&path.to_string_lossy())
    }

    /// Get a connection from the pool
    pub fn conn(&self) -> Result<DbConn> {
        Ok(self.pool.get()?)
    }

    /// Run `f` inside an IMMEDIATE transaction on a pooled connection
    ///
    /// IMMEDIATE takes the write lock up front, so read-check-write sequences
    /// (balance checks before a transfer) cannot interleave with another
    /// writer. The transaction rolls back when `f` fails or unwinds.
    pub(crate) fn write_transaction<T>(
        &self,
        f: impl FnOnce(&Transaction) -> Result<T>,
    ) -> Result<T> {
        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }

    /// Run database migrations
    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn()?;

        conn.execute_batch(
            r#"
            -- WAL mode: readers don't block the single writer
            PRAGMA journal_mode = WAL;

            -- Synchronous NORMAL: good balance of safety and performance
            PRAGMA synchronous = NORMAL;

            -- Budget categories
            CREATE TABLE IF NOT EXISTS categories (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL UNIQUE,
                monthly_budget REAL NOT NULL DEFAULT 0,
                color TEXT NOT NULL DEFAULT '#3B82F6',
                icon TEXT NOT NULL DEFAULT '💰'
            );

            CREATE TABLE IF NOT EXISTS subcategories (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                category_id INTEGER NOT NULL REFERENCES categories(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_subcategories_category ON subcategories(category_id);

            -- Banks and the payment methods they issue
            CREATE TABLE IF NOT EXISTS banks (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL UNIQUE,
                active BOOLEAN NOT NULL DEFAULT 1
            );

            CREATE TABLE IF NOT EXISTS payment_methods (
                id INTEGER PRIMARY KEY,
                method_type TEXT NOT NULL,               -- Débito, Crédito
                name TEXT NOT NULL,
                bank_id INTEGER NOT NULL REFERENCES banks(id),
                active BOOLEAN NOT NULL DEFAULT 1
            );

            CREATE INDEX IF NOT EXISTS idx_payment_methods_bank ON payment_methods(bank_id);

            -- Bank accounts; balances are a cache maintained by the ledger
            CREATE TABLE IF NOT EXISTS bank_accounts (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                bank_id INTEGER NOT NULL REFERENCES banks(id),
                total_balance REAL NOT NULL DEFAULT 0,
                savings_balance REAL NOT NULL DEFAULT 0,
                transactional_balance REAL NOT NULL DEFAULT 0,
                active BOOLEAN NOT NULL DEFAULT 1
            );

            CREATE INDEX IF NOT EXISTS idx_bank_accounts_bank ON bank_accounts(bank_id);

            CREATE TABLE IF NOT EXISTS incomes (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                amount REAL NOT NULL CHECK (amount > 0),
                date DATE NOT NULL,
                account_id INTEGER NOT NULL REFERENCES bank_accounts(id),
                income_type TEXT NOT NULL DEFAULT 'transaccional',  -- transaccional, ahorro
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_incomes_account ON incomes(account_id);
            CREATE INDEX IF NOT EXISTS idx_incomes_date ON incomes(date);

            CREATE TABLE IF NOT EXISTS transfers (
                id INTEGER PRIMARY KEY,
                origin_account_id INTEGER NOT NULL REFERENCES bank_accounts(id),
                destination_account_id INTEGER NOT NULL REFERENCES bank_accounts(id),
                amount REAL NOT NULL CHECK (amount > 0),
                date DATE NOT NULL,
                description TEXT,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                CHECK (origin_account_id <> destination_account_id)
            );

            CREATE INDEX IF NOT EXISTS idx_transfers_origin ON transfers(origin_account_id);
            CREATE INDEX IF NOT EXISTS idx_transfers_destination ON transfers(destination_account_id);
            CREATE INDEX IF NOT EXISTS idx_transfers_date ON transfers(date);

            -- Expenses
            CREATE TABLE IF NOT EXISTS expenses (
                id INTEGER PRIMARY KEY,
                date DATE NOT NULL,
                amount REAL NOT NULL CHECK (amount > 0),
                description TEXT NOT NULL,
                category_id INTEGER NOT NULL REFERENCES categories(id),
                subcategory_id INTEGER REFERENCES subcategories(id) ON DELETE SET NULL,
                payment_method_id INTEGER REFERENCES payment_methods(id) ON DELETE SET NULL,
                bank_id INTEGER REFERENCES banks(id) ON DELETE SET NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_expenses_date ON expenses(date);
            CREATE INDEX IF NOT EXISTS idx_expenses_category ON expenses(category_id);
            CREATE INDEX IF NOT EXISTS idx_expenses_subcategory ON expenses(subcategory_id);
            "#,
        )?;

        info!("Database schema initialized");
        Ok(())
    }
}
