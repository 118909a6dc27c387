//! Income and transfer operations
//!
//! These are the only writes that move cached account balances. Each one
//! runs in a single `BEGIN IMMEDIATE` transaction so the balance check, the
//! row write and the balance update commit together or not at all.

use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{info, warn};

use super::accounts::load_account;
use super::patch::Assignments;
use super::{date_column, parse_datetime, require_name, require_positive, require_row, Database};
use crate::error::{Error, Result};
use crate::models::{
    Income, IncomeType, IncomeUpdate, NewIncome, NewTransfer, Pagination, Transfer,
};

const INCOME_COLUMNS: &str = "id, name, amount, date, account_id, income_type, created_at";
const TRANSFER_COLUMNS: &str =
    "id, origin_account_id, destination_account_id, amount, date, description, created_at";

fn income_from_row(row: &Row) -> rusqlite::Result<Income> {
    let type_str: String = row.get(5)?;
    let income_type: IncomeType = type_str.parse().map_err(|e: String| {
        rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, e.into())
    })?;
    let created_at: String = row.get(6)?;

    Ok(Income {
        id: row.get(0)?,
        name: row.get(1)?,
        amount: row.get(2)?,
        date: date_column(row, 3)?,
        account_id: row.get(4)?,
        income_type,
        created_at: parse_datetime(&created_at),
    })
}

fn transfer_from_row(row: &Row) -> rusqlite::Result<Transfer> {
    let created_at: String = row.get(6)?;
    Ok(Transfer {
        id: row.get(0)?,
        origin_account_id: row.get(1)?,
        destination_account_id: row.get(2)?,
        amount: row.get(3)?,
        date: date_column(row, 4)?,
        description: row.get(5)?,
        created_at: parse_datetime(&created_at),
    })
}

fn load_income(conn: &Connection, id: i64) -> rusqlite::Result<Option<Income>> {
    conn.query_row(
        &format!("SELECT {} FROM incomes WHERE id = ?", INCOME_COLUMNS),
        params![id],
        income_from_row,
    )
    .optional()
}

fn load_transfer(conn: &Connection, id: i64) -> rusqlite::Result<Option<Transfer>> {
    conn.query_row(
        &format!("SELECT {} FROM transfers WHERE id = ?", TRANSFER_COLUMNS),
        params![id],
        transfer_from_row,
    )
    .optional()
}

/// Add `amount` (negative to reverse) to an account's total and to the
/// balance selected by `income_type`
fn credit_account(
    conn: &Connection,
    account_id: i64,
    amount: f64,
    income_type: IncomeType,
) -> Result<()> {
    let (savings, transactional) = match income_type {
        IncomeType::Savings => (amount, 0.0),
        IncomeType::Transactional => (0.0, amount),
    };

    conn.execute(
        "UPDATE bank_accounts
         SET total_balance = total_balance + ?1,
             savings_balance = savings_balance + ?2,
             transactional_balance = transactional_balance + ?3
         WHERE id = ?4",
        params![amount, savings, transactional, account_id],
    )?;
    Ok(())
}

/// Add `amount` (negative to debit) to an account's transactional and total balances
fn shift_transactional(conn: &Connection, account_id: i64, amount: f64) -> Result<()> {
    conn.execute(
        "UPDATE bank_accounts
         SET total_balance = total_balance + ?1,
             transactional_balance = transactional_balance + ?1
         WHERE id = ?2",
        params![amount, account_id],
    )?;
    Ok(())
}

impl Database {
    // ========== Incomes ==========

    /// Get an income by ID
    pub fn get_income(&self, id: i64) -> Result<Option<Income>> {
        let conn = self.conn()?;
        Ok(load_income(&conn, id)?)
    }

    /// List incomes newest first, optionally for one account
    pub fn list_incomes(&self, account_id: Option<i64>, page: Pagination) -> Result<Vec<Income>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM incomes WHERE (?1 IS NULL OR account_id = ?1)
             ORDER BY date DESC, id DESC LIMIT ?2 OFFSET ?3",
            INCOME_COLUMNS
        ))?;

        let incomes = stmt
            .query_map(
                params![account_id, page.page_size(), page.offset()],
                income_from_row,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(incomes)
    }

    /// Record an income and credit its account
    pub fn create_income(&self, new: &NewIncome) -> Result<Income> {
        require_name(&new.name, "Income")?;
        require_positive(new.amount, "Income")?;

        let income = self.write_transaction(|tx| {
            require_row(tx, "bank_accounts", new.account_id, "Bank account")?;

            tx.execute(
                "INSERT INTO incomes (name, amount, date, account_id, income_type)
                 VALUES (?, ?, ?, ?, ?)",
                params![
                    new.name,
                    new.amount,
                    new.date.to_string(),
                    new.account_id,
                    new.income_type.as_str(),
                ],
            )?;
            let id = tx.last_insert_rowid();

            credit_account(tx, new.account_id, new.amount, new.income_type)?;

            load_income(tx, id)?
                .ok_or_else(|| Error::NotFound(format!("Income {} not found", id)))
        })?;

        info!(
            id = income.id,
            account_id = income.account_id,
            amount = income.amount,
            income_type = %income.income_type,
            "Recorded income"
        );
        Ok(income)
    }

    /// Apply a partial update, moving the balance effect to match
    ///
    /// The old row's credit is reversed on its old account and the new row's
    /// credit applied on its (possibly different) account.
    pub fn update_income(&self, id: i64, patch: &IncomeUpdate) -> Result<Option<Income>> {
        if let Some(name) = &patch.name {
            require_name(name, "Income")?;
        }
        if let Some(amount) = patch.amount {
            require_positive(amount, "Income")?;
        }

        let updated = self.write_transaction(|tx| {
            let Some(old) = load_income(tx, id)? else {
                return Ok(None);
            };

            let account_id = patch.account_id.unwrap_or(old.account_id);
            let amount = patch.amount.unwrap_or(old.amount);
            let income_type = patch.income_type.unwrap_or(old.income_type);

            if account_id != old.account_id {
                require_row(tx, "bank_accounts", account_id, "Bank account")?;
            }

            credit_account(tx, old.account_id, -old.amount, old.income_type)?;
            credit_account(tx, account_id, amount, income_type)?;

            let mut set = Assignments::new();
            set.set("name", patch.name.clone())
                .set("amount", patch.amount)
                .set("date", patch.date.map(|d| d.to_string()))
                .set("account_id", patch.account_id)
                .set("income_type", patch.income_type.map(|t| t.as_str()));
            set.execute(tx, "incomes", id)?;

            Ok(load_income(tx, id)?)
        })?;

        if let Some(income) = &updated {
            info!(id, account_id = income.account_id, amount = income.amount, "Updated income");
        }
        Ok(updated)
    }

    /// Delete an income and reverse its credit
    pub fn delete_income(&self, id: i64) -> Result<bool> {
        let deleted = self.write_transaction(|tx| {
            let Some(income) = load_income(tx, id)? else {
                return Ok(None);
            };

            credit_account(tx, income.account_id, -income.amount, income.income_type)?;
            tx.execute("DELETE FROM incomes WHERE id = ?", params![id])?;

            Ok(Some(income))
        })?;

        match deleted {
            Some(income) => {
                info!(
                    id,
                    account_id = income.account_id,
                    amount = income.amount,
                    "Deleted income"
                );
                Ok(true)
            }
            None => Ok(false),
        }
    }

    // ========== Transfers ==========

    /// Get a transfer by ID
    pub fn get_transfer(&self, id: i64) -> Result<Option<Transfer>> {
        let conn = self.conn()?;
        Ok(load_transfer(&conn, id)?)
    }

    /// List transfers newest first
    pub fn list_transfers(&self, page: Pagination) -> Result<Vec<Transfer>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM transfers ORDER BY date DESC, id DESC LIMIT ?1 OFFSET ?2",
            TRANSFER_COLUMNS
        ))?;

        let transfers = stmt
            .query_map(params![page.page_size(), page.offset()], transfer_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(transfers)
    }

    /// Move transactional funds from one account to another
    ///
    /// Rejected without writing anything when the accounts are the same, when
    /// either account is missing, or when the origin's transactional balance
    /// does not cover the amount.
    pub fn create_transfer(&self, new: &NewTransfer) -> Result<Transfer> {
        require_positive(new.amount, "Transfer")?;

        if new.origin_account_id == new.destination_account_id {
            warn!(
                account_id = new.origin_account_id,
                "Rejected transfer to the same account"
            );
            return Err(Error::InvalidData(
                "Origin and destination accounts must be different".into(),
            ));
        }

        let transfer = self.write_transaction(|tx| {
            let origin = load_account(tx, new.origin_account_id)?.ok_or_else(|| {
                Error::NotFound(format!("Bank account {} not found", new.origin_account_id))
            })?;
            require_row(
                tx,
                "bank_accounts",
                new.destination_account_id,
                "Bank account",
            )?;

            if origin.transactional_balance < new.amount {
                warn!(
                    account_id = origin.id,
                    available = origin.transactional_balance,
                    amount = new.amount,
                    "Rejected transfer: insufficient funds"
                );
                return Err(Error::InvalidData(format!(
                    "Insufficient transactional balance in account {}: {:.2} available, {:.2} requested",
                    origin.id, origin.transactional_balance, new.amount
                )));
            }

            tx.execute(
                "INSERT INTO transfers
                    (origin_account_id, destination_account_id, amount, date, description)
                 VALUES (?, ?, ?, ?, ?)",
                params![
                    new.origin_account_id,
                    new.destination_account_id,
                    new.amount,
                    new.date.to_string(),
                    new.description,
                ],
            )?;
            let id = tx.last_insert_rowid();

            shift_transactional(tx, new.origin_account_id, -new.amount)?;
            shift_transactional(tx, new.destination_account_id, new.amount)?;

            load_transfer(tx, id)?
                .ok_or_else(|| Error::NotFound(format!("Transfer {} not found", id)))
        })?;

        info!(
            id = transfer.id,
            from = transfer.origin_account_id,
            to = transfer.destination_account_id,
            amount = transfer.amount,
            "Recorded transfer"
        );
        Ok(transfer)
    }
}
