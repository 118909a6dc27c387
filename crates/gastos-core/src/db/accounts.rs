//! Bank account operations

use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::info;

use super::patch::Assignments;
use super::{constraint_error, require_name, require_row, row_exists, Database};
use crate::error::Result;
use crate::models::{AccountsSummary, BankAccount, BankAccountUpdate, NewBankAccount};

const ACCOUNT_COLUMNS: &str =
    "id, name, bank_id, total_balance, savings_balance, transactional_balance, active";

fn account_from_row(row: &Row) -> rusqlite::Result<BankAccount> {
    Ok(BankAccount {
        id: row.get(0)?,
        name: row.get(1)?,
        bank_id: row.get(2)?,
        total_balance: row.get(3)?,
        savings_balance: row.get(4)?,
        transactional_balance: row.get(5)?,
        active: row.get(6)?,
    })
}

/// Load an account on an existing connection (used inside ledger transactions)
pub(crate) fn load_account(conn: &Connection, id: i64) -> rusqlite::Result<Option<BankAccount>> {
    conn.query_row(
        &format!("SELECT {} FROM bank_accounts WHERE id = ?", ACCOUNT_COLUMNS),
        params![id],
        account_from_row,
    )
    .optional()
}

impl Database {
    /// Get a bank account by ID
    pub fn get_bank_account(&self, id: i64) -> Result<Option<BankAccount>> {
        let conn = self.conn()?;
        Ok(load_account(&conn, id)?)
    }

    /// List bank accounts ordered by id, optionally only active or inactive ones
    pub fn list_bank_accounts(&self, active: Option<bool>) -> Result<Vec<BankAccount>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM bank_accounts WHERE (?1 IS NULL OR active = ?1) ORDER BY id",
            ACCOUNT_COLUMNS
        ))?;

        let accounts = stmt
            .query_map(params![active], account_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(accounts)
    }

    /// Open an active account at an existing bank
    pub fn create_bank_account(&self, new: &NewBankAccount) -> Result<BankAccount> {
        require_name(&new.name, "Account")?;

        let conn = self.conn()?;
        require_row(&conn, "banks", new.bank_id, "Bank")?;

        conn.execute(
            "INSERT INTO bank_accounts
                (name, bank_id, total_balance, savings_balance, transactional_balance)
             VALUES (?, ?, ?, ?, ?)",
            params![
                new.name,
                new.bank_id,
                new.opening_total(),
                new.savings_balance,
                new.transactional_balance,
            ],
        )?;

        let id = conn.last_insert_rowid();
        info!(id, name = %new.name, bank_id = new.bank_id, "Created bank account");

        Ok(BankAccount {
            id,
            name: new.name.clone(),
            bank_id: new.bank_id,
            total_balance: new.opening_total(),
            savings_balance: new.savings_balance,
            transactional_balance: new.transactional_balance,
            active: true,
        })
    }

    /// Apply a partial update; returns None when the account does not exist
    ///
    /// Balances may be overwritten directly here. Such edits bypass the
    /// ledger and are not reconciled against incomes or transfers.
    pub fn update_bank_account(
        &self,
        id: i64,
        patch: &BankAccountUpdate,
    ) -> Result<Option<BankAccount>> {
        if let Some(name) = &patch.name {
            require_name(name, "Account")?;
        }

        let conn = self.conn()?;
        if !row_exists(&conn, "bank_accounts", id)? {
            return Ok(None);
        }
        if let Some(bank_id) = patch.bank_id {
            require_row(&conn, "banks", bank_id, "Bank")?;
        }

        let mut set = Assignments::new();
        set.set("name", patch.name.clone())
            .set("bank_id", patch.bank_id)
            .set("total_balance", patch.total_balance)
            .set("savings_balance", patch.savings_balance)
            .set("transactional_balance", patch.transactional_balance)
            .set("active", patch.active);
        set.execute(&conn, "bank_accounts", id)?;

        Ok(load_account(&conn, id)?)
    }

    /// Delete a bank account
    ///
    /// Fails with InvalidData while incomes or transfers reference it.
    pub fn delete_bank_account(&self, id: i64) -> Result<bool> {
        let conn = self.conn()?;
        let rows = conn
            .execute("DELETE FROM bank_accounts WHERE id = ?", params![id])
            .map_err(|e| {
                constraint_error(
                    e,
                    "Account still has incomes or transfers and cannot be deleted",
                )
            })?;
        Ok(rows > 0)
    }

    /// Sum balances across active accounts
    pub fn accounts_summary(&self) -> Result<AccountsSummary> {
        let accounts = self.list_bank_accounts(Some(true))?;

        let (total, savings, transactional) =
            accounts.iter().fold((0.0, 0.0, 0.0), |(t, s, x), a| {
                (
                    t + a.total_balance,
                    s + a.savings_balance,
                    x + a.transactional_balance,
                )
            });

        Ok(AccountsSummary {
            total,
            savings,
            transactional,
            accounts,
        })
    }
}
