//! Bank and payment method operations

use rusqlite::{params, OptionalExtension, Row};
use tracing::info;

use super::patch::Assignments;
use super::{constraint_error, require_name, require_row, row_exists, Database};
use crate::error::Result;
use crate::models::{
    Bank, BankUpdate, NewBank, NewPaymentMethod, PaymentMethod, PaymentMethodType,
    PaymentMethodUpdate,
};

fn bank_from_row(row: &Row) -> rusqlite::Result<Bank> {
    Ok(Bank {
        id: row.get(0)?,
        name: row.get(1)?,
        active: row.get(2)?,
    })
}

fn payment_method_from_row(row: &Row) -> rusqlite::Result<PaymentMethod> {
    let type_str: String = row.get(1)?;
    let method_type: PaymentMethodType = type_str.parse().map_err(|e: String| {
        rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, e.into())
    })?;

    Ok(PaymentMethod {
        id: row.get(0)?,
        method_type,
        name: row.get(2)?,
        bank_id: row.get(3)?,
        active: row.get(4)?,
    })
}

fn duplicate_bank(name: &str) -> String {
    format!("A bank named '{}' already exists", name)
}

impl Database {
    // ========== Banks ==========

    /// Get a bank by ID
    pub fn get_bank(&self, id: i64) -> Result<Option<Bank>> {
        let conn = self.conn()?;
        let bank = conn
            .query_row(
                "SELECT id, name, active FROM banks WHERE id = ?",
                params![id],
                bank_from_row,
            )
            .optional()?;
        Ok(bank)
    }

    /// Get a bank by its unique name
    pub fn get_bank_by_name(&self, name: &str) -> Result<Option<Bank>> {
        let conn = self.conn()?;
        let bank = conn
            .query_row(
                "SELECT id, name, active FROM banks WHERE name = ?",
                params![name],
                bank_from_row,
            )
            .optional()?;
        Ok(bank)
    }

    /// List banks ordered by id, optionally only active or inactive ones
    pub fn list_banks(&self, active: Option<bool>) -> Result<Vec<Bank>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, active FROM banks WHERE (?1 IS NULL OR active = ?1) ORDER BY id",
        )?;

        let banks = stmt
            .query_map(params![active], bank_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(banks)
    }

    /// Create an active bank
    pub fn create_bank(&self, new: &NewBank) -> Result<Bank> {
        require_name(&new.name, "Bank")?;

        let conn = self.conn()?;
        conn.execute("INSERT INTO banks (name) VALUES (?)", params![new.name])
            .map_err(|e| constraint_error(e, &duplicate_bank(&new.name)))?;

        let id = conn.last_insert_rowid();
        info!(id, name = %new.name, "Created bank");

        Ok(Bank {
            id,
            name: new.name.clone(),
            active: true,
        })
    }

    /// Apply a partial update; returns None when the bank does not exist
    pub fn update_bank(&self, id: i64, patch: &BankUpdate) -> Result<Option<Bank>> {
        if let Some(name) = &patch.name {
            require_name(name, "Bank")?;
        }

        {
            let conn = self.conn()?;
            if !row_exists(&conn, "banks", id)? {
                return Ok(None);
            }

            let mut set = Assignments::new();
            set.set("name", patch.name.clone())
                .set("active", patch.active);
            set.execute(&conn, "banks", id).map_err(|e| {
                constraint_error(e, &duplicate_bank(patch.name.as_deref().unwrap_or("")))
            })?;
        }

        self.get_bank(id)
    }

    /// Delete a bank
    ///
    /// Fails with InvalidData while accounts or payment methods belong to it.
    pub fn delete_bank(&self, id: i64) -> Result<bool> {
        let conn = self.conn()?;
        let rows = conn
            .execute("DELETE FROM banks WHERE id = ?", params![id])
            .map_err(|e| {
                constraint_error(
                    e,
                    "Bank still has accounts or payment methods and cannot be deleted",
                )
            })?;
        Ok(rows > 0)
    }

    // ========== Payment methods ==========

    /// Get a payment method by ID
    pub fn get_payment_method(&self, id: i64) -> Result<Option<PaymentMethod>> {
        let conn = self.conn()?;
        let method = conn
            .query_row(
                "SELECT id, method_type, name, bank_id, active FROM payment_methods WHERE id = ?",
                params![id],
                payment_method_from_row,
            )
            .optional()?;
        Ok(method)
    }

    /// List payment methods ordered by id
    pub fn list_payment_methods(
        &self,
        bank_id: Option<i64>,
        active: Option<bool>,
    ) -> Result<Vec<PaymentMethod>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, method_type, name, bank_id, active FROM payment_methods
             WHERE (?1 IS NULL OR bank_id = ?1) AND (?2 IS NULL OR active = ?2)
             ORDER BY id",
        )?;

        let methods = stmt
            .query_map(params![bank_id, active], payment_method_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(methods)
    }

    /// Create an active payment method for an existing bank
    pub fn create_payment_method(&self, new: &NewPaymentMethod) -> Result<PaymentMethod> {
        require_name(&new.name, "Payment method")?;

        let conn = self.conn()?;
        require_row(&conn, "banks", new.bank_id, "Bank")?;

        conn.execute(
            "INSERT INTO payment_methods (method_type, name, bank_id) VALUES (?, ?, ?)",
            params![new.method_type.as_str(), new.name, new.bank_id],
        )?;

        Ok(PaymentMethod {
            id: conn.last_insert_rowid(),
            method_type: new.method_type,
            name: new.name.clone(),
            bank_id: new.bank_id,
            active: true,
        })
    }

    /// Apply a partial update; returns None when the payment method does not exist
    pub fn update_payment_method(
        &self,
        id: i64,
        patch: &PaymentMethodUpdate,
    ) -> Result<Option<PaymentMethod>> {
        if let Some(name) = &patch.name {
            require_name(name, "Payment method")?;
        }

        {
            let conn = self.conn()?;
            if !row_exists(&conn, "payment_methods", id)? {
                return Ok(None);
            }
            if let Some(bank_id) = patch.bank_id {
                require_row(&conn, "banks", bank_id, "Bank")?;
            }

            let mut set = Assignments::new();
            set.set("method_type", patch.method_type.map(|t| t.as_str()))
                .set("name", patch.name.clone())
                .set("bank_id", patch.bank_id)
                .set("active", patch.active);
            set.execute(&conn, "payment_methods", id)?;
        }

        self.get_payment_method(id)
    }

    /// Delete a payment method; expenses that used it keep no payment method
    pub fn delete_payment_method(&self, id: i64) -> Result<bool> {
        let conn = self.conn()?;
        let rows = conn.execute("DELETE FROM payment_methods WHERE id = ?", params![id])?;
        Ok(rows > 0)
    }
}
