//! Expense operations

use rusqlite::{params, Connection, OptionalExtension, Row, ToSql};
use tracing::info;

use super::patch::Assignments;
use super::{date_column, parse_datetime, require_positive, require_row, row_exists, Database};
use crate::error::{Error, Result};
use crate::models::{
    Category, Expense, ExpenseDetail, ExpenseFilter, ExpenseUpdate, NewExpense, Pagination,
    Subcategory, MIN_REPORT_YEAR,
};

/// Expense columns followed by the joined category and subcategory
const DETAIL_SELECT: &str = r#"
    SELECT e.id, e.date, e.amount, e.description, e.category_id, e.subcategory_id,
           e.payment_method_id, e.bank_id, e.created_at,
           c.id, c.name, c.monthly_budget, c.color, c.icon,
           s.id, s.name, s.category_id
    FROM expenses e
    JOIN categories c ON c.id = e.category_id
    LEFT JOIN subcategories s ON s.id = e.subcategory_id
"#;

fn expense_from_row(row: &Row) -> rusqlite::Result<Expense> {
    let created_at: String = row.get(8)?;
    Ok(Expense {
        id: row.get(0)?,
        date: date_column(row, 1)?,
        amount: row.get(2)?,
        description: row.get(3)?,
        category_id: row.get(4)?,
        subcategory_id: row.get(5)?,
        payment_method_id: row.get(6)?,
        bank_id: row.get(7)?,
        created_at: parse_datetime(&created_at),
    })
}

fn detail_from_row(row: &Row) -> rusqlite::Result<ExpenseDetail> {
    let expense = expense_from_row(row)?;

    // The category columns start right after the nine expense columns
    let category = Category {
        id: row.get(9)?,
        name: row.get(10)?,
        monthly_budget: row.get(11)?,
        color: row.get(12)?,
        icon: row.get(13)?,
    };

    let subcategory = match row.get::<_, Option<i64>>(14)? {
        Some(id) => Some(Subcategory {
            id,
            name: row.get(15)?,
            category_id: row.get(16)?,
        }),
        None => None,
    };

    Ok(ExpenseDetail {
        expense,
        category,
        subcategory,
    })
}

/// Check month/year filter values
pub(crate) fn validate_period(month: Option<u32>, year: Option<i32>) -> Result<()> {
    if let Some(m) = month {
        if !(1..=12).contains(&m) {
            return Err(Error::InvalidData(format!(
                "Month must be between 1 and 12, got {}",
                m
            )));
        }
    }
    if let Some(y) = year {
        if y < MIN_REPORT_YEAR {
            return Err(Error::InvalidData(format!(
                "Year must be {} or later, got {}",
                MIN_REPORT_YEAR, y
            )));
        }
    }
    Ok(())
}

/// Verify the optional references of an expense point at existing rows
fn require_expense_refs(
    conn: &Connection,
    subcategory_id: Option<i64>,
    payment_method_id: Option<i64>,
    bank_id: Option<i64>,
) -> Result<()> {
    if let Some(id) = subcategory_id {
        require_row(conn, "subcategories", id, "Subcategory")?;
    }
    if let Some(id) = payment_method_id {
        require_row(conn, "payment_methods", id, "Payment method")?;
    }
    if let Some(id) = bank_id {
        require_row(conn, "banks", id, "Bank")?;
    }
    Ok(())
}

impl Database {
    /// Get an expense by ID
    pub fn get_expense(&self, id: i64) -> Result<Option<Expense>> {
        let conn = self.conn()?;
        let expense = conn
            .query_row(
                "SELECT id, date, amount, description, category_id, subcategory_id,
                        payment_method_id, bank_id, created_at
                 FROM expenses WHERE id = ?",
                params![id],
                expense_from_row,
            )
            .optional()?;
        Ok(expense)
    }

    /// Get an expense with its category and subcategory
    pub fn get_expense_detail(&self, id: i64) -> Result<Option<ExpenseDetail>> {
        let conn = self.conn()?;
        let detail = conn
            .query_row(
                &format!("{} WHERE e.id = ?", DETAIL_SELECT),
                params![id],
                detail_from_row,
            )
            .optional()?;
        Ok(detail)
    }

    /// List expenses newest first, filtered by category and calendar period
    ///
    /// Month and year filter independently: `month` alone matches that month
    /// in every year.
    pub fn list_expenses(
        &self,
        filter: &ExpenseFilter,
        page: Pagination,
    ) -> Result<Vec<ExpenseDetail>> {
        validate_period(filter.month, filter.year)?;

        let mut conditions: Vec<&str> = Vec::new();
        let mut params: Vec<Box<dyn ToSql>> = Vec::new();

        if let Some(category_id) = filter.category_id {
            conditions.push("e.category_id = ?");
            params.push(Box::new(category_id));
        }
        if let Some(month) = filter.month {
            conditions.push("CAST(strftime('%m', e.date) AS INTEGER) = ?");
            params.push(Box::new(month));
        }
        if let Some(year) = filter.year {
            conditions.push("CAST(strftime('%Y', e.date) AS INTEGER) = ?");
            params.push(Box::new(year));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let sql = format!(
            "{} {} ORDER BY e.date DESC, e.id DESC LIMIT ? OFFSET ?",
            DETAIL_SELECT, where_clause
        );
        params.push(Box::new(page.page_size()));
        params.push(Box::new(page.offset()));

        let conn = self.conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let param_refs: Vec<&dyn ToSql> = params.iter().map(|p| p.as_ref()).collect();

        let expenses = stmt
            .query_map(param_refs.as_slice(), detail_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(expenses)
    }

    /// Record an expense
    pub fn create_expense(&self, new: &NewExpense) -> Result<ExpenseDetail> {
        require_positive(new.amount, "Expense")?;

        let id = {
            let conn = self.conn()?;
            require_row(&conn, "categories", new.category_id, "Category")?;
            require_expense_refs(
                &conn,
                new.subcategory_id,
                new.payment_method_id,
                new.bank_id,
            )?;

            conn.execute(
                "INSERT INTO expenses
                    (date, amount, description, category_id, subcategory_id, payment_method_id, bank_id)
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
                params![
                    new.date.to_string(),
                    new.amount,
                    new.description,
                    new.category_id,
                    new.subcategory_id,
                    new.payment_method_id,
                    new.bank_id,
                ],
            )?;
            conn.last_insert_rowid()
        };

        info!(id, amount = new.amount, category_id = new.category_id, "Recorded expense");

        self.get_expense_detail(id)?
            .ok_or_else(|| Error::NotFound(format!("Expense {} not found", id)))
    }

    /// Apply a partial update; returns None when the expense does not exist
    pub fn update_expense(&self, id: i64, patch: &ExpenseUpdate) -> Result<Option<ExpenseDetail>> {
        if let Some(amount) = patch.amount {
            require_positive(amount, "Expense")?;
        }

        {
            let conn = self.conn()?;
            if !row_exists(&conn, "expenses", id)? {
                return Ok(None);
            }
            if let Some(category_id) = patch.category_id {
                require_row(&conn, "categories", category_id, "Category")?;
            }
            require_expense_refs(
                &conn,
                patch.subcategory_id.flatten(),
                patch.payment_method_id.flatten(),
                patch.bank_id.flatten(),
            )?;

            let mut set = Assignments::new();
            set.set("date", patch.date.map(|d| d.to_string()))
                .set("amount", patch.amount)
                .set("description", patch.description.clone())
                .set("category_id", patch.category_id)
                .set_nullable("subcategory_id", patch.subcategory_id)
                .set_nullable("payment_method_id", patch.payment_method_id)
                .set_nullable("bank_id", patch.bank_id);
            set.execute(&conn, "expenses", id)?;
        }

        self.get_expense_detail(id)
    }

    /// Delete an expense
    pub fn delete_expense(&self, id: i64) -> Result<bool> {
        let conn = self.conn()?;
        let rows = conn.execute("DELETE FROM expenses WHERE id = ?", params![id])?;
        Ok(rows > 0)
    }
}
