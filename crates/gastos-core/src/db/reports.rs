//! Monthly budget vs. actual report

use chrono::NaiveDate;
use rusqlite::params;

use super::expenses::validate_period;
use super::Database;
use crate::error::{Error, Result};
use crate::models::{BudgetTotals, CategoryBudgetLine, MonthlySummary};

/// Half-open date range `[first day of month, first day of next month)`
pub fn month_range(month: u32, year: i32) -> Result<(NaiveDate, NaiveDate)> {
    validate_period(Some(month), Some(year))?;

    let invalid = || Error::InvalidData(format!("Invalid period {}-{:02}", year, month));
    let start = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
    let end = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .ok_or_else(invalid)?;

    Ok((start, end))
}

/// Percentage of `budget` consumed by `spent`; 0 when there is no budget
fn percent_used(spent: f64, budget: f64) -> f64 {
    if budget > 0.0 {
        spent / budget * 100.0
    } else {
        0.0
    }
}

/// Compute per-category lines and totals from (id, name, budget, spent, color) rows
fn summarize(
    month: u32,
    year: i32,
    rows: Vec<(i64, String, f64, f64, String)>,
) -> MonthlySummary {
    let categories: Vec<CategoryBudgetLine> = rows
        .into_iter()
        .map(|(category_id, category, monthly_budget, spent, color)| CategoryBudgetLine {
            category_id,
            category,
            monthly_budget,
            spent,
            difference: monthly_budget - spent,
            percent_used: percent_used(spent, monthly_budget),
            color,
        })
        .collect();

    let budget: f64 = categories.iter().map(|c| c.monthly_budget).sum();
    let spent: f64 = categories.iter().map(|c| c.spent).sum();

    MonthlySummary {
        month,
        year,
        categories,
        totals: BudgetTotals {
            budget,
            spent,
            difference: budget - spent,
        },
    }
}

impl Database {
    /// Budget vs. spending for every category in one calendar month
    ///
    /// Categories without expenses in the month are listed with zero spent.
    pub fn monthly_summary(&self, month: u32, year: i32) -> Result<MonthlySummary> {
        let (start, end) = month_range(month, year)?;

        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT c.id, c.name, c.monthly_budget, COALESCE(s.spent, 0.0), c.color
            FROM categories c
            LEFT JOIN (
                SELECT category_id, SUM(amount) AS spent
                FROM expenses
                WHERE date >= ?1 AND date < ?2
                GROUP BY category_id
            ) s ON s.category_id = c.id
            ORDER BY c.id
            "#,
        )?;

        let rows = stmt
            .query_map(params![start.to_string(), end.to_string()], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(summarize(month, year, rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_range_rolls_over_december() {
        let (start, end) = month_range(12, 2024).unwrap();
        assert_eq!(start, NaiveDate::from_ymd_opt(2024, 12, 1).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
    }

    #[test]
    fn test_month_range_rejects_out_of_range() {
        assert!(month_range(0, 2024).unwrap_err().is_invalid());
        assert!(month_range(13, 2024).unwrap_err().is_invalid());
        assert!(month_range(5, 1999).unwrap_err().is_invalid());
    }

    #[test]
    fn test_summarize_budget_lines() {
        let summary = summarize(
            3,
            2024,
            vec![
                (1, "A".into(), 100.0, 0.0, "#000".into()),
                (2, "B".into(), 200.0, 50.0, "#fff".into()),
                (3, "C".into(), 0.0, 20.0, "#abc".into()),
            ],
        );

        let a = &summary.categories[0];
        assert_eq!(a.difference, 100.0);
        assert_eq!(a.percent_used, 0.0);

        let b = &summary.categories[1];
        assert_eq!(b.difference, 150.0);
        assert_eq!(b.percent_used, 25.0);

        // No budget: overspent, but percentage stays 0
        let c = &summary.categories[2];
        assert_eq!(c.difference, -20.0);
        assert_eq!(c.percent_used, 0.0);

        assert_eq!(summary.totals.budget, 300.0);
        assert_eq!(summary.totals.spent, 70.0);
        assert_eq!(summary.totals.difference, 230.0);
    }
}
