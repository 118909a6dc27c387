//! Report command implementations

use anyhow::{Context, Result};
use chrono::{Datelike, Utc};
use gastos_core::db::Database;

use super::truncate;

/// Resolve an optional month/year to a concrete period, defaulting to today
pub fn resolve_month(month: Option<u32>, year: Option<i32>) -> (u32, i32) {
    let today = Utc::now().date_naive();
    (
        month.unwrap_or_else(|| today.month()),
        year.unwrap_or_else(|| today.year()),
    )
}

pub fn cmd_summary(db: &Database, month: Option<u32>, year: Option<i32>) -> Result<()> {
    let (month, year) = resolve_month(month, year);
    let summary = db
        .monthly_summary(month, year)
        .with_context(|| format!("Failed to build summary for {}-{:02}", year, month))?;

    println!();
    println!("📊 Budget for {}-{:02}", year, month);
    println!("   ─────────────────────────────────────────────────────────");
    println!(
        "   {:<20} {:>12} {:>12} {:>12} {:>6}",
        "Category", "Budget", "Spent", "Left", "Used"
    );

    for line in &summary.categories {
        let marker = if line.monthly_budget > 0.0 && line.spent > line.monthly_budget {
            "⚠️ "
        } else {
            "  "
        };
        println!(
            " {}{:<20} {:>12.2} {:>12.2} {:>12.2} {:>5.0}%",
            marker,
            truncate(&line.category, 20),
            line.monthly_budget,
            line.spent,
            line.difference,
            line.percent_used
        );
    }

    println!("   ─────────────────────────────────────────────────────────");
    println!(
        "   {:<20} {:>12.2} {:>12.2} {:>12.2}",
        "Total", summary.totals.budget, summary.totals.spent, summary.totals.difference
    );

    Ok(())
}

pub fn cmd_accounts(db: &Database) -> Result<()> {
    let summary = db.accounts_summary()?;

    if summary.accounts.is_empty() {
        println!("No active bank accounts. Create one with:");
        println!("  POST /cuentas-bancarias");
        return Ok(());
    }

    println!();
    println!("🏦 Bank accounts");
    println!("   ─────────────────────────────────────────────────────────");
    println!(
        "   {:<20} {:>12} {:>12} {:>12}",
        "Account", "Savings", "Available", "Total"
    );

    for account in &summary.accounts {
        println!(
            "   {:<20} {:>12.2} {:>12.2} {:>12.2}",
            truncate(&account.name, 20),
            account.savings_balance,
            account.transactional_balance,
            account.total_balance
        );
    }

    println!("   ─────────────────────────────────────────────────────────");
    println!(
        "   {:<20} {:>12.2} {:>12.2} {:>12.2}",
        "Total", summary.savings, summary.transactional, summary.total
    );

    Ok(())
}
