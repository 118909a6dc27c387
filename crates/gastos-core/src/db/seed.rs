//! Default data seeding

use rusqlite::params;
use tracing::info;

use super::Database;
use crate::error::Result;
use crate::models::SeedResult;

/// Default categories: (name, icon, color)
pub const DEFAULT_CATEGORIES: &[(&str, &str, &str)] = &[
    ("Alimentación", "🍔", "#10B981"),
    ("Servicios", "💡", "#3B82F6"),
    ("Transporte", "🚗", "#F59E0B"),
    ("Salud", "❤️", "#EF4444"),
    ("Educación", "📚", "#8B5CF6"),
    ("Entretenimiento", "🎬", "#EC4899"),
    ("Hogar", "🏠", "#06B6D4"),
    ("Impuestos", "📄", "#64748B"),
    ("Otros", "💰", "#9CA3AF"),
];

pub const DEFAULT_BANKS: &[&str] = &[
    "Bancolombia",
    "Nequi",
    "Banco Falabella",
    "Davivienda",
    "BBVA",
];

impl Database {
    /// Insert the default categories and banks that are not present yet
    ///
    /// Matching is by name, so renamed or user-created rows are left alone and
    /// running this repeatedly inserts nothing new.
    pub fn seed_defaults(&self) -> Result<SeedResult> {
        let conn = self.conn()?;
        let mut result = SeedResult::default();

        for (name, icon, color) in DEFAULT_CATEGORIES {
            result.categories_created += conn.execute(
                "INSERT OR IGNORE INTO categories (name, monthly_budget, color, icon)
                 VALUES (?, 0.0, ?, ?)",
                params![name, color, icon],
            )?;
        }

        for name in DEFAULT_BANKS {
            result.banks_created +=
                conn.execute("INSERT OR IGNORE INTO banks (name) VALUES (?)", params![name])?;
        }

        if result.categories_created > 0 || result.banks_created > 0 {
            info!(
                categories = result.categories_created,
                banks = result.banks_created,
                "Seeded default data"
            );
        }

        Ok(result)
    }
}
