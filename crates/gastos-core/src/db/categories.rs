//! Category and subcategory operations

use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::info;

use super::patch::Assignments;
use super::{constraint_error, require_name, require_row, row_exists, Database};
use crate::error::{Error, Result};
use crate::models::{
    Category, CategoryUpdate, CategoryWithSubcategories, NewCategory, NewSubcategory, Pagination,
    Subcategory, SubcategoryUpdate,
};

const CATEGORY_COLUMNS: &str = "id, name, monthly_budget, color, icon";

fn category_from_row(row: &Row) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
        monthly_budget: row.get(2)?,
        color: row.get(3)?,
        icon: row.get(4)?,
    })
}

fn subcategory_from_row(row: &Row) -> rusqlite::Result<Subcategory> {
    Ok(Subcategory {
        id: row.get(0)?,
        name: row.get(1)?,
        category_id: row.get(2)?,
    })
}

fn require_budget(budget: f64) -> Result<()> {
    if !budget.is_finite() || budget < 0.0 {
        return Err(Error::InvalidData(
            "Monthly budget must be zero or positive".into(),
        ));
    }
    Ok(())
}

fn duplicate_category(name: &str) -> String {
    format!("A category named '{}' already exists", name)
}

fn subcategories_of(conn: &Connection, category_id: i64) -> Result<Vec<Subcategory>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, category_id FROM subcategories WHERE category_id = ? ORDER BY id",
    )?;
    let subcategories = stmt
        .query_map(params![category_id], subcategory_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(subcategories)
}

impl Database {
    // ========== Categories ==========

    /// Get a category by ID
    pub fn get_category(&self, id: i64) -> Result<Option<Category>> {
        let conn = self.conn()?;
        let category = conn
            .query_row(
                &format!("SELECT {} FROM categories WHERE id = ?", CATEGORY_COLUMNS),
                params![id],
                category_from_row,
            )
            .optional()?;
        Ok(category)
    }

    /// Get a category by its unique name
    pub fn get_category_by_name(&self, name: &str) -> Result<Option<Category>> {
        let conn = self.conn()?;
        let category = conn
            .query_row(
                &format!("SELECT {} FROM categories WHERE name = ?", CATEGORY_COLUMNS),
                params![name],
                category_from_row,
            )
            .optional()?;
        Ok(category)
    }

    /// Get a category together with its subcategories
    pub fn get_category_with_subcategories(
        &self,
        id: i64,
    ) -> Result<Option<CategoryWithSubcategories>> {
        let Some(category) = self.get_category(id)? else {
            return Ok(None);
        };
        let conn = self.conn()?;
        let subcategories = subcategories_of(&conn, id)?;
        Ok(Some(CategoryWithSubcategories {
            category,
            subcategories,
        }))
    }

    /// List categories ordered by id
    pub fn list_categories(&self, page: Pagination) -> Result<Vec<Category>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM categories ORDER BY id LIMIT ? OFFSET ?",
            CATEGORY_COLUMNS
        ))?;

        let categories = stmt
            .query_map(params![page.page_size(), page.offset()], category_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(categories)
    }

    /// List categories, each with its subcategories
    pub fn list_categories_detailed(
        &self,
        page: Pagination,
    ) -> Result<Vec<CategoryWithSubcategories>> {
        let categories = self.list_categories(page)?;
        let conn = self.conn()?;

        categories
            .into_iter()
            .map(|category| {
                let subcategories = subcategories_of(&conn, category.id)?;
                Ok(CategoryWithSubcategories {
                    category,
                    subcategories,
                })
            })
            .collect()
    }

    /// Create a category
    pub fn create_category(&self, new: &NewCategory) -> Result<Category> {
        require_name(&new.name, "Category")?;
        require_budget(new.monthly_budget)?;

        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO categories (name, monthly_budget, color, icon) VALUES (?, ?, ?, ?)",
            params![new.name, new.monthly_budget, new.color, new.icon],
        )
        .map_err(|e| constraint_error(e, &duplicate_category(&new.name)))?;

        let id = conn.last_insert_rowid();
        info!(id, name = %new.name, "Created category");

        Ok(Category {
            id,
            name: new.name.clone(),
            monthly_budget: new.monthly_budget,
            color: new.color.clone(),
            icon: new.icon.clone(),
        })
    }

    /// Apply a partial update; returns None when the category does not exist
    pub fn update_category(&self, id: i64, patch: &CategoryUpdate) -> Result<Option<Category>> {
        if let Some(name) = &patch.name {
            require_name(name, "Category")?;
        }
        if let Some(budget) = patch.monthly_budget {
            require_budget(budget)?;
        }

        {
            let conn = self.conn()?;
            if !row_exists(&conn, "categories", id)? {
                return Ok(None);
            }

            let mut set = Assignments::new();
            set.set("name", patch.name.clone())
                .set("monthly_budget", patch.monthly_budget)
                .set("color", patch.color.clone())
                .set("icon", patch.icon.clone());

            set.execute(&conn, "categories", id).map_err(|e| {
                constraint_error(e, &duplicate_category(patch.name.as_deref().unwrap_or("")))
            })?;
        }

        self.get_category(id)
    }

    /// Delete a category and its subcategories
    ///
    /// Fails with InvalidData while expenses still reference the category.
    pub fn delete_category(&self, id: i64) -> Result<bool> {
        let conn = self.conn()?;
        let rows = conn
            .execute("DELETE FROM categories WHERE id = ?", params![id])
            .map_err(|e| {
                constraint_error(e, "Category still has expenses and cannot be deleted")
            })?;
        if rows > 0 {
            info!(id, "Deleted category");
        }
        Ok(rows > 0)
    }

    // ========== Subcategories ==========

    /// Get a subcategory by ID
    pub fn get_subcategory(&self, id: i64) -> Result<Option<Subcategory>> {
        let conn = self.conn()?;
        let subcategory = conn
            .query_row(
                "SELECT id, name, category_id FROM subcategories WHERE id = ?",
                params![id],
                subcategory_from_row,
            )
            .optional()?;
        Ok(subcategory)
    }

    /// List subcategories ordered by id, optionally within one category
    pub fn list_subcategories(
        &self,
        category_id: Option<i64>,
        page: Pagination,
    ) -> Result<Vec<Subcategory>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, category_id FROM subcategories
             WHERE (?1 IS NULL OR category_id = ?1)
             ORDER BY id LIMIT ?2 OFFSET ?3",
        )?;

        let subcategories = stmt
            .query_map(
                params![category_id, page.page_size(), page.offset()],
                subcategory_from_row,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(subcategories)
    }

    /// Create a subcategory under an existing category
    pub fn create_subcategory(&self, new: &NewSubcategory) -> Result<Subcategory> {
        require_name(&new.name, "Subcategory")?;

        let conn = self.conn()?;
        require_row(&conn, "categories", new.category_id, "Category")?;

        conn.execute(
            "INSERT INTO subcategories (name, category_id) VALUES (?, ?)",
            params![new.name, new.category_id],
        )?;

        Ok(Subcategory {
            id: conn.last_insert_rowid(),
            name: new.name.clone(),
            category_id: new.category_id,
        })
    }

    /// Apply a partial update; returns None when the subcategory does not exist
    pub fn update_subcategory(
        &self,
        id: i64,
        patch: &SubcategoryUpdate,
    ) -> Result<Option<Subcategory>> {
        if let Some(name) = &patch.name {
            require_name(name, "Subcategory")?;
        }

        {
            let conn = self.conn()?;
            if !row_exists(&conn, "subcategories", id)? {
                return Ok(None);
            }
            if let Some(category_id) = patch.category_id {
                require_row(&conn, "categories", category_id, "Category")?;
            }

            let mut set = Assignments::new();
            set.set("name", patch.name.clone())
                .set("category_id", patch.category_id);
            set.execute(&conn, "subcategories", id)?;
        }

        self.get_subcategory(id)
    }

    /// Delete a subcategory; expenses that referenced it keep no subcategory
    pub fn delete_subcategory(&self, id: i64) -> Result<bool> {
        let conn = self.conn()?;
        let rows = conn.execute("DELETE FROM subcategories WHERE id = ?", params![id])?;
        Ok(rows > 0)
    }
}
