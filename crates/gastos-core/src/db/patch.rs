//! Builder for partial `UPDATE` statements
//!
//! Repositories collect only the fields present in a patch, then run a single
//! `UPDATE <table> SET ... WHERE id = ?`.

use rusqlite::{Connection, ToSql};

/// Column assignments for a partial update
#[derive(Default)]
pub(crate) struct Assignments {
    columns: Vec<&'static str>,
    params: Vec<Box<dyn ToSql>>,
}

impl Assignments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign `column` when `value` is present
    pub fn set<T: ToSql + 'static>(&mut self, column: &'static str, value: Option<T>) -> &mut Self {
        if let Some(v) = value {
            self.columns.push(column);
            self.params.push(Box::new(v));
        }
        self
    }

    /// Assign a nullable `column`: `Some(None)` writes NULL, `None` skips it
    pub fn set_nullable<T: ToSql + 'static>(
        &mut self,
        column: &'static str,
        value: Option<Option<T>>,
    ) -> &mut Self {
        if let Some(v) = value {
            self.columns.push(column);
            self.params.push(Box::new(v));
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Execute against the row `id` of `table`, returning rows changed
    pub fn execute(self, conn: &Connection, table: &str, id: i64) -> rusqlite::Result<usize> {
        if self.is_empty() {
            return Ok(0);
        }

        let set_clause = self
            .columns
            .iter()
            .map(|c| format!("{} = ?", c))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!("UPDATE {} SET {} WHERE id = ?", table, set_clause);

        let mut params = self.params;
        params.push(Box::new(id));
        let param_refs: Vec<&dyn ToSql> = params.iter().map(|p| p.as_ref()).collect();

        conn.execute(&sql, param_refs.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skips_absent_fields() {
        let mut a = Assignments::new();
        a.set::<String>("name", None).set_nullable::<i64>("bank_id", None);
        assert!(a.is_empty());

        a.set_nullable::<i64>("bank_id", Some(None));
        assert!(!a.is_empty());
    }

    #[test]
    fn test_execute_updates_only_given_columns() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT, ref_id INTEGER);
             INSERT INTO t (id, name, ref_id) VALUES (1, 'old', 7);",
        )
        .unwrap();

        let mut a = Assignments::new();
        a.set_nullable::<i64>("ref_id", Some(None));
        assert_eq!(a.execute(&conn, "t", 1).unwrap(), 1);

        let (name, ref_id): (String, Option<i64>) = conn
            .query_row("SELECT name, ref_id FROM t WHERE id = 1", [], |r| {
                Ok((r.get(0)?, r.get(1)?))
            })
            .unwrap();
        assert_eq!(name, "old");
        assert_eq!(ref_id, None);
    }
}
