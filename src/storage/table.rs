use crate::error::{Result, StoreError};

use std::collections::HashMap;

/// A single row: column name to opaque string value.
pub type Row = HashMap<String, String>;

/// A named table with a required column schema.
///
/// `columns` is the set of keys every inserted row must carry. Updates merge
/// keys into an existing row and may introduce keys outside the schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub name: String,
    pub columns: Vec<String>,
    rows: HashMap<String, Row>,
}

impl Table {
    pub fn new(name: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            name: name.into(),
            columns,
            rows: HashMap::new(),
        }
    }

    /// Stores `data` under `row_id`, overwriting any row already there.
    pub fn insert(&mut self, row_id: String, data: Row) -> Result<()> {
        if let Some(column) = self.columns.iter().find(|c| !data.contains_key(*c)) {
            return Err(StoreError::MissingColumn {
                table: self.name.clone(),
                column: column.clone(),
            });
        }

        self.rows.insert(row_id, data);
        Ok(())
    }

    /// Merges `partial` into the row at `row_id`; untouched keys are kept.
    pub fn update(&mut self, row_id: &str, partial: Row) -> Result<()> {
        let row = self
            .rows
            .get_mut(row_id)
            .ok_or_else(|| StoreError::NotFound(format!("row {} in table {}", row_id, self.name)))?;

        row.extend(partial);
        Ok(())
    }

    pub fn delete_row(&mut self, row_id: &str) -> Result<()> {
        match self.rows.remove(row_id) {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound(format!(
                "row {} in table {}",
                row_id, self.name
            ))),
        }
    }

    pub fn get(&self, row_id: &str) -> Option<&Row> {
        self.rows.get(row_id)
    }

    /// Snapshot of every row. Order is unspecified.
    pub fn get_all(&self) -> Vec<Row> {
        self.rows.values().cloned().collect()
    }

    /// Rows whose `column` is exactly `value`. Rows without the column never match.
    pub fn search_by_column(&self, column: &str, value: &str) -> Vec<Row> {
        self.rows
            .values()
            .filter(|row| row.get(column).is_some_and(|v| v == value))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
