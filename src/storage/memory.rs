use super::table::Table;
use crate::error::{Result, StoreError};

use std::collections::{HashMap, HashSet};

/// The in-memory database owned by one node.
///
/// Holds every table by name plus the registry of database names created
/// through `create_database`. There is a single table namespace per node:
/// tables are not scoped to a database. Nothing here is synchronized; the
/// owning `NodeCoordinator` serializes access.
#[derive(Debug, Default)]
pub struct TableStore {
    tables: HashMap<String, Table>,
    databases: HashSet<String>,
}

impl TableStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_table(&mut self, name: &str, columns: Vec<String>) -> Result<()> {
        if self.tables.contains_key(name) {
            return Err(StoreError::AlreadyExists(format!("table {}", name)));
        }

        self.tables
            .insert(name.to_string(), Table::new(name, columns));
        Ok(())
    }

    pub fn delete_table(&mut self, name: &str) -> Result<()> {
        match self.tables.remove(name) {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound(format!("table {}", name))),
        }
    }

    pub fn table(&self, name: &str) -> Result<&Table> {
        self.tables
            .get(name)
            .ok_or_else(|| StoreError::NotFound(format!("table {}", name)))
    }

    pub fn table_mut(&mut self, name: &str) -> Result<&mut Table> {
        self.tables
            .get_mut(name)
            .ok_or_else(|| StoreError::NotFound(format!("table {}", name)))
    }

    pub fn create_database(&mut self, name: &str) -> Result<()> {
        if !self.databases.insert(name.to_string()) {
            return Err(StoreError::AlreadyExists(format!("database {}", name)));
        }
        Ok(())
    }

    /// Unregisters `name` and drops every table in the store.
    ///
    /// Returns the number of tables that were dropped.
    pub fn drop_database(&mut self, name: &str) -> Result<usize> {
        if !self.databases.remove(name) {
            return Err(StoreError::NotFound(format!("database {}", name)));
        }

        let dropped = self.tables.len();
        self.tables.clear();
        Ok(dropped)
    }

    /// Table names, sorted.
    pub fn table_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tables.keys().cloned().collect();
        names.sort();
        names
    }

    /// Database names, sorted.
    pub fn database_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.databases.iter().cloned().collect();
        names.sort();
        names
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }
}
