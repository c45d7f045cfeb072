use crate::error::{Result, StoreError};
use crate::storage::table::Row;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Exact-match column filter carried by a search.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ColumnFilter {
    pub column: String,
    pub value: String,
}

/// A self-contained description of one read or write operation.
///
/// This is the unit of replication: the primary forwards the exact value it
/// applied, and a replica needs nothing but the value itself to replay it.
/// On the wire it is a JSON object tagged by `"action"`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Command {
    CreateDatabase {
        db_name: String,
    },
    CreateTable {
        table_name: String,
        columns: Vec<String>,
    },
    Insert {
        table_name: String,
        row_id: String,
        data: Row,
    },
    /// Returns every row, or only those matching `filter` (search).
    Select {
        table_name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        filter: Option<ColumnFilter>,
    },
    Update {
        table_name: String,
        row_id: String,
        new_data: Row,
    },
    Delete {
        table_name: String,
        row_id: String,
    },
    DropTable {
        table_name: String,
    },
    DropDatabase {
        db_name: String,
    },
}

/// What a successfully applied command hands back to the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutput {
    /// Plain acknowledgment text for writes.
    Ack(String),
    /// Row snapshot for selects and searches.
    Rows(Vec<Row>),
}

impl Command {
    /// Parses a loosely-typed JSON payload into a validated command.
    ///
    /// Unknown action tags and malformed shapes are `InvalidCommand`.
    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        let command: Command = serde_json::from_value(value)
            .map_err(|e| StoreError::InvalidCommand(e.to_string()))?;
        command.validate()?;
        Ok(command)
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            Command::CreateDatabase { db_name } | Command::DropDatabase { db_name } => {
                require_name("database name", db_name)
            }
            Command::CreateTable {
                table_name,
                columns,
            } => {
                require_name("table name", table_name)?;
                if columns.is_empty() {
                    return Err(StoreError::InvalidCommand(
                        "create_table requires at least one column".to_string(),
                    ));
                }
                let mut seen = HashSet::new();
                for column in columns {
                    require_name("column name", column)?;
                    if !seen.insert(column.as_str()) {
                        return Err(StoreError::InvalidCommand(format!(
                            "duplicate column '{}'",
                            column
                        )));
                    }
                }
                Ok(())
            }
            Command::Insert {
                table_name,
                row_id,
                data,
            } => {
                require_name("table name", table_name)?;
                require_row_id(row_id)?;
                require_data("insert", data)
            }
            Command::Update {
                table_name,
                row_id,
                new_data,
            } => {
                require_name("table name", table_name)?;
                require_row_id(row_id)?;
                require_data("update", new_data)
            }
            Command::Select { table_name, filter } => {
                require_name("table name", table_name)?;
                if let Some(filter) = filter {
                    require_name("filter column", &filter.column)?;
                }
                Ok(())
            }
            Command::Delete { table_name, row_id } => {
                require_name("table name", table_name)?;
                require_row_id(row_id)
            }
            Command::DropTable { table_name } => require_name("table name", table_name),
        }
    }

    /// Writes are the commands a primary replicates.
    pub fn is_write(&self) -> bool {
        !matches!(self, Command::Select { .. })
    }

    /// Database-level commands are accepted only on a primary.
    pub fn requires_primary(&self) -> bool {
        matches!(
            self,
            Command::CreateDatabase { .. } | Command::DropDatabase { .. }
        )
    }

    /// The wire tag, for logging.
    pub fn action(&self) -> &'static str {
        match self {
            Command::CreateDatabase { .. } => "create_database",
            Command::CreateTable { .. } => "create_table",
            Command::Insert { .. } => "insert",
            Command::Select { .. } => "select",
            Command::Update { .. } => "update",
            Command::Delete { .. } => "delete",
            Command::DropTable { .. } => "drop_table",
            Command::DropDatabase { .. } => "drop_database",
        }
    }

    /// Acknowledgment text returned to the client after a successful write.
    pub fn acknowledgment(&self) -> String {
        match self {
            Command::CreateDatabase { db_name } => format!("Database {} created", db_name),
            Command::CreateTable { table_name, .. } => {
                format!("Table {} created successfully", table_name)
            }
            Command::Insert { table_name, .. } => format!("Inserted successfully into {}", table_name),
            Command::Select { table_name, .. } => format!("Selected from {}", table_name),
            Command::Update { table_name, .. } => format!("Updated successfully in {}", table_name),
            Command::Delete { table_name, .. } => format!("Row deleted from {}", table_name),
            Command::DropTable { table_name } => format!("Table {} deleted", table_name),
            Command::DropDatabase { db_name } => format!("Database {} dropped", db_name),
        }
    }
}

fn require_name(what: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(StoreError::InvalidCommand(format!("{} must not be empty", what)));
    }
    Ok(())
}

/// Row ids are opaque: only the empty string is rejected.
fn require_row_id(row_id: &str) -> Result<()> {
    if row_id.is_empty() {
        return Err(StoreError::InvalidCommand("row id must not be empty".to_string()));
    }
    Ok(())
}

fn require_data(action: &str, data: &Row) -> Result<()> {
    if data.is_empty() {
        return Err(StoreError::InvalidCommand(format!(
            "{} requires a non-empty data set",
            action
        )));
    }
    Ok(())
}
