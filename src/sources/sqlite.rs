//! Relational-database data source backed by SQLite.
//!
//! - `crawl { query, args? }` returns the result rows as JSON objects
//! - `feed { query, args? }` executes the statement once, or once per row
//!   when `args` is an array of arrays (possibly empty), and returns
//!   `{ affected_rows }`

use std::sync::Mutex;

use anyhow::{Context, Result};
use async_trait::async_trait;
use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{params_from_iter, Connection};
use serde_json::{json, Map, Number, Value};
use tracing::info;

use super::{required_str, DataSource};
use crate::core::Params;

/// Provider kind name
pub const KIND: &str = "sqlite";

/// SQLite data source
pub struct SqliteDataSource {
    conn: Mutex<Connection>,
}

impl SqliteDataSource {
    /// Open the database at `path` (":memory:" for an in-memory database)
    pub fn open(path: &str) -> Result<Self> {
        let conn = if path == ":memory:" {
            Connection::open_in_memory()
        } else {
            Connection::open(path)
        }
        .with_context(|| format!("Failed to open SQLite database: {}", path))?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Build from a configuration section (`path`)
    pub fn from_params(params: &Params) -> Result<Self> {
        Self::open(required_str(params, "path", KIND)?)
    }

    fn connection(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow::anyhow!("SQLite connection lock poisoned"))
    }
}

#[async_trait]
impl DataSource for SqliteDataSource {
    fn kind(&self) -> &str {
        KIND
    }

    async fn crawl(&self, params: Params) -> Result<Value> {
        let query = required_str(&params, "query", KIND)?;
        let args = bind_args(params.get("args"))?;

        let conn = self.connection()?;
        let mut stmt = conn
            .prepare(query)
            .with_context(|| format!("Failed to prepare query: {}", query))?;

        let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();
        let mut rows = stmt
            .query(params_from_iter(args))
            .with_context(|| format!("Failed to execute query: {}", query))?;

        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            let mut record = Map::new();
            for (idx, column) in columns.iter().enumerate() {
                record.insert(column.clone(), to_json(row.get_ref(idx)?));
            }
            records.push(Value::Object(record));
        }

        info!("Affected rows: {}", records.len());
        Ok(Value::Array(records))
    }

    async fn feed(&self, params: Params) -> Result<Value> {
        let query = required_str(&params, "query", KIND)?;
        let conn = self.connection()?;

        let affected = match params.get("args") {
            // An empty row list executes nothing
            Some(Value::Array(rows)) if rows.iter().all(Value::is_array) => {
                let mut stmt = conn
                    .prepare(query)
                    .with_context(|| format!("Failed to prepare statement: {}", query))?;
                let mut total = 0;
                for row in rows {
                    total += stmt
                        .execute(params_from_iter(bind_args(Some(row))?))
                        .with_context(|| format!("Failed to execute statement: {}", query))?;
                }
                total
            }
            args => conn
                .execute(query, params_from_iter(bind_args(args)?))
                .with_context(|| format!("Failed to execute statement: {}", query))?,
        };

        info!("Affected rows: {}", affected);
        Ok(json!({ "affected_rows": affected }))
    }
}

/// Convert JSON arguments into SQLite bind values
fn bind_args(args: Option<&Value>) -> Result<Vec<SqlValue>> {
    let values = match args {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(values)) => values.iter().collect::<Vec<_>>(),
        Some(single) => vec![single],
    };

    values
        .into_iter()
        .map(|value| match value {
            Value::Null => Ok(SqlValue::Null),
            Value::Bool(b) => Ok(SqlValue::Integer(i64::from(*b))),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Ok(SqlValue::Integer(i)),
                None => n
                    .as_f64()
                    .map(SqlValue::Real)
                    .context("Numeric argument out of range"),
            },
            Value::String(s) => Ok(SqlValue::Text(s.clone())),
            other => anyhow::bail!("Unsupported SQL argument: {}", other),
        })
        .collect()
}

fn to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
        ValueRef::Text(t) => Value::String(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::Array(b.iter().map(|byte| Value::from(*byte)).collect()),
    }
}
