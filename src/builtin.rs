//! Built-in operations, so a configuration file alone can drive a pipeline.
//!
//! | Descriptor      | Phase | Tag    | Behaviour |
//! |-----------------|-------|--------|-----------|
//! | `svc.fetch`     | crawl | none   | crawls `svc` with its `fetch` mapping |
//! | `collect`       | parse | none   | copies every crawled entry into the parsed data |
//! | `svc.push`      | feed  | unsafe | feeds `svc` with its `push` mapping plus the rows of `push.from` |
//! | `dump`          | feed  | wet    | prints the parsed data to stdout |
//!
//! ```yaml
//! crawlerfeeder:
//!   sources: db
//!   crawlers: db.fetch
//!   parsers: collect
//!   feeders: db.push
//!
//! db:
//!   kind: sqlite
//!   path: ./users.db
//!   fetch:
//!     query: SELECT id, email FROM users
//!   push:
//!     query: INSERT INTO mailing (id, email) VALUES (?1, ?2)
//!     from: fetch
//!     columns: [id, email]
//! ```

use anyhow::{Context, Result};
use serde_json::Value;

use crate::core::{OperationTag, Operations, Params, Phase};
use crate::domain::Workspace;

/// The built-in operation table
pub fn operations() -> Operations {
    Operations::new()
        .crawler("fetch", fetch)
        .parser("collect", collect)
        .register(Phase::Feed, "push", OperationTag::Unsafe, push)
        .register(Phase::Feed, "dump", OperationTag::Wet, dump)
}

fn section_mapping(params: &Params, key: &str) -> Result<Params> {
    match params.get(key) {
        Some(Value::Object(mapping)) => Ok(mapping.clone()),
        Some(_) => anyhow::bail!("'{}' must be a mapping of parameters", key),
        None => anyhow::bail!("the data source section requires a '{}' mapping", key),
    }
}

/// Crawl parameters are the source section's `fetch` mapping
fn fetch(_workspace: &mut Workspace, params: &Params) -> Result<Value> {
    section_mapping(params, "fetch").map(Value::Object)
}

/// Copy crawled entries into the parsed data, warning about empty ones
fn collect(workspace: &mut Workspace, _params: &Params) -> Result<Value> {
    let entries: Vec<(String, Value)> = workspace
        .crawled
        .iter()
        .map(|(key, value)| (key.to_string(), value.clone()))
        .collect();

    for (key, value) in entries {
        if is_empty(&value) {
            workspace
                .diagnostics
                .add_warning(format!("Crawl step '{}' returned no data", key));
        }
        workspace.parsed.insert(key, value)?;
    }

    Ok(Value::Null)
}

/// Feed parameters: the `push` mapping with `args` taken from parsed rows
fn push(workspace: &mut Workspace, params: &Params) -> Result<Value> {
    let mut request = section_mapping(params, "push")?;

    let from = request
        .remove("from")
        .and_then(|v| v.as_str().map(str::to_string))
        .context("'push' requires a 'from' key naming the parsed data to feed")?;
    let columns: Option<Vec<String>> = request
        .remove("columns")
        .map(serde_json::from_value)
        .transpose()
        .context("'push.columns' must be a list of column names")?;

    let rows = workspace.parsed.get(&from)?;
    let mut missing = Vec::new();
    let args = match (columns, rows) {
        (Some(columns), Value::Array(rows)) => Value::Array(
            rows.iter()
                .enumerate()
                .map(|(idx, row)| {
                    let values = columns.iter().map(|column| match row.get(column) {
                        Some(value) => value.clone(),
                        None => {
                            missing.push(format!(
                                "Row {} of '{}' has no '{}' column; feeding null",
                                idx, from, column
                            ));
                            Value::Null
                        }
                    });
                    Value::Array(values.collect())
                })
                .collect(),
        ),
        (_, rows) => rows.clone(),
    };

    for warning in missing {
        workspace.diagnostics.add_warning(warning);
    }

    request.insert("args".to_string(), args);
    Ok(Value::Object(request))
}

/// Print the parsed data to stdout
fn dump(workspace: &mut Workspace, _params: &Params) -> Result<Value> {
    let json = serde_json::to_string_pretty(&workspace.parsed)
        .context("Failed to serialize parsed data")?;
    println!("{}", json);
    Ok(Value::Null)
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Dispatch, RunMode, SkipReason};
    use serde_json::json;

    fn params(value: Value) -> Params {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn test_fetch_returns_section_mapping() {
        let section = params(json!({"kind": "sqlite", "fetch": {"query": "SELECT 1"}}));
        let value = fetch(&mut Workspace::new(), &section).unwrap();
        assert_eq!(value, json!({"query": "SELECT 1"}));

        assert!(fetch(&mut Workspace::new(), &Params::new()).is_err());
    }

    #[test]
    fn test_collect_warns_on_empty_results() {
        let mut workspace = Workspace::new();
        workspace.crawled.insert("users", json!([{"id": 1}])).unwrap();
        workspace.crawled.insert("orders", json!([])).unwrap();

        collect(&mut workspace, &Params::new()).unwrap();

        assert_eq!(workspace.parsed.get("users").unwrap(), &json!([{"id": 1}]));
        assert_eq!(workspace.parsed.get("orders").unwrap(), &json!([]));
        assert_eq!(
            workspace.diagnostics.warnings(),
            ["Crawl step 'orders' returned no data"]
        );
    }

    #[test]
    fn test_push_projects_columns() {
        let mut workspace = Workspace::new();
        workspace
            .parsed
            .insert("fetch", json!([{"id": 1, "email": "a@x"}, {"id": 2, "email": "b@x"}]))
            .unwrap();

        let section = params(json!({
            "push": {
                "query": "INSERT INTO mailing VALUES (?1, ?2)",
                "from": "fetch",
                "columns": ["id", "email"]
            }
        }));
        let request = push(&mut workspace, &section).unwrap();

        assert_eq!(
            request,
            json!({
                "query": "INSERT INTO mailing VALUES (?1, ?2)",
                "args": [[1, "a@x"], [2, "b@x"]]
            })
        );
    }

    #[test]
    fn test_push_warns_on_missing_column() {
        let mut workspace = Workspace::new();
        workspace
            .parsed
            .insert("fetch", json!([{"id": 1, "email": "a@x"}, {"id": 2}]))
            .unwrap();

        let section = params(json!({
            "push": {"query": "INSERT INTO mailing VALUES (?1, ?2)", "from": "fetch", "columns": ["id", "email"]}
        }));
        let request = push(&mut workspace, &section).unwrap();

        assert_eq!(request["args"], json!([[1, "a@x"], [2, null]]));
        assert_eq!(
            workspace.diagnostics.warnings(),
            ["Row 1 of 'fetch' has no 'email' column; feeding null"]
        );
    }

    #[test]
    fn test_push_requires_parsed_data() {
        let section = params(json!({"push": {"query": "DELETE FROM t", "from": "missing"}}));
        assert!(push(&mut Workspace::new(), &section).is_err());
    }

    #[test]
    fn test_builtin_tags() {
        let table = operations();
        let mut workspace = Workspace::new();

        let dumped = table
            .invoke(Phase::Feed, "dump", RunMode::SafeRun, &mut workspace, &Params::new())
            .unwrap();
        assert_eq!(dumped, Dispatch::Skipped(SkipReason::Wet));

        workspace.diagnostics.add_warning("dirty");
        let pushed = table
            .invoke(Phase::Feed, "push", RunMode::SafeRun, &mut workspace, &Params::new())
            .unwrap();
        assert_eq!(pushed, Dispatch::Skipped(SkipReason::Unsafe));
    }
}
