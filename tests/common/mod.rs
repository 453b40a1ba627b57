//! Shared fixtures: a recording mock data source and call log.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};

use crawlerfeeder::{Config, DataSource, Operations, Orchestrator, Params, RunMode, SourceKinds};

/// Ordered record of every operation and capability call
#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.entries().iter().filter(|e| e.starts_with(prefix)).count()
    }
}

/// Data source that records calls and answers crawls with its `rows` parameter
pub struct MockSource {
    label: String,
    rows: Value,
    fail: bool,
    log: CallLog,
}

#[async_trait]
impl DataSource for MockSource {
    fn kind(&self) -> &str {
        "mock"
    }

    async fn crawl(&self, params: Params) -> Result<Value> {
        self.log
            .push(format!("{}.crawl {}", self.label, Value::Object(params)));
        if self.fail {
            anyhow::bail!("{} is unreachable", self.label);
        }
        Ok(self.rows.clone())
    }

    async fn feed(&self, params: Params) -> Result<Value> {
        self.log
            .push(format!("{}.feed {}", self.label, Value::Object(params)));
        if self.fail {
            anyhow::bail!("{} is unreachable", self.label);
        }
        Ok(json!({"affected_rows": 1}))
    }
}

/// Source kinds with only the `mock` kind, logging into `log`
pub fn mock_kinds(log: &CallLog) -> SourceKinds {
    let log = log.clone();
    SourceKinds::empty().with_kind("mock", move |params| {
        Ok(Box::new(MockSource {
            label: params
                .get("label")
                .and_then(Value::as_str)
                .unwrap_or("mock")
                .to_string(),
            rows: params.get("rows").cloned().unwrap_or_else(|| json!([])),
            fail: params.get("fail").and_then(Value::as_bool).unwrap_or(false),
            log: log.clone(),
        }) as Box<dyn DataSource>)
    })
}

/// Local operation that logs its call and returns `{ "op": name }`
pub fn logging_op(
    log: &CallLog,
    name: &str,
) -> impl Fn(&mut crawlerfeeder::Workspace, &Params) -> Result<Value> + Send + Sync + 'static {
    let log = log.clone();
    let name = name.to_string();
    move |_, _| {
        log.push(format!("local {}", name));
        Ok(json!({ "op": name }))
    }
}

/// Orchestrator over a YAML configuration with mock sources
pub fn orchestrator(yaml: &str, mode: RunMode, operations: Operations, log: &CallLog) -> Orchestrator {
    let config = Config::from_yaml(yaml).unwrap();
    Orchestrator::new(config, "main", mode, operations)
        .unwrap()
        .with_source_kinds(mock_kinds(log))
}
