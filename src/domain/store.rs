//! Crawled and parsed data stores.
//!
//! Both stores are write-once per key within a run. Payloads are opaque JSON
//! values; the orchestrator never inspects their shape.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::core::{Diagnostics, PipelineError};

/// Keyed, write-once payload store
#[derive(Debug, Clone, PartialEq)]
pub struct DataStore {
    label: &'static str,
    entries: BTreeMap<String, Value>,
}

impl DataStore {
    /// Create an empty store; `label` names it in error messages
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            entries: BTreeMap::new(),
        }
    }

    /// Store a payload; fails if the key was already written this run
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Result<(), PipelineError> {
        let key = key.into();
        if self.entries.contains_key(&key) {
            return Err(PipelineError::KeyExists {
                store: self.label,
                key,
            });
        }
        self.entries.insert(key, value);
        Ok(())
    }

    /// Read a payload; a missing key is fatal for the step asking for it
    pub fn get(&self, key: &str) -> Result<&Value, PipelineError> {
        self.entries.get(key).ok_or_else(|| PipelineError::MissingData {
            store: self.label,
            key: key.to_string(),
        })
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Serialize for DataStore {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.entries.serialize(serializer)
    }
}

/// Mutable run state handed to every operation
#[derive(Debug, Clone, PartialEq)]
pub struct Workspace {
    /// Raw results keyed by crawl operation name
    pub crawled: DataStore,

    /// Derived results keyed by whatever the parse operations choose
    pub parsed: DataStore,

    /// Warnings and errors recorded so far
    pub diagnostics: Diagnostics,
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new()
    }
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            crawled: DataStore::new("crawled"),
            parsed: DataStore::new("parsed"),
            diagnostics: Diagnostics::new(),
        }
    }

    /// Forget everything from a previous run
    pub(crate) fn reset(&mut self) {
        self.crawled.clear();
        self.parsed.clear();
        self.diagnostics.clear();
    }

    /// Write the parsed data (pending changes) as pretty JSON
    pub async fn save_pending(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.parsed)
            .context("Failed to serialize parsed data")?;

        tokio::fs::write(path, json)
            .await
            .with_context(|| format!("Failed to write pending changes: {}", path.display()))
    }
}
