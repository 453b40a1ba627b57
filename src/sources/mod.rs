//! Data sources the pipeline crawls from and feeds into.
//!
//! Every data source implements the two-operation [`DataSource`]
//! capability. Concrete kinds are built from their configuration section
//! through the [`SourceKinds`] factory table.

pub mod analytics;
pub mod sqlite;

use std::collections::HashMap;
use std::fmt;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

use crate::core::{Params, PipelineError};

pub use analytics::AnalyticsDataSource;
pub use sqlite::SqliteDataSource;

/// Configuration key that selects the provider kind of a source
pub const KIND_KEY: &str = "kind";

/// Capability every data source provides
///
/// Results are opaque payloads; the orchestrator stores them without
/// inspecting their shape.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Provider kind (e.g. "sqlite")
    fn kind(&self) -> &str;

    /// Read data described by `params`
    async fn crawl(&self, params: Params) -> Result<Value>;

    /// Write data described by `params`
    async fn feed(&self, params: Params) -> Result<Value>;
}

/// Builds a data source from its configuration parameters
pub type SourceFactory = Box<dyn Fn(&Params) -> Result<Box<dyn DataSource>> + Send + Sync>;

/// Table of known provider kinds
pub struct SourceKinds {
    factories: HashMap<String, SourceFactory>,
}

impl Default for SourceKinds {
    fn default() -> Self {
        Self::builtin()
    }
}

impl fmt::Debug for SourceKinds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        f.debug_struct("SourceKinds").field("kinds", &kinds).finish()
    }
}

impl SourceKinds {
    /// A table without any kind registered
    pub fn empty() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// The kinds shipped with the crate
    pub fn builtin() -> Self {
        Self::empty()
            .with_kind(sqlite::KIND, |params| {
                Ok(Box::new(SqliteDataSource::from_params(params)?) as Box<dyn DataSource>)
            })
            .with_kind(analytics::KIND, |params| {
                Ok(Box::new(AnalyticsDataSource::from_params(params)?) as Box<dyn DataSource>)
            })
    }

    /// Register (or replace) a provider kind
    pub fn with_kind<F>(mut self, kind: &str, factory: F) -> Self
    where
        F: Fn(&Params) -> Result<Box<dyn DataSource>> + Send + Sync + 'static,
    {
        self.factories.insert(kind.to_string(), Box::new(factory));
        self
    }

    /// Kind of a named source: its `kind` parameter, or the name itself
    pub fn kind_of<'a>(source_name: &'a str, params: &'a Params) -> &'a str {
        params
            .get(KIND_KEY)
            .and_then(Value::as_str)
            .unwrap_or(source_name)
    }

    /// Build the named source from its configuration parameters
    pub fn build(&self, source_name: &str, params: &Params) -> Result<Box<dyn DataSource>> {
        let kind = Self::kind_of(source_name, params);
        let factory = self
            .factories
            .get(kind)
            .ok_or_else(|| PipelineError::UnknownSourceKind {
                source_name: source_name.to_string(),
                kind: kind.to_string(),
            })?;
        factory(params)
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.factories.contains_key(kind)
    }
}

/// Fetch a required string parameter
pub(crate) fn required_str<'a>(params: &'a Params, key: &str, kind: &str) -> Result<&'a str> {
    params
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow::anyhow!("{} data source requires a '{}' parameter", kind, key))
}
