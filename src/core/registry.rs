//! Instantiated data sources, keyed by logical name.

use std::collections::HashMap;

use crate::sources::DataSource;

use super::error::PipelineError;

/// Data sources created during the instantiate phase
#[derive(Default)]
pub struct SourceRegistry {
    sources: HashMap<String, Box<dyn DataSource>>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a data source under its logical name
    pub fn insert(&mut self, name: impl Into<String>, source: Box<dyn DataSource>) {
        self.sources.insert(name.into(), source);
    }

    /// Look up a data source a descriptor names
    pub fn get(&self, name: &str) -> Result<&dyn DataSource, PipelineError> {
        self.sources
            .get(name)
            .map(|source| &**source)
            .ok_or_else(|| PipelineError::UnknownSource(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.sources.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.sources.clear();
    }
}
