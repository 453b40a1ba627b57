//! Pipeline configuration.
//!
//! The configuration file is YAML: a mapping of section names to parameter
//! mappings.
//!
//! - `crawlerfeeder` holds the default (`main`) process set
//! - `crawlerfeeder.<name>` holds any other process set
//! - every other section holds the construction parameters of the data
//!   source with the same name
//!
//! ```yaml
//! crawlerfeeder:
//!   sources: db
//!   crawlers: db.fetch_users
//!   parsers: normalize_users
//!   feeders: report
//!
//! db:
//!   kind: sqlite
//!   path: ./users.db
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;

use crate::core::{Params, PipelineError, ProcessSet, ProcessSetSection};

/// Section holding the default process set
pub const ROOT_SECTION: &str = "crawlerfeeder";

/// Name of the default process set
pub const DEFAULT_PROCESS_SET: &str = "main";

/// Parsed configuration file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    sections: BTreeMap<String, Params>,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_yaml(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Parse configuration from YAML content
    pub fn from_yaml(content: &str) -> Result<Self> {
        let sections: BTreeMap<String, Option<Params>> =
            serde_yaml::from_str(content).context("Failed to parse configuration YAML")?;

        Ok(Self {
            sections: sections
                .into_iter()
                .map(|(name, params)| (name, params.unwrap_or_default()))
                .collect(),
        })
    }

    /// Section name a process set lives in
    pub fn process_set_section(name: &str) -> String {
        if name == DEFAULT_PROCESS_SET {
            ROOT_SECTION.to_string()
        } else {
            format!("{}.{}", ROOT_SECTION, name)
        }
    }

    pub fn has_section(&self, name: &str) -> bool {
        self.sections.contains_key(name)
    }

    pub fn section(&self, name: &str) -> Result<&Params, PipelineError> {
        self.sections
            .get(name)
            .ok_or_else(|| PipelineError::MissingSection(name.to_string()))
    }

    /// Names of all process sets defined in the file
    pub fn process_sets(&self) -> Vec<String> {
        let prefix = format!("{}.", ROOT_SECTION);
        self.sections
            .keys()
            .filter_map(|section| {
                if section == ROOT_SECTION {
                    Some(DEFAULT_PROCESS_SET.to_string())
                } else {
                    section.strip_prefix(&prefix).map(str::to_string)
                }
            })
            .collect()
    }

    /// Load and validate a process set by name
    pub fn process_set(&self, name: &str) -> Result<ProcessSet> {
        let section_name = Self::process_set_section(name);
        let section = self
            .sections
            .get(&section_name)
            .ok_or_else(|| PipelineError::UnknownProcessSet {
                name: name.to_string(),
                section: section_name.clone(),
            })?;

        let raw: ProcessSetSection = serde_json::from_value(Value::Object(section.clone()))
            .with_context(|| format!("Invalid process set section '{}'", section_name))?;

        Ok(ProcessSet::from_section(name, &raw)?)
    }

    /// Construction parameters of a data source
    pub fn source_params(&self, source_name: &str) -> Result<&Params, PipelineError> {
        self.section(source_name)
    }
}
