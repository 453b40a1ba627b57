//! Process sets and step descriptors.
//!
//! A process set is the configured bundle of four ordered lists: crawlers,
//! parsers, feeders and data sources. Each step is a descriptor of the form
//! `operation` or `service.operation`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::PipelineError;

/// Separator between the service and the operation in a descriptor
pub const SERVICE_SEPARATOR: char = '.';

/// A phase that dispatches configured steps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Crawl,
    Parse,
    Feed,
}

impl Phase {
    /// Prefix of the handler name an operation resolves to
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Crawl => "crawl_",
            Self::Parse => "parse_",
            Self::Feed => "feed_",
        }
    }

    /// Handler name for an operation in this phase (e.g. `crawl_users`)
    pub fn qualify(self, operation: &str) -> String {
        format!("{}{}", self.prefix(), operation)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Crawl => "crawl",
            Self::Parse => "parse",
            Self::Feed => "feed",
        };
        f.write_str(name)
    }
}

/// A parsed step descriptor
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Descriptor {
    /// Data source the step dispatches to (None targets the orchestrator)
    pub service: Option<String>,

    /// Operation name, without phase prefix
    pub operation: String,
}

impl Descriptor {
    /// Build an unqualified descriptor
    pub fn local(operation: impl Into<String>) -> Self {
        Self {
            service: None,
            operation: operation.into(),
        }
    }

    /// Build a descriptor that targets a data source
    pub fn remote(service: impl Into<String>, operation: impl Into<String>) -> Self {
        Self {
            service: Some(service.into()),
            operation: operation.into(),
        }
    }

    pub fn is_remote(&self) -> bool {
        self.service.is_some()
    }
}

impl FromStr for Descriptor {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = |reason: &str| PipelineError::MalformedDescriptor {
            descriptor: s.to_string(),
            reason: reason.to_string(),
        };

        let parts: Vec<&str> = s.trim().split(SERVICE_SEPARATOR).map(str::trim).collect();
        match parts.as_slice() {
            [operation] if !operation.is_empty() => Ok(Self::local(*operation)),
            [service, operation] if !service.is_empty() && !operation.is_empty() => {
                Ok(Self::remote(*service, *operation))
            }
            [_] | [_, _] => Err(malformed("empty service or operation name")),
            _ => Err(malformed("at most one separator is allowed")),
        }
    }
}

impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.service {
            Some(service) => write!(f, "{}{}{}", service, SERVICE_SEPARATOR, self.operation),
            None => f.write_str(&self.operation),
        }
    }
}

/// A descriptor list as written in configuration
///
/// Supports both YAML formats:
/// - Comma-separated: `crawlers: db.users, db.orders`
/// - Sequence: `crawlers: [db.users, db.orders]`
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum NameList {
    Joined(String),
    Items(Vec<String>),
}

impl Default for NameList {
    fn default() -> Self {
        Self::Items(Vec::new())
    }
}

impl NameList {
    /// Trimmed, non-empty entries in configured order
    pub fn entries(&self) -> Vec<String> {
        let raw: Vec<&str> = match self {
            Self::Joined(joined) => joined.split(',').collect(),
            Self::Items(items) => items.iter().map(String::as_str).collect(),
        };
        raw.into_iter()
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Raw process-set section
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProcessSetSection {
    #[serde(default)]
    pub crawlers: NameList,
    #[serde(default)]
    pub parsers: NameList,
    #[serde(default)]
    pub feeders: NameList,
    #[serde(default)]
    pub sources: NameList,
}

/// A resolved process set with parsed descriptors
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessSet {
    /// Process-set name (`main` for the default set)
    pub name: String,

    /// Crawl steps in execution order
    pub crawlers: Vec<Descriptor>,

    /// Parse steps in execution order
    pub parsers: Vec<Descriptor>,

    /// Feed steps in execution order
    pub feeders: Vec<Descriptor>,

    /// Data-source names to instantiate
    pub sources: Vec<String>,
}

impl ProcessSet {
    /// Build a process set from its configuration section
    pub fn from_section(name: &str, section: &ProcessSetSection) -> Result<Self, PipelineError> {
        let parse = |list: &NameList| -> Result<Vec<Descriptor>, PipelineError> {
            list.entries().iter().map(|entry| entry.parse()).collect()
        };

        let parsers = parse(&section.parsers)?;
        if let Some(remote) = parsers.iter().find(|d| d.is_remote()) {
            return Err(PipelineError::MalformedDescriptor {
                descriptor: remote.to_string(),
                reason: "parse steps cannot target a data source".to_string(),
            });
        }

        Ok(Self {
            name: name.to_string(),
            crawlers: parse(&section.crawlers)?,
            parsers,
            feeders: parse(&section.feeders)?,
            sources: section.sources.entries(),
        })
    }

    /// Steps configured for a phase
    pub fn steps(&self, phase: Phase) -> &[Descriptor] {
        match phase {
            Phase::Crawl => &self.crawlers,
            Phase::Parse => &self.parsers,
            Phase::Feed => &self.feeders,
        }
    }
}
