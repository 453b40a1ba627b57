//! Operation table and gated dispatch.
//!
//! Operations are registered under their phase-qualified name
//! (`crawl_users`, `parse_users`, `feed_users`) and looked up by the name a
//! descriptor carries. Before a handler runs, the run-mode gate checks the
//! operation's tag against the diagnostics recorded so far.

use std::collections::HashMap;
use std::fmt;

use anyhow::Result;
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::domain::Workspace;

use super::error::PipelineError;
use super::pipeline::Phase;
use super::safety::{OperationTag, RunMode, SkipReason};

/// Named parameters passed to operations and data sources
pub type Params = Map<String, Value>;

/// A local operation: reads and writes the workspace, returns a payload
pub type Handler = Box<dyn Fn(&mut Workspace, &Params) -> Result<Value> + Send + Sync>;

/// A registered operation
pub struct Operation {
    /// Phase-qualified name (e.g. `crawl_users`)
    pub name: String,

    /// Gate marker
    pub tag: OperationTag,

    handler: Handler,
}

impl Operation {
    /// Invoke the handler without consulting the gate
    pub fn call(&self, workspace: &mut Workspace, params: &Params) -> Result<Value> {
        (self.handler)(workspace, params)
    }
}

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operation")
            .field("name", &self.name)
            .field("tag", &self.tag)
            .finish_non_exhaustive()
    }
}

/// Result of a gated invocation
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    /// The handler ran and returned this payload
    Ran(Value),

    /// The gate skipped the handler
    Skipped(SkipReason),
}

/// Closed table of operations, built once before the run starts
#[derive(Debug, Default)]
pub struct Operations {
    operations: HashMap<String, Operation>,
}

impl Operations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an operation with an explicit gate marker
    ///
    /// Registering the same phase and name twice replaces the earlier handler.
    pub fn register<F>(mut self, phase: Phase, name: &str, tag: OperationTag, handler: F) -> Self
    where
        F: Fn(&mut Workspace, &Params) -> Result<Value> + Send + Sync + 'static,
    {
        let qualified = phase.qualify(name);
        self.operations.insert(
            qualified.clone(),
            Operation {
                name: qualified,
                tag,
                handler: Box::new(handler),
            },
        );
        self
    }

    /// Register an untagged crawl operation
    pub fn crawler<F>(self, name: &str, handler: F) -> Self
    where
        F: Fn(&mut Workspace, &Params) -> Result<Value> + Send + Sync + 'static,
    {
        self.register(Phase::Crawl, name, OperationTag::None, handler)
    }

    /// Register an untagged parse operation
    pub fn parser<F>(self, name: &str, handler: F) -> Self
    where
        F: Fn(&mut Workspace, &Params) -> Result<Value> + Send + Sync + 'static,
    {
        self.register(Phase::Parse, name, OperationTag::None, handler)
    }

    /// Register an untagged feed operation
    pub fn feeder<F>(self, name: &str, handler: F) -> Self
    where
        F: Fn(&mut Workspace, &Params) -> Result<Value> + Send + Sync + 'static,
    {
        self.register(Phase::Feed, name, OperationTag::None, handler)
    }

    /// Merge another table into this one; entries of `other` win
    pub fn extend(mut self, other: Operations) -> Self {
        self.operations.extend(other.operations);
        self
    }

    /// Locate the operation a descriptor names in a phase
    pub fn resolve(&self, phase: Phase, name: &str) -> Result<&Operation, PipelineError> {
        let qualified = phase.qualify(name);
        self.operations
            .get(&qualified)
            .ok_or_else(|| PipelineError::UnknownOperation {
                phase,
                name: name.to_string(),
                qualified,
            })
    }

    pub fn contains(&self, phase: Phase, name: &str) -> bool {
        self.operations.contains_key(&phase.qualify(name))
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Resolve an operation, apply the run-mode gate, then invoke it
    pub fn invoke(
        &self,
        phase: Phase,
        name: &str,
        mode: RunMode,
        workspace: &mut Workspace,
        params: &Params,
    ) -> Result<Dispatch> {
        let operation = self.resolve(phase, name)?;

        if let Some(reason) = mode.operation_gate(operation.tag, &workspace.diagnostics) {
            info!("Skipping '{}' process due {}.", operation.name, reason);
            return Ok(Dispatch::Skipped(reason));
        }

        debug!(operation = %operation.name, "Invoking operation");
        operation.call(workspace, params).map(Dispatch::Ran)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn table() -> Operations {
        Operations::new()
            .crawler("users", |_, _| Ok(json!(["alice"])))
            .register(Phase::Feed, "push", OperationTag::Wet, |_, _| Ok(json!("pushed")))
            .register(Phase::Feed, "risky", OperationTag::Unsafe, |_, _| Ok(json!("risky")))
    }

    #[test]
    fn test_resolve_uses_phase_prefix() {
        let operations = table();
        assert_eq!(operations.resolve(Phase::Crawl, "users").unwrap().name, "crawl_users");
        assert!(operations.contains(Phase::Feed, "push"));
        assert!(!operations.contains(Phase::Crawl, "push"));
    }

    #[test]
    fn test_resolve_unknown_operation() {
        let err = table().resolve(Phase::Parse, "users").unwrap_err();
        assert_eq!(
            err,
            PipelineError::UnknownOperation {
                phase: Phase::Parse,
                name: "users".to_string(),
                qualified: "parse_users".to_string(),
            }
        );
    }

    #[test]
    fn test_extend_overrides_same_name() {
        let operations = table().extend(
            Operations::new()
                .feeder("push", |_, _| Ok(json!("custom")))
                .parser("normalize", |_, _| Ok(Value::Null)),
        );
        assert_eq!(operations.len(), 4);
        assert_eq!(operations.resolve(Phase::Feed, "push").unwrap().tag, OperationTag::None);

        let mut workspace = Workspace::new();
        let dispatch = operations
            .invoke(Phase::Feed, "push", RunMode::SafeRun, &mut workspace, &Params::new())
            .unwrap();
        assert_eq!(dispatch, Dispatch::Ran(json!("custom")));
    }

    #[test]
    fn test_invoke_runs_handler() {
        let mut workspace = Workspace::new();
        let dispatch = table()
            .invoke(Phase::Crawl, "users", RunMode::Normal, &mut workspace, &Params::new())
            .unwrap();
        assert_eq!(dispatch, Dispatch::Ran(json!(["alice"])));
    }

    #[test]
    fn test_invoke_skips_wet_in_safe_run() {
        let mut workspace = Workspace::new();
        let operations = table();

        let safe = operations
            .invoke(Phase::Feed, "push", RunMode::SafeRun, &mut workspace, &Params::new())
            .unwrap();
        assert_eq!(safe, Dispatch::Skipped(SkipReason::Wet));

        let normal = operations
            .invoke(Phase::Feed, "push", RunMode::Normal, &mut workspace, &Params::new())
            .unwrap();
        assert_eq!(normal, Dispatch::Ran(json!("pushed")));
    }

    #[test]
    fn test_invoke_skips_unsafe_after_warning() {
        let mut workspace = Workspace::new();
        let operations = table();

        let clean = operations
            .invoke(Phase::Feed, "risky", RunMode::SafeRun, &mut workspace, &Params::new())
            .unwrap();
        assert_eq!(clean, Dispatch::Ran(json!("risky")));

        workspace.diagnostics.add_warning("row 3 has no email");
        let dirty = operations
            .invoke(Phase::Feed, "risky", RunMode::SafeRun, &mut workspace, &Params::new())
            .unwrap();
        assert_eq!(dirty, Dispatch::Skipped(SkipReason::Unsafe));
    }

    #[test]
    fn test_handler_sees_params_and_workspace() {
        let operations = Operations::new().parser("count", |workspace, params| {
            let key = params["into"].as_str().unwrap_or("count").to_string();
            let total = workspace.crawled.len();
            workspace.parsed.insert(key, json!(total))?;
            Ok(Value::Null)
        });

        let mut workspace = Workspace::new();
        workspace.crawled.insert("a", json!(1)).unwrap();
        let mut params = Params::new();
        params.insert("into".to_string(), json!("total"));

        operations
            .invoke(Phase::Parse, "count", RunMode::Normal, &mut workspace, &params)
            .unwrap();
        assert_eq!(workspace.parsed.get("total").unwrap(), &json!(1));
    }
}
