//! Checks shared by every configuration node.

use std::fmt;
use std::sync::{LazyLock, Mutex};

use regex::Regex;
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::tree::middleware::Middleware;
use crate::tree::parameter::Parameter;

/// Accepted `root` / `path` values.
static PATH_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z0-9_/:-]{3,}|/)$").expect("path pattern is valid"));

/// Node kinds, used to name the offender in warnings and errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Root,
    Route,
    Method,
    Parameter,
    Import,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NodeKind::Root => "Root",
            NodeKind::Route => "Route",
            NodeKind::Method => "RouteMethod",
            NodeKind::Parameter => "Parameter",
            NodeKind::Import => "Import",
        })
    }
}

/// Receives non-fatal findings raised while compiling the tree.
pub trait Diagnostics: Send + Sync {
    fn unused_key(&self, kind: NodeKind, name: &str, key: &str);
}

/// Emits findings as `tracing` warnings.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn unused_key(&self, kind: NodeKind, name: &str, key: &str) {
        tracing::warn!(node = %kind, element = name, key = key, "Unused configuration key");
    }
}

/// Records findings in memory.
#[derive(Debug, Default)]
pub struct CollectingDiagnostics {
    warnings: Mutex<Vec<String>>,
}

impl CollectingDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Warnings as `Kind "name": unused key "key"`, in emission order.
    pub fn warnings(&self) -> Vec<String> {
        self.warnings
            .lock()
            .map(|w| w.clone())
            .unwrap_or_default()
    }
}

impl Diagnostics for CollectingDiagnostics {
    fn unused_key(&self, kind: NodeKind, name: &str, key: &str) {
        if let Ok(mut warnings) = self.warnings.lock() {
            warnings.push(format!("{kind} \"{name}\": unused key \"{key}\""));
        }
    }
}

/// Reject absent or null node configuration.
pub(crate) fn require_config<'a>(
    kind: NodeKind,
    name: &str,
    config: Option<&'a Value>,
) -> Result<&'a Value> {
    match config {
        None | Some(Value::Null) => Err(Error::ConfigurationMissing(format!("{kind} \"{name}\""))),
        Some(value) => Ok(value),
    }
}

/// Require a mapping-shaped node configuration.
pub(crate) fn require_mapping<'a>(
    kind: NodeKind,
    name: &str,
    config: Option<&'a Value>,
) -> Result<&'a Map<String, Value>> {
    match require_config(kind, name, config)? {
        Value::Object(map) => Ok(map),
        other => Err(Error::invalid(format!(
            "{kind} \"{name}\" configuration must be a mapping, got {}",
            type_name(other)
        ))),
    }
}

/// Warn once per key outside `recognized`.
pub(crate) fn warn_unused_keys(
    diagnostics: &dyn Diagnostics,
    kind: NodeKind,
    name: &str,
    config: &Map<String, Value>,
    recognized: &[&str],
) {
    config
        .keys()
        .filter(|key| !recognized.contains(&key.as_str()))
        .for_each(|key| diagnostics.unused_key(kind, name, key));
}

/// Validate a `root` or `path` value.
pub(crate) fn parse_path(
    kind: NodeKind,
    name: &str,
    field: &str,
    value: Option<&Value>,
) -> Result<String> {
    match value {
        Some(Value::String(path)) if PATH_PATTERN.is_match(path) => Ok(path.clone()),
        Some(Value::String(path)) => Err(Error::invalid(format!(
            "{kind} \"{name}\": {field} \"{path}\" is not a valid path"
        ))),
        Some(other) => Err(Error::invalid(format!(
            "{kind} \"{name}\": {field} must be a string, got {}",
            type_name(other)
        ))),
        None => Err(Error::invalid(format!("{kind} \"{name}\": {field} is required"))),
    }
}

/// Parse `pre_middlewares` or `post_middlewares`: absent or null is empty.
pub(crate) fn parse_middlewares(
    kind: NodeKind,
    name: &str,
    field: &str,
    value: Option<&Value>,
) -> Result<Vec<Middleware>> {
    match value {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                Middleware::new(item).map_err(|_| {
                    Error::invalid(format!(
                        "{kind} \"{name}\": {field} must only contain non-empty strings"
                    ))
                })
            })
            .collect(),
        Some(other) => Err(Error::invalid(format!(
            "{kind} \"{name}\": {field} must be a list, got {}",
            type_name(other)
        ))),
    }
}

/// Parse a parameter declaration map: absent or null declares nothing.
pub(crate) fn parse_params(
    kind: NodeKind,
    name: &str,
    field: &str,
    value: Option<&Value>,
    diagnostics: &dyn Diagnostics,
) -> Result<Vec<Parameter>> {
    match value {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Object(decls)) => decls
            .iter()
            .map(|(param, decl)| Parameter::new(param, decl, diagnostics))
            .collect(),
        Some(other) => Err(Error::invalid(format!(
            "{kind} \"{name}\": {field} must be a mapping, got {}",
            type_name(other)
        ))),
    }
}

/// Inherited parameters followed by local ones; a local name may not shadow an inherited one.
pub(crate) fn merge_params(
    kind: NodeKind,
    name: &str,
    inherited: &[Parameter],
    local: Vec<Parameter>,
) -> Result<Vec<Parameter>> {
    let mut merged = inherited.to_vec();
    for param in local {
        if merged.iter().any(|p| p.name() == param.name()) {
            return Err(Error::invalid(format!(
                "{kind} \"{name}\": parameter \"{}\" is already declared by an enclosing element",
                param.name()
            )));
        }
        merged.push(param);
    }
    Ok(merged)
}

pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a mapping",
    }
}

/// Prefix every line of `text` with two spaces.
pub(crate) fn indent(text: &str) -> String {
    text.lines()
        .map(|line| format!("  {line}"))
        .collect::<Vec<_>>()
        .join("\n")
}
