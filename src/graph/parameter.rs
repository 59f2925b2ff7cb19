//! Named, typed run parameters.
//!
//! Parameters are declared once (name, kind, default, whether secret) and
//! then filled from config files, environment and command line by the
//! caller. Targets only ever see the resulting [`Parameters`] value.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use crate::graph::errors::GraphError;

/// The shape of a parameter value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterKind {
    String,
    List,
    Bool,
    Paths,
}

impl fmt::Display for ParameterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterKind::String => write!(f, "string"),
            ParameterKind::List => write!(f, "list"),
            ParameterKind::Bool => write!(f, "bool"),
            ParameterKind::Paths => write!(f, "path list"),
        }
    }
}

/// A parameter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParameterValue {
    String(String),
    List(Vec<String>),
    Bool(bool),
    Paths(Vec<PathBuf>),
}

impl ParameterValue {
    pub fn kind(&self) -> ParameterKind {
        match self {
            ParameterValue::String(_) => ParameterKind::String,
            ParameterValue::List(_) => ParameterKind::List,
            ParameterValue::Bool(_) => ParameterKind::Bool,
            ParameterValue::Paths(_) => ParameterKind::Paths,
        }
    }

    /// Empty strings and empty lists count as "not supplied".
    pub fn is_present(&self) -> bool {
        match self {
            ParameterValue::String(s) => !s.trim().is_empty(),
            ParameterValue::List(items) => items.iter().any(|s| !s.trim().is_empty()),
            ParameterValue::Bool(_) => true,
            ParameterValue::Paths(paths) => !paths.is_empty(),
        }
    }
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterValue::String(s) => f.write_str(s),
            ParameterValue::List(items) => f.write_str(&items.join(",")),
            ParameterValue::Bool(b) => write!(f, "{}", b),
            ParameterValue::Paths(paths) => {
                let joined: Vec<String> = paths.iter().map(|p| p.display().to_string()).collect();
                f.write_str(&joined.join(","))
            }
        }
    }
}

/// Declaration of a parameter.
#[derive(Debug, Clone)]
pub struct ParameterDef {
    pub name: String,
    pub kind: ParameterKind,
    pub help: String,
    /// Required by every run, regardless of which targets are selected.
    pub required: bool,
    pub default: Option<ParameterValue>,
    /// Never displayed in plans or logs.
    pub secret: bool,
}

impl ParameterDef {
    fn new(name: &str, kind: ParameterKind) -> Self {
        ParameterDef {
            name: name.to_string(),
            kind,
            help: String::new(),
            required: false,
            default: None,
            secret: false,
        }
    }

    pub fn string(name: &str) -> Self {
        Self::new(name, ParameterKind::String)
    }

    pub fn list(name: &str) -> Self {
        Self::new(name, ParameterKind::List)
    }

    /// Boolean flags default to `false`.
    pub fn flag(name: &str) -> Self {
        Self::new(name, ParameterKind::Bool).default_value(ParameterValue::Bool(false))
    }

    pub fn paths(name: &str) -> Self {
        Self::new(name, ParameterKind::Paths)
    }

    pub fn help(mut self, help: &str) -> Self {
        self.help = help.to_string();
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn secret(mut self) -> Self {
        self.secret = true;
        self
    }

    pub fn default_value(mut self, value: ParameterValue) -> Self {
        self.default = Some(value);
        self
    }
}

/// Declared parameters plus the values supplied for this run.
#[derive(Debug, Clone, Default)]
pub struct Parameters {
    defs: BTreeMap<String, ParameterDef>,
    values: BTreeMap<String, ParameterValue>,
}

impl Parameters {
    pub fn new() -> Self {
        Parameters::default()
    }

    /// Create a parameter set from declarations.
    pub fn with_defs(defs: impl IntoIterator<Item = ParameterDef>) -> Self {
        let mut params = Parameters::new();
        for def in defs {
            params.define(def);
        }
        params
    }

    pub fn define(&mut self, def: ParameterDef) {
        self.defs.insert(def.name.clone(), def);
    }

    pub fn defs(&self) -> impl Iterator<Item = &ParameterDef> {
        self.defs.values()
    }

    pub fn def(&self, name: &str) -> Option<&ParameterDef> {
        self.defs.get(name)
    }

    /// Set a value, checking it against the declaration.
    pub fn set(&mut self, name: &str, value: ParameterValue) -> Result<(), GraphError> {
        let def = self.defs.get(name).ok_or_else(|| GraphError::InvalidParameter {
            name: name.to_string(),
            reason: "no such parameter".to_string(),
        })?;

        if def.kind != value.kind() {
            return Err(GraphError::InvalidParameter {
                name: name.to_string(),
                reason: format!("expected a {}, got a {}", def.kind, value.kind()),
            });
        }

        self.values.insert(name.to_string(), value);
        Ok(())
    }

    /// Set a value only if the parameter is not already supplied.
    pub fn set_if_absent(&mut self, name: &str, value: ParameterValue) -> Result<(), GraphError> {
        if self.values.get(name).is_some_and(ParameterValue::is_present) {
            return Ok(());
        }
        self.set(name, value)
    }

    /// The supplied value, or the declared default.
    pub fn get(&self, name: &str) -> Option<&ParameterValue> {
        self.values
            .get(name)
            .or_else(|| self.defs.get(name).and_then(|d| d.default.as_ref()))
    }

    /// Whether the parameter has a non-empty value (supplied or default).
    pub fn is_set(&self, name: &str) -> bool {
        self.get(name).is_some_and(ParameterValue::is_present)
    }

    pub fn string(&self, name: &str) -> Option<&str> {
        match self.get(name) {
            Some(ParameterValue::String(s)) if !s.trim().is_empty() => Some(s.trim()),
            _ => None,
        }
    }

    /// List entries, empty when unset. Blank entries are dropped.
    pub fn list(&self, name: &str) -> Vec<String> {
        match self.get(name) {
            Some(ParameterValue::List(items)) => items
                .iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn flag(&self, name: &str) -> bool {
        matches!(self.get(name), Some(ParameterValue::Bool(true)))
    }

    pub fn paths(&self, name: &str) -> Vec<PathBuf> {
        match self.get(name) {
            Some(ParameterValue::Paths(paths)) => paths.clone(),
            _ => Vec::new(),
        }
    }

    /// Parameters declared `required` that have no value.
    pub fn missing_required(&self) -> Vec<String> {
        self.defs
            .values()
            .filter(|d| d.required && !self.is_set(&d.name))
            .map(|d| d.name.clone())
            .collect()
    }

    /// Value for display, with secrets redacted.
    pub fn display_value(&self, name: &str) -> Option<String> {
        let value = self.get(name)?;
        if self.defs.get(name).is_some_and(|d| d.secret) {
            Some("***".to_string())
        } else {
            Some(value.to_string())
        }
    }
}

impl AsRef<Parameters> for Parameters {
    fn as_ref(&self) -> &Parameters {
        self
    }
}
