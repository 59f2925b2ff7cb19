//! Target declarations.
//!
//! A target is a named action with ordering constraints:
//!
//! - `depends_on`: pulls the other target into the run and orders it first.
//! - `after`: orders the other target first *only if* it is part of the run.
//! - `requires`: parameters that must be set before anything runs.

use std::fmt;

/// Side effect of a target. Receives the run context.
pub type Action<C> = Box<dyn Fn(&C) -> anyhow::Result<()>>;

/// A parameter requirement, satisfied when any alternative is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    alternatives: Vec<String>,
}

impl Requirement {
    pub fn one(name: &str) -> Self {
        Requirement {
            alternatives: vec![name.to_string()],
        }
    }

    pub fn any_of(names: &[&str]) -> Self {
        Requirement {
            alternatives: names.iter().map(|n| n.to_string()).collect(),
        }
    }

    pub fn alternatives(&self) -> &[String] {
        &self.alternatives
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.alternatives.join(" | "))
    }
}

/// A named target.
pub struct Target<C> {
    name: String,
    description: String,
    depends_on: Vec<String>,
    after: Vec<String>,
    requires: Vec<Requirement>,
    unlisted: bool,
    action: Option<Action<C>>,
}

impl<C> Target<C> {
    pub fn new(name: &str) -> Self {
        Target {
            name: name.to_string(),
            description: String::new(),
            depends_on: Vec::new(),
            after: Vec::new(),
            requires: Vec::new(),
            unlisted: false,
            action: None,
        }
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn depends_on(mut self, target: &str) -> Self {
        if !self.depends_on.iter().any(|t| t == target) {
            self.depends_on.push(target.to_string());
        }
        self
    }

    pub fn after(mut self, target: &str) -> Self {
        if !self.after.iter().any(|t| t == target) {
            self.after.push(target.to_string());
        }
        self
    }

    pub fn requires(mut self, parameter: &str) -> Self {
        self.requires.push(Requirement::one(parameter));
        self
    }

    pub fn requires_any(mut self, parameters: &[&str]) -> Self {
        self.requires.push(Requirement::any_of(parameters));
        self
    }

    /// Hide from `list`; still runnable and usable as a dependency.
    pub fn unlisted(mut self) -> Self {
        self.unlisted = true;
        self
    }

    pub fn executes<F>(mut self, action: F) -> Self
    where
        F: Fn(&C) -> anyhow::Result<()> + 'static,
    {
        self.action = Some(Box::new(action));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get_description(&self) -> &str {
        &self.description
    }

    pub fn get_depends_on(&self) -> &[String] {
        &self.depends_on
    }

    pub fn get_after(&self) -> &[String] {
        &self.after
    }

    pub fn get_requires(&self) -> &[Requirement] {
        &self.requires
    }

    pub fn is_unlisted(&self) -> bool {
        self.unlisted
    }

    pub(crate) fn action(&self) -> Option<&Action<C>> {
        self.action.as_ref()
    }
}

impl<C> fmt::Debug for Target<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Target")
            .field("name", &self.name)
            .field("depends_on", &self.depends_on)
            .field("after", &self.after)
            .field("requires", &self.requires)
            .field("unlisted", &self.unlisted)
            .field("has_action", &self.action.is_some())
            .finish()
    }
}
