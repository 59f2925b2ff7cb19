//! Target graph errors and diagnostics.

use std::fmt;

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

use crate::util::diagnostic::{suggestions, Diagnostic};

/// A requirement of a target that has no value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingParameter {
    pub target: String,
    /// Alternatives, any of which would satisfy the requirement.
    pub parameters: Vec<String>,
}

impl fmt::Display for MissingParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "`{}` (required by `{}`)", self.parameters.join(" | "), self.target)
    }
}

fn list_missing(missing: &[MissingParameter]) -> String {
    missing
        .iter()
        .map(|m| m.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Errors raised while declaring, planning or running targets.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum GraphError {
    #[error("target `{name}` is declared more than once")]
    DuplicateTarget { name: String },

    #[error("unknown target `{name}`")]
    UnknownTarget {
        name: String,
        referenced_by: Option<String>,
        available: Vec<String>,
    },

    #[error("no target requested and no default target declared")]
    NoTarget,

    #[error("cyclic target graph: `{from}` -> `{to}` is part of a cycle")]
    #[diagnostic(
        code(nativepack::graph::cycle),
        help("remove one of the DependsOn/After edges between these targets")
    )]
    Cycle { from: String, to: String },

    #[error("missing required parameters: {}", list_missing(.missing))]
    MissingParameters { missing: Vec<MissingParameter> },

    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("target `{target}` failed")]
    TargetFailed {
        target: String,
        completed: Vec<String>,
        #[source]
        source: anyhow::Error,
    },
}

impl GraphError {
    /// Configuration errors are detected before any target runs.
    pub fn is_configuration(&self) -> bool {
        !matches!(self, GraphError::TargetFailed { .. })
    }

    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            GraphError::DuplicateTarget { name } => {
                Diagnostic::error(format!("target `{}` is declared more than once", name))
            }

            GraphError::UnknownTarget {
                name,
                referenced_by,
                available,
            } => {
                let mut diag = Diagnostic::error(format!("unknown target `{}`", name));
                if let Some(by) = referenced_by {
                    diag = diag.with_context(format!("referenced by target `{}`", by));
                }
                if !available.is_empty() {
                    diag = diag.with_context(format!("available targets: {}", available.join(", ")));
                }
                diag.with_suggestion(suggestions::LIST_TARGETS)
            }

            GraphError::NoTarget => Diagnostic::error(self.to_string())
                .with_suggestion(suggestions::NAME_TARGET),

            GraphError::Cycle { from, to } => {
                Diagnostic::error("cyclic target graph")
                    .with_context(format!("`{}` must run before `{}`, which leads back to `{}`", from, to, from))
                    .with_suggestion("Remove one of the DependsOn/After edges in the cycle")
            }

            GraphError::MissingParameters { missing } => {
                let mut diag = Diagnostic::error("missing required parameters");
                for m in missing {
                    diag = diag.with_context(m.to_string());
                }
                for m in missing {
                    let flags: Vec<String> =
                        m.parameters.iter().map(|p| format!("--{}", p)).collect();
                    diag = diag.with_suggestion(format!("Pass {}", flags.join(" or ")));
                }
                diag
            }

            GraphError::InvalidParameter { name, reason } => {
                Diagnostic::error(format!("invalid parameter `{}`", name)).with_context(reason.clone())
            }

            GraphError::TargetFailed {
                target,
                completed,
                source,
            } => {
                let mut diag = Diagnostic::error(format!("target `{}` failed", target))
                    .with_context(format!("{:#}", source));
                if !completed.is_empty() {
                    diag = diag.with_context(format!("completed before failure: {}", completed.join(", ")));
                }
                diag.with_suggestion(suggestions::RUN_VERBOSE)
            }
        }
    }
}
