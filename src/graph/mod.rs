//! Target graph - declarative build targets and their orchestration.

pub mod errors;
pub mod orchestrator;
pub mod parameter;
pub mod plan;
pub mod target;

pub use errors::{GraphError, MissingParameter};
pub use orchestrator::{
    ExecutionReport, NoopObserver, RunObserver, TargetGraph, TargetOutcome, TargetStatus,
};
pub use parameter::{ParameterDef, ParameterKind, ParameterValue, Parameters};
pub use plan::ExecutionPlan;
pub use target::{Requirement, Target};
