//! High-level operations.
//!
//! This module wires the builders into the packaging pipeline that the
//! `nativepack` commands run.

pub mod context;
pub mod params;
pub mod pipeline;

pub use context::{PipelineContext, PipelineOptions, Tools};
pub use params::{parameter_defs, pipeline_parameters};
pub use pipeline::pipeline;
