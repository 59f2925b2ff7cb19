//! nativepack - build native libraries with vcpkg and ship them as NuGet packages
//!
//! The library declares the packaging pipeline as a graph of named targets:
//! build a vcpkg port for each triplet, stage one runtime package per
//! platform, and compose an umbrella package that carries the shared
//! headers and a runtime graph pointing at the runtime packages.

pub mod builder;
pub mod core;
pub mod graph;
pub mod ops;
pub mod util;

/// Recording fakes for the external tools, used by unit tests.
#[cfg(test)]
pub mod test_support;

pub use core::{PackageId, PackageMetadata, PackageVersion, Platform, RuntimeId, Triplet};
pub use graph::{GraphError, Parameters, TargetGraph};
pub use ops::{PipelineContext, PipelineOptions, Tools};
pub use util::context::GlobalContext;
