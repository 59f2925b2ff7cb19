//! Native builds and package assembly.
//!
//! Everything that produces files under the artifacts tree lives here: vcpkg
//! invocations, port archives, package manifests, runtime graphs and the two
//! package stagers. External tools sit behind traits so the pipeline can be
//! driven by fakes in tests.

pub mod archive;
pub mod nuspec;
pub mod pack;
pub mod runtime_graph;
pub mod runtime_package;
pub mod system;
pub mod umbrella;
pub mod vcpkg;

pub use archive::{archive_platform, extract_platform};
pub use nuspec::Nuspec;
pub use pack::{NuGetCli, PackRequest, PackTool, PackagePublisher};
pub use runtime_graph::{RuntimeDescription, RuntimeGraph};
pub use runtime_package::{RuntimePackage, RuntimePackageBuilder};
pub use system::{host_installer, AptInstaller, NoopInstaller, SystemPackageInstaller};
pub use umbrella::{MultiPlatformPackageComposer, UmbrellaPackage};
pub use vcpkg::{InstallRequest, NativeBuildInvoker, NativeBuildOptions, NativeBuildTool, VcpkgTool};
