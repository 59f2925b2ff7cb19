//! The packaging pipeline: targets and their actions.
//!
//! ```text
//! clean
//! setup-vcpkg, setup-build-dependencies
//!   -> build-port-package -> archive-port-package -> extract-port-package
//!   -> build-runtime-package -> build-multiplatform-package -> publish
//! ```
//!
//! Every target runs after `clean` when both are requested, without
//! depending on it.

use std::path::PathBuf;

use anyhow::{bail, Result};

use crate::builder::archive::{archive_platform, extract_platform};
use crate::builder::runtime_package::RuntimePackageBuilder;
use crate::builder::umbrella::MultiPlatformPackageComposer;
use crate::builder::vcpkg::NativeBuildInvoker;
use crate::graph::{GraphError, Target, TargetGraph};
use crate::ops::context::PipelineContext;
use crate::ops::params::*;

pub const CLEAN: &str = "clean";
pub const SETUP_VCPKG: &str = "setup-vcpkg";
pub const SETUP_BUILD_DEPENDENCIES: &str = "setup-build-dependencies";
pub const BUILD_PORT_PACKAGE: &str = "build-port-package";
pub const ARCHIVE_PORT_PACKAGE: &str = "archive-port-package";
pub const EXTRACT_PORT_PACKAGE: &str = "extract-port-package";
pub const BUILD_RUNTIME_PACKAGE: &str = "build-runtime-package";
pub const BUILD_MULTIPLATFORM_PACKAGE: &str = "build-multiplatform-package";
pub const PUBLISH: &str = "publish";

/// Declare the pipeline.
pub fn pipeline() -> Result<TargetGraph<PipelineContext>, GraphError> {
    let mut graph = TargetGraph::new();

    graph.add(
        Target::new(CLEAN)
            .description("Delete every artifact")
            .executes(clean),
    )?;
    graph.add(
        Target::new(SETUP_VCPKG)
            .description("Bootstrap the vcpkg checkout")
            .unlisted()
            .executes(setup_vcpkg),
    )?;
    graph.add(
        Target::new(SETUP_BUILD_DEPENDENCIES)
            .description("Install OS packages the native build needs")
            .unlisted()
            .executes(setup_build_dependencies),
    )?;
    graph.add(
        port_target(BUILD_PORT_PACKAGE)
            .description("Build the port for every triplet")
            .depends_on(SETUP_VCPKG)
            .depends_on(SETUP_BUILD_DEPENDENCIES)
            .executes(build_port_package),
    )?;
    graph.add(
        port_target(ARCHIVE_PORT_PACKAGE)
            .description("Archive each triplet's build tree")
            .depends_on(BUILD_PORT_PACKAGE)
            .executes(archive_port_package),
    )?;
    graph.add(
        port_target(EXTRACT_PORT_PACKAGE)
            .description("Restore each triplet's build tree from its archive")
            .depends_on(ARCHIVE_PORT_PACKAGE)
            .executes(extract_port_package),
    )?;
    graph.add(
        package_target(BUILD_RUNTIME_PACKAGE)
            .description("Pack one runtime package per triplet")
            .depends_on(EXTRACT_PORT_PACKAGE)
            .executes(build_runtime_package),
    )?;
    graph.add(
        package_target(BUILD_MULTIPLATFORM_PACKAGE)
            .description("Pack the multi-platform package")
            .depends_on(BUILD_RUNTIME_PACKAGE)
            .executes(build_multiplatform_package),
    )?;
    graph.add(
        Target::new(PUBLISH)
            .description("Push every package to the feed")
            .after(CLEAN)
            .depends_on(BUILD_MULTIPLATFORM_PACKAGE)
            .requires(API_KEY)
            .requires(FEED)
            .executes(publish),
    )?;

    graph.set_default(BUILD_MULTIPLATFORM_PACKAGE);
    Ok(graph)
}

/// A target working on the per-triplet build trees.
fn port_target(name: &str) -> Target<PipelineContext> {
    Target::new(name)
        .after(CLEAN)
        .requires_any(&[FEATURES, PACKAGE_VERSION])
        .requires(TRIPLETS)
}

/// A target producing packages.
fn package_target(name: &str) -> Target<PipelineContext> {
    METADATA_PARAMETERS.iter().fold(
        Target::new(name).after(CLEAN).requires(TRIPLETS),
        |target, param| target.requires(param),
    )
}

fn clean(ctx: &PipelineContext) -> Result<()> {
    ctx.store().clean()
}

fn setup_vcpkg(ctx: &PipelineContext) -> Result<()> {
    ctx.tools().native.bootstrap()
}

fn setup_build_dependencies(ctx: &PipelineContext) -> Result<()> {
    let packages = ctx.params().list(SYSTEM_PACKAGES);
    if packages.is_empty() {
        tracing::debug!("no system packages configured");
        return Ok(());
    }
    ctx.tools().installer.install(&packages)
}

fn build_port_package(ctx: &PipelineContext) -> Result<()> {
    let invoker = NativeBuildInvoker::new(ctx.tools().native.as_ref(), ctx.store());
    invoker.build_all(
        ctx.selector()?,
        ctx.platforms(),
        &ctx.build_options(),
        ctx.params().flag(PARALLEL),
    )?;
    Ok(())
}

fn archive_port_package(ctx: &PipelineContext) -> Result<()> {
    let selector = ctx.selector()?;
    for platform in ctx.platforms() {
        archive_platform(ctx.store(), selector, platform)?;
    }
    Ok(())
}

fn extract_port_package(ctx: &PipelineContext) -> Result<()> {
    let selector = ctx.selector()?;
    for platform in ctx.platforms() {
        extract_platform(ctx.store(), selector, platform)?;
    }
    Ok(())
}

fn build_runtime_package(ctx: &PipelineContext) -> Result<()> {
    let selector = ctx.selector()?;
    let meta = ctx.metadata()?;
    let builder = RuntimePackageBuilder::new(ctx.store(), ctx.tools().packer.as_ref());

    for platform in ctx.platforms() {
        let install_dir = ctx.store().install_dir(selector, platform);
        let package = builder.stage(platform, &install_dir, meta)?;
        ctx.record_output(package.artifact);
    }
    Ok(())
}

fn build_multiplatform_package(ctx: &PipelineContext) -> Result<()> {
    let selector = ctx.selector()?;
    let install_dirs: Vec<PathBuf> = ctx
        .platforms()
        .iter()
        .map(|platform| ctx.store().install_dir(selector, platform))
        .collect();

    let package = MultiPlatformPackageComposer::new(ctx.store(), ctx.tools().packer.as_ref())
        .compose(ctx.platforms(), &install_dirs, ctx.metadata()?)?;
    ctx.record_output(package.artifact);
    Ok(())
}

fn publish(ctx: &PipelineContext) -> Result<()> {
    let (Some(feed), Some(api_key)) = (ctx.params().string(FEED), ctx.params().string(API_KEY))
    else {
        bail!("publishing needs both `{}` and `{}`", FEED, API_KEY);
    };

    // Only this run's packages; the output directory may still hold older
    // versions when `clean` was not requested.
    let packages = ctx.produced();
    if packages.is_empty() {
        bail!("no packages were produced by this run");
    }

    for package in &packages {
        ctx.tools().publisher.push(package, feed, api_key)?;
    }
    tracing::info!("published {} packages to {}", packages.len(), feed);
    Ok(())
}
