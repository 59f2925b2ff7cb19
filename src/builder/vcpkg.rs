//! Native builds through vcpkg.
//!
//! Every invocation passes explicit roots (downloads, buildtrees, install,
//! packages) and an explicit manifest root, so concurrent builds for
//! different triplets never touch a shared default directory.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use rayon::prelude::*;

use crate::core::platform::{Platform, Triplet};
use crate::core::store::{ArtifactStore, PlatformRoots};
use crate::util::process::ProcessBuilder;

/// Everything vcpkg needs to build one triplet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallRequest {
    pub triplet: Triplet,
    pub roots: PlatformRoots,
    /// Directory holding `vcpkg.json`.
    pub manifest_root: PathBuf,
    pub default_features: bool,
    pub features: Vec<String>,
    pub binary_sources: Vec<String>,
    pub overlay_ports: Vec<PathBuf>,
    pub overlay_triplets: Vec<PathBuf>,
    pub debug: bool,
}

impl InstallRequest {
    /// The `vcpkg install` argument list, in fixed order.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec![
            "install".to_string(),
            format!("--triplet={}", self.triplet),
            format!("--downloads-root={}", self.roots.downloads.display()),
            format!("--x-buildtrees-root={}", self.roots.buildtrees.display()),
            format!("--x-install-root={}", self.roots.installed.display()),
            format!("--x-packages-root={}", self.roots.packages.display()),
            format!("--x-manifest-root={}", self.manifest_root.display()),
        ];

        if !self.default_features {
            args.push("--x-no-default-features".to_string());
        }
        args.extend(self.features.iter().map(|f| format!("--x-feature={}", f)));
        args.extend(
            self.overlay_ports
                .iter()
                .map(|p| format!("--overlay-ports={}", p.display())),
        );
        args.extend(
            self.overlay_triplets
                .iter()
                .map(|p| format!("--overlay-triplets={}", p.display())),
        );
        args.push("--clean-after-build".to_string());
        args.push("--disable-metrics".to_string());
        args.extend(
            self.binary_sources
                .iter()
                .map(|s| format!("--binarysource={}", s)),
        );
        if self.debug {
            args.push("--debug".to_string());
        }

        args
    }
}

/// The external native package manager.
pub trait NativeBuildTool: Send + Sync {
    /// Make the tool usable (download or build its executable).
    fn bootstrap(&self) -> Result<()>;

    /// Build and install one triplet. Returns once the tool has exited.
    fn install(&self, request: &InstallRequest) -> Result<()>;
}

/// A vcpkg checkout.
#[derive(Debug, Clone)]
pub struct VcpkgTool {
    root: PathBuf,
}

impl VcpkgTool {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        VcpkgTool { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn binary(&self) -> PathBuf {
        let exe = if cfg!(windows) { "vcpkg.exe" } else { "vcpkg" };
        self.root.join(exe)
    }

    pub fn bootstrap_script(&self) -> PathBuf {
        let script = if cfg!(windows) {
            "bootstrap-vcpkg.bat"
        } else {
            "bootstrap-vcpkg.sh"
        };
        self.root.join(script)
    }

    pub fn install_command(&self, request: &InstallRequest) -> ProcessBuilder {
        ProcessBuilder::new(self.binary())
            .args(request.to_args())
            .cwd(&request.manifest_root)
    }
}

impl NativeBuildTool for VcpkgTool {
    fn bootstrap(&self) -> Result<()> {
        if self.binary().exists() {
            tracing::debug!("vcpkg already bootstrapped at {}", self.root.display());
            return Ok(());
        }

        let script = self.bootstrap_script();
        if !script.exists() {
            bail!(
                "no vcpkg checkout at {} (missing {})",
                self.root.display(),
                script.display()
            );
        }

        ProcessBuilder::new(&script)
            .arg("-disableMetrics")
            .cwd(&self.root)
            .run()
            .context("failed to bootstrap vcpkg")
    }

    fn install(&self, request: &InstallRequest) -> Result<()> {
        let binary = self.binary();
        if !binary.exists() {
            bail!(
                "vcpkg binary not found at {}; run the `setup-vcpkg` target first",
                binary.display()
            );
        }
        self.install_command(request).run()
    }
}

/// Settings shared by every platform build of one run.
#[derive(Debug, Clone, Default)]
pub struct NativeBuildOptions {
    pub manifest_root: PathBuf,
    pub default_features: bool,
    pub features: Vec<String>,
    pub binary_sources: Vec<String>,
    pub overlay_ports: Vec<PathBuf>,
    pub overlay_triplets: Vec<PathBuf>,
    pub debug: bool,
}

/// Runs native builds into per-platform staging roots.
pub struct NativeBuildInvoker<'a> {
    tool: &'a dyn NativeBuildTool,
    store: &'a ArtifactStore,
}

impl<'a> NativeBuildInvoker<'a> {
    pub fn new(tool: &'a dyn NativeBuildTool, store: &'a ArtifactStore) -> Self {
        NativeBuildInvoker { tool, store }
    }

    pub fn request(&self, selector: &str, platform: &Platform, opts: &NativeBuildOptions) -> InstallRequest {
        InstallRequest {
            triplet: platform.triplet.clone(),
            roots: self.store.platform_roots(selector, platform),
            manifest_root: opts.manifest_root.clone(),
            default_features: opts.default_features,
            features: opts.features.clone(),
            binary_sources: opts.binary_sources.clone(),
            overlay_ports: opts.overlay_ports.clone(),
            overlay_triplets: opts.overlay_triplets.clone(),
            debug: opts.debug,
        }
    }

    /// Build one platform from freshly cleaned roots; returns its install directory.
    pub fn build(&self, selector: &str, platform: &Platform, opts: &NativeBuildOptions) -> Result<PathBuf> {
        self.store.prepare_platform_roots(selector, platform)?;
        let request = self.request(selector, platform, opts);

        tracing::info!("building {} for {}", selector, platform);
        self.tool
            .install(&request)
            .with_context(|| format!("native build failed for triplet `{}`", platform.triplet))?;

        let install_dir = self.store.install_dir(selector, platform);
        if !install_dir.is_dir() {
            bail!(
                "native build for triplet `{}` produced no install directory at {}",
                platform.triplet,
                install_dir.display()
            );
        }
        Ok(install_dir)
    }

    /// Build every platform, optionally in parallel.
    ///
    /// Each platform owns its roots, so parallel builds cannot interfere. When
    /// several fail, the first failure in `platforms` order is returned.
    pub fn build_all(
        &self,
        selector: &str,
        platforms: &[Platform],
        opts: &NativeBuildOptions,
        parallel: bool,
    ) -> Result<Vec<PathBuf>> {
        if parallel {
            platforms
                .par_iter()
                .map(|platform| self.build(selector, platform, opts))
                .collect::<Vec<_>>()
                .into_iter()
                .collect()
        } else {
            platforms
                .iter()
                .map(|platform| self.build(selector, platform, opts))
                .collect()
        }
    }
}
