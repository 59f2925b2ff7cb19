//! Packaging and publishing tools.
//!
//! Both are external processes behind narrow traits so the staging logic can
//! be exercised without the NuGet CLI installed.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::util::process::{find_executable, ProcessBuilder};

/// One `pack` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackRequest {
    /// Manifest inside the staging directory.
    pub manifest: PathBuf,
    /// Staging directory; the tool runs here.
    pub working_dir: PathBuf,
    /// Directory receiving `<id>.<version>.nupkg`.
    pub output_dir: PathBuf,
    pub no_package_analysis: bool,
}

/// Turns a staged package directory into a package archive.
pub trait PackTool {
    fn pack(&self, request: &PackRequest) -> Result<()>;
}

/// Uploads package archives to a feed.
pub trait PackagePublisher {
    fn push(&self, package: &Path, feed: &str, api_key: &str) -> Result<()>;
}

/// The `nuget` command line client.
#[derive(Debug, Clone, Default)]
pub struct NuGetCli {
    program: Option<PathBuf>,
}

impl NuGetCli {
    /// Use an explicit executable, or look `nuget` up on PATH when invoked.
    pub fn new(program: Option<PathBuf>) -> Self {
        NuGetCli { program }
    }

    fn program(&self) -> Result<PathBuf> {
        if let Some(program) = &self.program {
            return Ok(program.clone());
        }
        let exe = if cfg!(windows) { "nuget.exe" } else { "nuget" };
        find_executable(exe).with_context(|| {
            format!("`{}` not found on PATH; install the NuGet CLI or pass --nuget", exe)
        })
    }

    pub fn pack_command(&self, request: &PackRequest) -> Result<ProcessBuilder> {
        let mut cmd = ProcessBuilder::new(self.program()?)
            .arg("pack")
            .arg(&request.manifest)
            .arg("-OutputDirectory")
            .arg(&request.output_dir)
            .arg("-NonInteractive")
            .cwd(&request.working_dir);
        if request.no_package_analysis {
            cmd = cmd.arg("-NoPackageAnalysis");
        }
        Ok(cmd)
    }

    pub fn push_command(&self, package: &Path, feed: &str, api_key: &str) -> Result<ProcessBuilder> {
        Ok(ProcessBuilder::new(self.program()?)
            .arg("push")
            .arg(package)
            .arg("-Source")
            .arg(feed)
            .arg("-ApiKey")
            .secret_arg(api_key)
            .arg("-NonInteractive")
            .arg("-SkipDuplicate"))
    }
}

impl PackTool for NuGetCli {
    fn pack(&self, request: &PackRequest) -> Result<()> {
        self.pack_command(request)?
            .run()
            .with_context(|| format!("failed to pack {}", request.manifest.display()))
    }
}

impl PackagePublisher for NuGetCli {
    fn push(&self, package: &Path, feed: &str, api_key: &str) -> Result<()> {
        self.push_command(package, feed, api_key)?
            .run()
            .with_context(|| format!("failed to push {}", package.display()))
    }
}
