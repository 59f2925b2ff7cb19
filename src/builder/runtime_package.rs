//! Per-platform runtime packages.

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};

use crate::builder::nuspec::Nuspec;
use crate::builder::pack::{PackRequest, PackTool};
use crate::core::metadata::PackageMetadata;
use crate::core::package_id::{PackageId, PackageVersion};
use crate::core::platform::{Platform, RuntimeId};
use crate::core::store::ArtifactStore;
use crate::util::fs::{copy_file_to_dir, glob_files};

/// A staged and packed runtime package.
///
/// The umbrella package refers to it by `id` and `version` only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimePackage {
    pub id: PackageId,
    pub version: PackageVersion,
    pub runtime: RuntimeId,
    /// Staged copies of the shared libraries, in path order.
    pub binaries: Vec<PathBuf>,
    pub manifest: PathBuf,
    /// Package file in the output directory.
    pub artifact: PathBuf,
}

/// Directory inside a package that holds the native binaries for `runtime`.
pub fn native_dir(staging: &Path, runtime: &RuntimeId) -> PathBuf {
    staging.join("runtimes").join(runtime.as_str()).join("native")
}

/// Stages one runtime package per platform.
pub struct RuntimePackageBuilder<'a> {
    store: &'a ArtifactStore,
    packer: &'a dyn PackTool,
}

impl<'a> RuntimePackageBuilder<'a> {
    pub fn new(store: &'a ArtifactStore, packer: &'a dyn PackTool) -> Self {
        RuntimePackageBuilder { store, packer }
    }

    /// Stage and pack the runtime package for `platform` from its install tree.
    ///
    /// The staging directory is wiped first, so rerunning replaces the
    /// previous package instead of accumulating files.
    pub fn stage(
        &self,
        platform: &Platform,
        install_dir: &Path,
        meta: &PackageMetadata,
    ) -> Result<RuntimePackage> {
        if !install_dir.is_dir() {
            bail!(
                "install directory for triplet `{}` not found: {}",
                platform.triplet,
                install_dir.display()
            );
        }

        let nuspec = Nuspec::runtime(meta, &platform.runtime);
        let staging = self.store.prepare_package_staging(&nuspec.id, &nuspec.version)?;
        let manifest = staging.join(nuspec.file_name());
        nuspec.write(&manifest)?;

        let target_dir = native_dir(&staging, &platform.runtime);
        let libraries = glob_files(install_dir, platform.runtime.library_patterns())?;
        if libraries.is_empty() {
            tracing::warn!(
                "no shared libraries found for {} in {}",
                platform,
                install_dir.display()
            );
        }

        let mut binaries = Vec::with_capacity(libraries.len());
        for library in &libraries {
            let staged = copy_file_to_dir(library, &target_dir)?;
            tracing::debug!("staged {}", staged.display());
            binaries.push(staged);
        }

        self.packer.pack(&PackRequest {
            manifest: manifest.clone(),
            working_dir: staging,
            output_dir: self.store.package_output_dir(),
            no_package_analysis: false,
        })?;

        let artifact = self.store.package_artifact(&nuspec.id, &nuspec.version);
        tracing::info!("packed {} {}", nuspec.id, nuspec.version);

        Ok(RuntimePackage {
            id: nuspec.id,
            version: nuspec.version,
            runtime: platform.runtime.clone(),
            binaries,
            manifest,
            artifact,
        })
    }
}
