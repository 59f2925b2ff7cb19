//! The multi-platform umbrella package.
//!
//! The umbrella ships headers and a runtime graph, never binaries. Package
//! consumers resolve the runtime graph against their own runtime identifier
//! to pull in the matching runtime package.

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};

use crate::builder::nuspec::{Nuspec, TARGET_FRAMEWORK_FOLDER};
use crate::builder::pack::{PackRequest, PackTool};
use crate::builder::runtime_graph::{RuntimeGraph, RUNTIME_GRAPH_FILE};
use crate::core::metadata::PackageMetadata;
use crate::core::package_id::{PackageId, PackageVersion};
use crate::core::platform::Platform;
use crate::core::store::ArtifactStore;
use crate::util::fs::{copy_dir_merge, touch_file};

/// Marker telling package consumers the package has no managed code.
const PLACEHOLDER_FILE: &str = "_._";

/// A staged and packed umbrella package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UmbrellaPackage {
    pub id: PackageId,
    pub version: PackageVersion,
    pub manifest: PathBuf,
    pub runtime_graph: RuntimeGraph,
    /// Merged headers, relative to the include directory.
    pub headers: Vec<PathBuf>,
    /// Headers skipped because an earlier platform already provided them.
    pub skipped_headers: Vec<PathBuf>,
    pub artifact: PathBuf,
}

/// Shared include directory inside a package.
pub fn include_dir(staging: &Path) -> PathBuf {
    staging.join("lib").join("native").join("include")
}

/// Composes the umbrella package from the per-platform builds.
pub struct MultiPlatformPackageComposer<'a> {
    store: &'a ArtifactStore,
    packer: &'a dyn PackTool,
}

impl<'a> MultiPlatformPackageComposer<'a> {
    pub fn new(store: &'a ArtifactStore, packer: &'a dyn PackTool) -> Self {
        MultiPlatformPackageComposer { store, packer }
    }

    /// Compose the umbrella package.
    ///
    /// `platforms` and `install_dirs` are parallel slices. Headers are merged
    /// in that order and the first copy of a header wins; later copies are
    /// skipped without comparing contents. The runtime graph is written in
    /// runtime identifier order regardless.
    pub fn compose(
        &self,
        platforms: &[Platform],
        install_dirs: &[PathBuf],
        meta: &PackageMetadata,
    ) -> Result<UmbrellaPackage> {
        if platforms.len() != install_dirs.len() {
            bail!(
                "got {} platforms but {} install directories",
                platforms.len(),
                install_dirs.len()
            );
        }
        if platforms.is_empty() {
            bail!("cannot compose a multi-platform package without platforms");
        }

        let nuspec = Nuspec::umbrella(meta);
        let staging = self.store.prepare_package_staging(&nuspec.id, &nuspec.version)?;
        let manifest = staging.join(nuspec.file_name());
        nuspec.write(&manifest)?;

        let includes = include_dir(&staging);
        let mut headers = Vec::new();
        let mut skipped_headers = Vec::new();
        for (platform, install_dir) in platforms.iter().zip(install_dirs) {
            let source = install_dir.join("include");
            if !source.is_dir() {
                tracing::warn!("{} has no include directory, skipping headers", platform);
                continue;
            }

            let stats = copy_dir_merge(&source, &includes)?;
            for header in &stats.skipped {
                tracing::warn!(
                    "{} also provides {}, keeping the first copy",
                    platform,
                    header.display()
                );
            }
            headers.extend(stats.copied);
            skipped_headers.extend(stats.skipped);
        }

        let runtime_graph = RuntimeGraph::for_platforms(&nuspec.id, platforms, &nuspec.version);
        runtime_graph.write(&staging.join(RUNTIME_GRAPH_FILE))?;

        touch_file(
            &staging
                .join("lib")
                .join(TARGET_FRAMEWORK_FOLDER)
                .join(PLACEHOLDER_FILE),
        )?;

        self.packer.pack(&PackRequest {
            manifest: manifest.clone(),
            working_dir: staging,
            output_dir: self.store.package_output_dir(),
            no_package_analysis: true,
        })?;

        let artifact = self.store.package_artifact(&nuspec.id, &nuspec.version);
        tracing::info!(
            "packed {} {} for {} runtimes",
            nuspec.id,
            nuspec.version,
            runtime_graph.len()
        );

        Ok(UmbrellaPackage {
            id: nuspec.id,
            version: nuspec.version,
            manifest,
            runtime_graph,
            headers,
            skipped_headers,
            artifact,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::platform::{RuntimeId, Triplet};
    use crate::test_support::{populate_install_tree, FakePackTool};
    use std::fs;
    use tempfile::TempDir;

    fn metadata() -> PackageMetadata {
        PackageMetadata::new(
            "Pkg",
            "2.0.0",
            "Jane",
            "MIT",
            "https://example.com",
            "https://example.com/pkg.git",
        )
        .unwrap()
    }

    fn platform(triplet: &str, rid: &str) -> Platform {
        Platform {
            triplet: Triplet::new(triplet),
            runtime: RuntimeId::new(rid),
        }
    }

    struct Fixture {
        tmp: TempDir,
        platforms: Vec<Platform>,
        installs: Vec<PathBuf>,
    }

    fn fixture(pairs: &[(&str, &str)]) -> Fixture {
        let tmp = TempDir::new().unwrap();
        let mut platforms = Vec::new();
        let mut installs = Vec::new();
        for (triplet, rid) in pairs {
            let p = platform(triplet, rid);
            let install = tmp.path().join("install").join(triplet);
            populate_install_tree(&install, &p.triplet).unwrap();
            platforms.push(p);
            installs.push(install);
        }
        Fixture {
            tmp,
            platforms,
            installs,
        }
    }

    #[test]
    fn test_compose_layout() {
        let fx = fixture(&[("x64-linux", "linux-x64"), ("x64-windows", "win-x64")]);
        let store = ArtifactStore::for_project(fx.tmp.path());
        let packer = FakePackTool::new();

        let package = MultiPlatformPackageComposer::new(&store, &packer)
            .compose(&fx.platforms, &fx.installs, &metadata())
            .unwrap();

        let staging = package.manifest.parent().unwrap();
        assert!(staging.ends_with("nuget/build/Pkg.2.0.0.nupkg"));
        assert!(staging.join("lib/netstandard2.0/_._").is_file());
        assert!(staging.join("runtime.json").is_file());
        assert!(include_dir(staging).join("fake.h").is_file());
        assert!(include_dir(staging).join("fake/config-x64-windows.h").is_file());

        assert_eq!(package.runtime_graph.len(), 2);
        for p in &fx.platforms {
            let deps = package.runtime_graph.dependencies(&p.runtime);
            assert_eq!(deps.len(), 1);
            assert_eq!(deps[0].1, "[2.0.0]");
        }

        let requests = packer.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].no_package_analysis);
        assert!(package.artifact.is_file());
    }

    #[test]
    fn test_first_platform_header_wins() {
        let fx = fixture(&[("x64-windows", "win-x64"), ("x64-linux", "linux-x64")]);
        let store = ArtifactStore::for_project(fx.tmp.path());
        let packer = FakePackTool::new();

        let package = MultiPlatformPackageComposer::new(&store, &packer)
            .compose(&fx.platforms, &fx.installs, &metadata())
            .unwrap();

        let shared = include_dir(package.manifest.parent().unwrap()).join("fake.h");
        assert!(fs::read_to_string(&shared).unwrap().contains("x64-windows"));
        assert_eq!(package.skipped_headers, vec![PathBuf::from("fake.h")]);
    }

    #[test]
    fn test_repeated_composition_is_identical() {
        let fx = fixture(&[
            ("x64-linux", "linux-x64"),
            ("x64-windows", "win-x64"),
            ("x86-windows", "win-x86"),
        ]);
        let store = ArtifactStore::for_project(fx.tmp.path());
        let packer = FakePackTool::new();
        let composer = MultiPlatformPackageComposer::new(&store, &packer);

        let first = composer.compose(&fx.platforms, &fx.installs, &metadata()).unwrap();
        let staging = first.manifest.parent().unwrap().to_path_buf();
        let manifest = fs::read(&first.manifest).unwrap();
        let graph = fs::read(staging.join("runtime.json")).unwrap();
        let shared = fs::read(include_dir(&staging).join("fake.h")).unwrap();

        let second = composer.compose(&fx.platforms, &fx.installs, &metadata()).unwrap();
        assert_eq!(second.runtime_graph.len(), 3);
        assert_eq!(fs::read(&second.manifest).unwrap(), manifest);
        assert_eq!(fs::read(staging.join("runtime.json")).unwrap(), graph);
        assert_eq!(fs::read(include_dir(&staging).join("fake.h")).unwrap(), shared);
        assert_eq!(first.headers, second.headers);
    }

    #[test]
    fn test_platform_without_headers_is_skipped() {
        let fx = fixture(&[("x64-linux", "linux-x64"), ("x64-windows", "win-x64")]);
        fs::remove_dir_all(fx.installs[1].join("include")).unwrap();
        let store = ArtifactStore::for_project(fx.tmp.path());
        let packer = FakePackTool::new();

        let package = MultiPlatformPackageComposer::new(&store, &packer)
            .compose(&fx.platforms, &fx.installs, &metadata())
            .unwrap();
        assert!(package.skipped_headers.is_empty());
        assert_eq!(package.runtime_graph.len(), 2);
    }

    #[test]
    fn test_mismatched_inputs() {
        let fx = fixture(&[("x64-linux", "linux-x64")]);
        let store = ArtifactStore::for_project(fx.tmp.path());
        let packer = FakePackTool::new();
        let composer = MultiPlatformPackageComposer::new(&store, &packer);

        assert!(composer.compose(&fx.platforms, &[], &metadata()).is_err());
        assert!(composer.compose(&[], &[], &metadata()).is_err());
        assert!(packer.requests().is_empty());
    }
}
