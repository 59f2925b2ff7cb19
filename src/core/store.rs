//! Artifact store - the staging tree under `artifacts/`.
//!
//! ```text
//! artifacts/
//! ├── vcpkg/
//! │   ├── <selector>/<rid>/{buildtrees,downloads,installed,packages}
//! │   └── vcpkg-<selector>-<triplet>.tar.gz
//! └── nuget/
//!     ├── build/<id>.<version>.nupkg/     # package staging
//!     └── installed/                      # final packages
//! ```
//!
//! Every path is derived from explicit inputs. Per-platform subtrees are keyed
//! by selector and runtime id, so two platforms never share a directory.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{bail, Result};
use regex::Regex;

use crate::core::package_id::{PackageId, PackageVersion};
use crate::core::platform::{Platform, Triplet};
use crate::util::fs::{create_or_clean_dir, ensure_dir};

/// Name of the artifacts directory below the project root.
pub const ARTIFACTS_DIR: &str = "artifacts";

/// The four vcpkg roots owned by one platform build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformRoots {
    pub buildtrees: PathBuf,
    pub downloads: PathBuf,
    pub installed: PathBuf,
    pub packages: PathBuf,
}

impl PlatformRoots {
    pub fn all(&self) -> [&Path; 4] {
        [
            &self.buildtrees,
            &self.downloads,
            &self.installed,
            &self.packages,
        ]
    }
}

/// A selector names one directory below `vcpkg/`.
static SELECTOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._+-]*$").expect("valid selector regex")
});

/// Selects the staging subtree for one run: the feature list, or the
/// package version when no feature was selected.
///
/// Fails when the result would not be a single plain path component.
pub fn staging_selector(
    features: &[String],
    version: Option<&PackageVersion>,
) -> Result<Option<String>> {
    let features: Vec<&str> = features
        .iter()
        .map(|f| f.trim())
        .filter(|f| !f.is_empty())
        .collect();

    let selector = if !features.is_empty() {
        features.join("-")
    } else {
        match version {
            Some(v) => v.to_string(),
            None => return Ok(None),
        }
    };

    if !SELECTOR_RE.is_match(&selector) {
        bail!(
            "`{}` cannot name a staging directory; features and versions may only use letters, digits, `.`, `+` and `-`",
            selector
        );
    }
    Ok(Some(selector))
}

/// Owns the artifacts root and derives every path below it.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    /// Store rooted at `<project_root>/artifacts`.
    pub fn for_project(project_root: &Path) -> Self {
        ArtifactStore {
            root: project_root.join(ARTIFACTS_DIR),
        }
    }

    pub fn new(root: impl Into<PathBuf>) -> Self {
        ArtifactStore { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn vcpkg_root(&self) -> PathBuf {
        self.root.join("vcpkg")
    }

    pub fn nuget_root(&self) -> PathBuf {
        self.root.join("nuget")
    }

    /// Root of one platform's native build.
    pub fn platform_root(&self, selector: &str, platform: &Platform) -> PathBuf {
        self.vcpkg_root()
            .join(selector)
            .join(platform.runtime.as_str())
    }

    pub fn platform_roots(&self, selector: &str, platform: &Platform) -> PlatformRoots {
        let base = self.platform_root(selector, platform);
        PlatformRoots {
            buildtrees: base.join("buildtrees"),
            downloads: base.join("downloads"),
            installed: base.join("installed"),
            packages: base.join("packages"),
        }
    }

    /// Where vcpkg leaves the installed tree (`include/`, `lib/`, `bin/`) for a triplet.
    pub fn install_dir(&self, selector: &str, platform: &Platform) -> PathBuf {
        self.platform_roots(selector, platform)
            .installed
            .join(platform.triplet.as_str())
    }

    /// Transfer archive for one platform's build root.
    pub fn port_archive(&self, selector: &str, triplet: &Triplet) -> PathBuf {
        self.vcpkg_root()
            .join(format!("vcpkg-{}-{}.tar.gz", selector, triplet))
    }

    pub fn package_build_root(&self) -> PathBuf {
        self.nuget_root().join("build")
    }

    /// Staging directory for one package.
    pub fn package_staging_dir(&self, id: &PackageId, version: &PackageVersion) -> PathBuf {
        self.package_build_root()
            .join(format!("{}.{}.nupkg", id, version))
    }

    /// Flat directory receiving the final package files.
    pub fn package_output_dir(&self) -> PathBuf {
        self.nuget_root().join("installed")
    }

    /// Final package file produced by the packaging tool.
    pub fn package_artifact(&self, id: &PackageId, version: &PackageVersion) -> PathBuf {
        self.package_output_dir()
            .join(format!("{}.{}.nupkg", id, version))
    }

    /// Wipe the whole artifacts tree, leaving an empty root.
    pub fn clean(&self) -> Result<()> {
        create_or_clean_dir(&self.root)
    }

    /// Create fresh, empty vcpkg roots for one platform.
    pub fn prepare_platform_roots(&self, selector: &str, platform: &Platform) -> Result<PlatformRoots> {
        let roots = self.platform_roots(selector, platform);
        for dir in roots.all() {
            create_or_clean_dir(dir)?;
        }
        tracing::debug!(
            "prepared vcpkg roots for {} under {}",
            platform,
            self.platform_root(selector, platform).display()
        );
        Ok(roots)
    }

    /// Create (or wipe) the staging directory of a package.
    pub fn prepare_package_staging(&self, id: &PackageId, version: &PackageVersion) -> Result<PathBuf> {
        let dir = self.package_staging_dir(id, version);
        create_or_clean_dir(&dir)?;
        ensure_dir(&self.package_output_dir())?;
        Ok(dir)
    }
}
