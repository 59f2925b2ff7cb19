//! Test utilities and fakes for nativepack unit tests.
//!
//! The pipeline talks to four external collaborators (native build tool,
//! packaging tool, publisher, OS package installer). The fakes here stand in
//! for them: they record every call and produce just enough filesystem
//! output for the next stage to consume.
//!
//! # Example
//!
//! ```rust,ignore
//! use nativepack::test_support::{FakeBuildTool, FakePackTool};
//!
//! #[test]
//! fn test_example() {
//!     let build = FakeBuildTool::new().fail_on("x64-windows");
//!     let pack = FakePackTool::new();
//!     // Hand them to the code under test...
//!     assert_eq!(build.calls(), vec!["x64-linux"]);
//! }
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{bail, Result};

use crate::builder::pack::{PackRequest, PackTool, PackagePublisher};
use crate::builder::system::SystemPackageInstaller;
use crate::builder::vcpkg::{InstallRequest, NativeBuildTool};
use crate::core::platform::Triplet;
use crate::util::fs::write_string;

/// Fill `install_dir` the way a native build for `triplet` would.
///
/// Every triplet ships the shared header `include/fake.h` (its contents name
/// the triplet) plus a triplet-specific `include/fake/config-<triplet>.h`.
/// Libraries follow the platform conventions: DLLs under `bin/` on Windows,
/// `.dylib` on macOS, versioned `.so` files plus a static archive elsewhere.
pub fn populate_install_tree(install_dir: &Path, triplet: &Triplet) -> Result<()> {
    let include = install_dir.join("include");
    write_string(&include.join("fake.h"), &format!("// fake built for {}\n", triplet))?;
    write_string(
        &include.join("fake").join(format!("config-{}.h", triplet)),
        "#define FAKE_CONFIG 1\n",
    )?;

    let name = triplet.as_str();
    if name.contains("windows") {
        write_string(&install_dir.join("bin/fake.dll"), name)?;
        write_string(&install_dir.join("lib/fake.lib"), name)?;
    } else if name.contains("osx") {
        write_string(&install_dir.join("lib/libfake.dylib"), name)?;
    } else {
        write_string(&install_dir.join("lib/libfake.so.1"), name)?;
        write_string(&install_dir.join("lib/libfake.so"), name)?;
        write_string(&install_dir.join("lib/libfake.a"), name)?;
    }
    Ok(())
}

/// Fake native build tool.
///
/// Installs a synthetic tree into `<install-root>/<triplet>`, or fails for
/// the triplets registered with [`FakeBuildTool::fail_on`].
#[derive(Debug, Clone, Default)]
pub struct FakeBuildTool {
    failing: HashSet<String>,
    calls: Arc<Mutex<Vec<String>>>,
    requests: Arc<Mutex<Vec<InstallRequest>>>,
    bootstraps: Arc<Mutex<usize>>,
}

impl FakeBuildTool {
    pub fn new() -> Self {
        FakeBuildTool::default()
    }

    /// Make builds for `triplet` fail.
    pub fn fail_on(mut self, triplet: &str) -> Self {
        self.failing.insert(triplet.to_string());
        self
    }

    /// Triplets built so far, in call order (completion order for parallel builds).
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn requests(&self) -> Vec<InstallRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn bootstrap_count(&self) -> usize {
        *self.bootstraps.lock().unwrap()
    }
}

impl NativeBuildTool for FakeBuildTool {
    fn bootstrap(&self) -> Result<()> {
        *self.bootstraps.lock().unwrap() += 1;
        Ok(())
    }

    fn install(&self, request: &InstallRequest) -> Result<()> {
        let triplet = request.triplet.to_string();
        self.calls.lock().unwrap().push(triplet.clone());
        self.requests.lock().unwrap().push(request.clone());

        if self.failing.contains(&triplet) {
            bail!("fake build failed for {}", triplet);
        }
        populate_install_tree(
            &request.roots.installed.join(request.triplet.as_str()),
            &request.triplet,
        )
    }
}

/// Fake packaging tool.
///
/// Writes `<output>/<staging-dir-name>` (the staging directory is already
/// named `<id>.<version>.nupkg`) containing the manifest it was given.
#[derive(Debug, Clone, Default)]
pub struct FakePackTool {
    requests: Arc<Mutex<Vec<PackRequest>>>,
}

impl FakePackTool {
    pub fn new() -> Self {
        FakePackTool::default()
    }

    pub fn requests(&self) -> Vec<PackRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl PackTool for FakePackTool {
    fn pack(&self, request: &PackRequest) -> Result<()> {
        self.requests.lock().unwrap().push(request.clone());

        let Some(name) = request.working_dir.file_name() else {
            bail!("staging directory has no name: {}", request.working_dir.display());
        };
        let manifest = std::fs::read_to_string(&request.manifest)?;
        write_string(&request.output_dir.join(name), &manifest)
    }
}

/// Fake package publisher recording `(package, feed)` pairs.
#[derive(Debug, Clone, Default)]
pub struct FakePublisher {
    pushed: Arc<Mutex<Vec<(PathBuf, String)>>>,
    api_keys: Arc<Mutex<Vec<String>>>,
}

impl FakePublisher {
    pub fn new() -> Self {
        FakePublisher::default()
    }

    pub fn pushed(&self) -> Vec<(PathBuf, String)> {
        self.pushed.lock().unwrap().clone()
    }

    pub fn api_keys(&self) -> Vec<String> {
        self.api_keys.lock().unwrap().clone()
    }
}

impl PackagePublisher for FakePublisher {
    fn push(&self, package: &Path, feed: &str, api_key: &str) -> Result<()> {
        if !package.is_file() {
            bail!("package not found: {}", package.display());
        }
        self.pushed
            .lock()
            .unwrap()
            .push((package.to_path_buf(), feed.to_string()));
        self.api_keys.lock().unwrap().push(api_key.to_string());
        Ok(())
    }
}

/// OS package installer that only records what it was asked for.
#[derive(Debug, Clone, Default)]
pub struct RecordingInstaller {
    installed: Arc<Mutex<Vec<Vec<String>>>>,
}

impl RecordingInstaller {
    pub fn new() -> Self {
        RecordingInstaller::default()
    }

    pub fn installed(&self) -> Vec<Vec<String>> {
        self.installed.lock().unwrap().clone()
    }
}

impl SystemPackageInstaller for RecordingInstaller {
    fn install(&self, packages: &[String]) -> Result<()> {
        self.installed.lock().unwrap().push(packages.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_install_tree_per_platform() {
        let tmp = TempDir::new().unwrap();
        populate_install_tree(tmp.path(), &Triplet::new("x64-osx-dynamic")).unwrap();
        assert!(tmp.path().join("lib/libfake.dylib").is_file());
        assert!(tmp.path().join("include/fake.h").is_file());
        assert!(tmp
            .path()
            .join("include/fake/config-x64-osx-dynamic.h")
            .is_file());
    }

    #[test]
    fn test_fake_pack_writes_named_artifact() {
        let tmp = TempDir::new().unwrap();
        let staging = tmp.path().join("Pkg.1.0.0.nupkg");
        write_string(&staging.join("Pkg.nuspec"), "<package />").unwrap();

        let packer = FakePackTool::new();
        packer
            .pack(&PackRequest {
                manifest: staging.join("Pkg.nuspec"),
                working_dir: staging.clone(),
                output_dir: tmp.path().join("out"),
                no_package_analysis: false,
            })
            .unwrap();

        assert!(tmp.path().join("out/Pkg.1.0.0.nupkg").is_file());
        assert_eq!(packer.requests().len(), 1);
    }
}
