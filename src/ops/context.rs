//! The value every pipeline target runs against.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::builder::pack::{NuGetCli, PackTool, PackagePublisher};
use crate::builder::system::{host_installer, SystemPackageInstaller};
use crate::builder::vcpkg::{NativeBuildOptions, NativeBuildTool, VcpkgTool};
use crate::core::metadata::PackageMetadata;
use crate::core::package_id::PackageVersion;
use crate::core::platform::{Platform, PlatformResolver, Triplet};
use crate::core::store::{staging_selector, ArtifactStore};
use crate::graph::{ParameterValue, Parameters};
use crate::ops::params::*;

/// External tools the pipeline drives.
pub struct Tools {
    pub native: Box<dyn NativeBuildTool>,
    pub packer: Box<dyn PackTool>,
    pub publisher: Box<dyn PackagePublisher>,
    pub installer: Box<dyn SystemPackageInstaller>,
}

impl Tools {
    /// The real tools, configured from the parameters.
    pub fn host(params: &Parameters, project_root: &Path) -> Self {
        let vcpkg_root = resolve_path(project_root, params.string(VCPKG_ROOT).unwrap_or("vcpkg"));
        let nuget = NuGetCli::new(params.string(NUGET).map(PathBuf::from));
        Tools {
            native: Box::new(VcpkgTool::new(vcpkg_root)),
            packer: Box::new(nuget.clone()),
            publisher: Box::new(nuget),
            installer: host_installer(),
        }
    }
}

/// Settings that are not run parameters.
#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    pub project_root: PathBuf,
    /// Extra triplet -> runtime identifier mappings.
    pub triplet_mappings: BTreeMap<String, String>,
}

/// Everything a target needs: parameters, resolved platforms and metadata,
/// the artifact store and the external tools.
///
/// Construction resolves triplets and validates metadata but touches no
/// files, so configuration errors surface before any target runs.
pub struct PipelineContext {
    params: Parameters,
    project_root: PathBuf,
    store: ArtifactStore,
    platforms: Vec<Platform>,
    selector: Option<String>,
    metadata: Option<PackageMetadata>,
    tools: Tools,
    produced: RefCell<Vec<PathBuf>>,
}

impl PipelineContext {
    pub fn new(mut params: Parameters, options: PipelineOptions, tools: Tools) -> Result<Self> {
        if let Some(name) = params.string(PACKAGE_NAME).map(str::to_string) {
            params.set_if_absent(PACKAGE_ID, ParameterValue::String(name))?;
        }

        let triplets: Vec<Triplet> = params.list(TRIPLETS).iter().map(Triplet::new).collect();
        let platforms = PlatformResolver::new()
            .with_mappings(&options.triplet_mappings)?
            .resolve_all(&triplets)?;

        let version = params
            .string(PACKAGE_VERSION)
            .map(PackageVersion::normalize)
            .transpose()?;
        let selector = staging_selector(&params.list(FEATURES), version.as_ref())?;
        let metadata = metadata_from(&params)?;

        Ok(PipelineContext {
            store: ArtifactStore::for_project(&options.project_root),
            project_root: options.project_root,
            params,
            platforms,
            selector,
            metadata,
            tools,
            produced: RefCell::new(Vec::new()),
        })
    }

    pub fn params(&self) -> &Parameters {
        &self.params
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    pub fn tools(&self) -> &Tools {
        &self.tools
    }

    /// Requested platforms, in the order they were given.
    pub fn platforms(&self) -> &[Platform] {
        &self.platforms
    }

    /// Name of the staging subtree for this run.
    pub fn selector(&self) -> Result<&str> {
        self.selector
            .as_deref()
            .with_context(|| format!("neither `{}` nor `{}` is set", FEATURES, PACKAGE_VERSION))
    }

    pub fn metadata(&self) -> Result<&PackageMetadata> {
        self.metadata.as_ref().with_context(|| {
            format!("package metadata is incomplete; set {}", METADATA_PARAMETERS.join(", "))
        })
    }

    /// vcpkg settings shared by every triplet of this run.
    pub fn build_options(&self) -> NativeBuildOptions {
        let root = &self.project_root;
        NativeBuildOptions {
            manifest_root: resolve_path(root, self.params.string(MANIFEST_ROOT).unwrap_or(".")),
            default_features: self.params.flag(DEFAULT_FEATURES),
            features: self.params.list(FEATURES),
            binary_sources: self.params.list(BINARY_SOURCES),
            overlay_ports: self
                .params
                .paths(OVERLAY_PORTS)
                .iter()
                .map(|p| root.join(p))
                .collect(),
            overlay_triplets: self
                .params
                .paths(OVERLAY_TRIPLETS)
                .iter()
                .map(|p| root.join(p))
                .collect(),
            debug: self.params.flag(DEBUG),
        }
    }

    pub(crate) fn record_output(&self, path: PathBuf) {
        self.produced.borrow_mut().push(path);
    }

    /// Package files produced by this run.
    pub fn produced(&self) -> Vec<PathBuf> {
        self.produced.borrow().clone()
    }
}

impl AsRef<Parameters> for PipelineContext {
    fn as_ref(&self) -> &Parameters {
        &self.params
    }
}

/// Metadata, when every field it needs is set.
fn metadata_from(params: &Parameters) -> Result<Option<PackageMetadata>> {
    if !METADATA_PARAMETERS.iter().all(|name| params.is_set(name)) {
        return Ok(None);
    }
    let metadata = PackageMetadata::new(
        field(params, PACKAGE_ID),
        field(params, PACKAGE_VERSION),
        field(params, AUTHORS),
        field(params, LICENSE),
        field(params, PROJECT_URL),
        field(params, REPOSITORY_URL),
    )?;
    Ok(Some(match params.string(DESCRIPTION) {
        Some(description) => metadata.with_description(description),
        None => metadata,
    }))
}

fn field<'a>(params: &'a Parameters, name: &str) -> &'a str {
    params.string(name).unwrap_or_default()
}

fn resolve_path(root: &Path, path: &str) -> PathBuf {
    // `join` keeps absolute paths as they are.
    root.join(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::platform::PlatformError;
    use crate::test_support::{FakeBuildTool, FakePackTool, FakePublisher, RecordingInstaller};

    fn tools() -> Tools {
        Tools {
            native: Box::new(FakeBuildTool::new()),
            packer: Box::new(FakePackTool::new()),
            publisher: Box::new(FakePublisher::new()),
            installer: Box::new(RecordingInstaller::new()),
        }
    }

    fn options() -> PipelineOptions {
        PipelineOptions {
            project_root: PathBuf::from("/project"),
            triplet_mappings: BTreeMap::new(),
        }
    }

    fn set(params: &mut Parameters, name: &str, value: &str) {
        params
            .set(name, ParameterValue::String(value.to_string()))
            .unwrap();
    }

    #[test]
    fn test_package_id_defaults_to_name() {
        let mut params = pipeline_parameters();
        set(&mut params, PACKAGE_NAME, "ffmpeg");
        let ctx = PipelineContext::new(params, options(), tools()).unwrap();
        assert_eq!(ctx.params().string(PACKAGE_ID), Some("ffmpeg"));

        let mut params = pipeline_parameters();
        set(&mut params, PACKAGE_NAME, "ffmpeg");
        set(&mut params, PACKAGE_ID, "FFmpeg.Native");
        let ctx = PipelineContext::new(params, options(), tools()).unwrap();
        assert_eq!(ctx.params().string(PACKAGE_ID), Some("FFmpeg.Native"));
    }

    #[test]
    fn test_selector_prefers_features() {
        let mut params = pipeline_parameters();
        set(&mut params, PACKAGE_VERSION, "6.1#2");
        let ctx = PipelineContext::new(params.clone(), options(), tools()).unwrap();
        assert_eq!(ctx.selector().unwrap(), "6.1.2");

        params
            .set(FEATURES, ParameterValue::List(vec!["full".into()]))
            .unwrap();
        let ctx = PipelineContext::new(params, options(), tools()).unwrap();
        assert_eq!(ctx.selector().unwrap(), "full");
    }

    #[test]
    fn test_unsupported_triplet_is_rejected_up_front() {
        let mut params = pipeline_parameters();
        params
            .set(TRIPLETS, ParameterValue::List(vec!["x64-linux".into(), "mips-plan9".into()]))
            .unwrap();
        let err = PipelineContext::new(params, options(), tools()).err().unwrap();
        assert!(matches!(
            err.downcast_ref::<PlatformError>(),
            Some(PlatformError::UnsupportedTriplet { .. })
        ));
    }

    #[test]
    fn test_mapped_runtime_cannot_leave_the_artifacts_tree() {
        let mut params = pipeline_parameters();
        params
            .set(TRIPLETS, ParameterValue::List(vec!["x64-custom".into()]))
            .unwrap();
        params
            .set(FEATURES, ParameterValue::List(vec!["full".into()]))
            .unwrap();

        for runtime in ["../../escape", ""] {
            let mut options = options();
            options
                .triplet_mappings
                .insert("x64-custom".to_string(), runtime.to_string());
            let err = PipelineContext::new(params.clone(), options, tools())
                .err()
                .unwrap();
            assert!(matches!(
                err.downcast_ref::<PlatformError>(),
                Some(PlatformError::InvalidRuntime { .. })
            ));
        }
    }

    #[test]
    fn test_feature_cannot_leave_the_artifacts_tree() {
        let mut params = pipeline_parameters();
        params
            .set(FEATURES, ParameterValue::List(vec!["../../escape".into()]))
            .unwrap();
        let err = PipelineContext::new(params, options(), tools()).err().unwrap();
        assert!(err.to_string().contains("cannot name a staging directory"));
    }

    #[test]
    fn test_metadata_only_when_complete() {
        let mut params = pipeline_parameters();
        set(&mut params, PACKAGE_VERSION, "1.0.0");
        set(&mut params, PACKAGE_ID, "Pkg");
        let ctx = PipelineContext::new(params.clone(), options(), tools()).unwrap();
        assert!(ctx.metadata().is_err());

        set(&mut params, AUTHORS, "Jane");
        set(&mut params, LICENSE, "MIT");
        set(&mut params, PROJECT_URL, "https://example.com");
        set(&mut params, REPOSITORY_URL, "not a url");
        assert!(PipelineContext::new(params.clone(), options(), tools()).is_err());

        set(&mut params, REPOSITORY_URL, "https://example.com/pkg.git");
        set(&mut params, DESCRIPTION, "Native Pkg.");
        let ctx = PipelineContext::new(params, options(), tools()).unwrap();
        assert_eq!(ctx.metadata().unwrap().umbrella_description(), "Native Pkg.");
    }

    #[test]
    fn test_build_options_resolve_against_project_root() {
        let mut params = pipeline_parameters();
        params
            .set(OVERLAY_PORTS, ParameterValue::Paths(vec![PathBuf::from("ports")]))
            .unwrap();
        let ctx = PipelineContext::new(params, options(), tools()).unwrap();
        let opts = ctx.build_options();
        assert_eq!(opts.manifest_root, PathBuf::from("/project/."));
        assert_eq!(opts.overlay_ports, vec![PathBuf::from("/project/ports")]);
        assert!(!opts.default_features);
    }
}
