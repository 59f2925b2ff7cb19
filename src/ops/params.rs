//! Parameters understood by the packaging pipeline.

use crate::graph::{GraphError, ParameterDef, ParameterValue, Parameters};
use crate::util::config::Config;

pub const PACKAGE_NAME: &str = "package-name";
pub const PACKAGE_VERSION: &str = "package-version";
pub const PACKAGE_ID: &str = "package-id";
pub const AUTHORS: &str = "authors";
pub const LICENSE: &str = "license";
pub const PROJECT_URL: &str = "project-url";
pub const REPOSITORY_URL: &str = "repository-url";
pub const DESCRIPTION: &str = "description";

pub const FEATURES: &str = "features";
pub const DEFAULT_FEATURES: &str = "default-features";
pub const TRIPLETS: &str = "triplets";
pub const BINARY_SOURCES: &str = "binary-sources";
pub const OVERLAY_PORTS: &str = "overlay-ports";
pub const OVERLAY_TRIPLETS: &str = "overlay-triplets";
pub const VCPKG_ROOT: &str = "vcpkg-root";
pub const MANIFEST_ROOT: &str = "manifest-root";
pub const PARALLEL: &str = "parallel";
pub const DEBUG: &str = "debug";

pub const SYSTEM_PACKAGES: &str = "system-packages";
pub const NUGET: &str = "nuget";
pub const API_KEY: &str = "api-key";
pub const FEED: &str = "feed";

/// Parameters every package manifest needs, besides the triplets.
pub const METADATA_PARAMETERS: &[&str] = &[
    PACKAGE_VERSION,
    PACKAGE_ID,
    AUTHORS,
    LICENSE,
    PROJECT_URL,
    REPOSITORY_URL,
];

/// Declarations of every pipeline parameter.
pub fn parameter_defs() -> Vec<ParameterDef> {
    vec![
        ParameterDef::string(PACKAGE_NAME).help("Name of the port to build"),
        ParameterDef::string(PACKAGE_VERSION)
            .help("Package version (defaults to the latest git tag)"),
        ParameterDef::string(PACKAGE_ID).help("Package identifier (defaults to the package name)"),
        ParameterDef::string(AUTHORS).help("Package authors"),
        ParameterDef::string(LICENSE).help("SPDX license expression"),
        ParameterDef::string(PROJECT_URL).help("Project home page"),
        ParameterDef::string(REPOSITORY_URL).help("Source repository URL"),
        ParameterDef::string(DESCRIPTION).help("Description of the multi-platform package"),
        ParameterDef::list(FEATURES).help("Port features to build"),
        ParameterDef::flag(DEFAULT_FEATURES).help("Keep the port's default features"),
        ParameterDef::list(TRIPLETS).help("vcpkg triplets to build"),
        ParameterDef::list(BINARY_SOURCES).help("vcpkg binary cache sources"),
        ParameterDef::paths(OVERLAY_PORTS).help("Overlay port directories"),
        ParameterDef::paths(OVERLAY_TRIPLETS).help("Overlay triplet directories"),
        ParameterDef::string(VCPKG_ROOT)
            .help("vcpkg checkout")
            .default_value(ParameterValue::String("vcpkg".to_string())),
        ParameterDef::string(MANIFEST_ROOT)
            .help("Directory containing vcpkg.json")
            .default_value(ParameterValue::String(".".to_string())),
        ParameterDef::flag(PARALLEL).help("Build triplets in parallel"),
        ParameterDef::flag(DEBUG).help("Pass --debug to vcpkg"),
        ParameterDef::list(SYSTEM_PACKAGES).help("OS packages needed by the native build"),
        ParameterDef::string(NUGET).help("NuGet CLI executable"),
        ParameterDef::string(API_KEY).help("Feed API key").secret(),
        ParameterDef::string(FEED).help("Package feed to publish to"),
    ]
}

/// An empty parameter set with every pipeline parameter declared.
pub fn pipeline_parameters() -> Parameters {
    Parameters::with_defs(parameter_defs())
}

/// Write every value set in `config` into `params`.
pub fn apply_config(config: &Config, params: &mut Parameters) -> Result<(), GraphError> {
    let strings = [
        (PACKAGE_NAME, &config.package.name),
        (PACKAGE_VERSION, &config.package.version),
        (PACKAGE_ID, &config.package.id),
        (AUTHORS, &config.package.authors),
        (LICENSE, &config.package.license),
        (PROJECT_URL, &config.package.project_url),
        (REPOSITORY_URL, &config.package.repository_url),
        (DESCRIPTION, &config.package.description),
        (VCPKG_ROOT, &config.vcpkg.root),
        (MANIFEST_ROOT, &config.vcpkg.manifest_root),
        (FEED, &config.publish.feed),
        (NUGET, &config.publish.nuget),
    ];
    for (name, value) in strings {
        if let Some(value) = value {
            params.set(name, ParameterValue::String(value.clone()))?;
        }
    }

    let lists = [
        (TRIPLETS, &config.vcpkg.triplets),
        (FEATURES, &config.vcpkg.features),
        (BINARY_SOURCES, &config.vcpkg.binary_sources),
        (SYSTEM_PACKAGES, &config.system.packages),
    ];
    for (name, value) in lists {
        if !value.is_empty() {
            params.set(name, ParameterValue::List(value.clone()))?;
        }
    }

    let paths = [
        (OVERLAY_PORTS, &config.vcpkg.overlay_ports),
        (OVERLAY_TRIPLETS, &config.vcpkg.overlay_triplets),
    ];
    for (name, value) in paths {
        if !value.is_empty() {
            params.set(name, ParameterValue::Paths(value.clone()))?;
        }
    }

    let flags = [
        (DEFAULT_FEATURES, config.vcpkg.default_features),
        (DEBUG, config.vcpkg.debug),
        (PARALLEL, config.vcpkg.parallel),
    ];
    for (name, value) in flags {
        if let Some(value) = value {
            params.set(name, ParameterValue::Bool(value))?;
        }
    }

    Ok(())
}
