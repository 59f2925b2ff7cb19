//! Configuration file support for nativepack.
//!
//! nativepack reads two configuration files:
//! - Global: `~/.nativepack/config.toml` - user-wide defaults (authors, feed)
//! - Project: `nativepack.toml` at the project root
//!
//! Project config takes precedence over global config. Environment variables
//! and command-line flags take precedence over both; the CLI applies them on
//! top of the configured values.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// File name of the project configuration.
pub const PROJECT_CONFIG_FILE: &str = "nativepack.toml";

/// nativepack configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Package metadata
    pub package: PackageConfig,

    /// Native build settings
    pub vcpkg: VcpkgConfig,

    /// Extra triplet -> runtime identifier mappings
    pub triplets: BTreeMap<String, String>,

    /// OS prerequisites of the native build
    pub system: SystemConfig,

    /// Publishing settings
    pub publish: PublishConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct PackageConfig {
    pub name: Option<String>,
    pub version: Option<String>,
    pub id: Option<String>,
    pub authors: Option<String>,
    pub license: Option<String>,
    pub project_url: Option<String>,
    pub repository_url: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct VcpkgConfig {
    /// vcpkg checkout, relative to the project root
    pub root: Option<String>,
    /// Directory containing vcpkg.json
    pub manifest_root: Option<String>,
    pub triplets: Vec<String>,
    pub features: Vec<String>,
    pub default_features: Option<bool>,
    pub binary_sources: Vec<String>,
    pub overlay_ports: Vec<PathBuf>,
    pub overlay_triplets: Vec<PathBuf>,
    pub debug: Option<bool>,
    pub parallel: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    /// Packages installed by `setup-build-dependencies`
    pub packages: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishConfig {
    pub feed: Option<String>,
    /// NuGet CLI executable
    pub nuget: Option<String>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration, or defaults if the file doesn't exist.
    pub fn load_if_exists(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Merge another config into this one (other takes precedence).
    ///
    /// Lists are replaced, not appended; mappings are merged per key.
    pub fn merge(&mut self, other: Config) {
        let pkg = other.package;
        merge_option(&mut self.package.name, pkg.name);
        merge_option(&mut self.package.version, pkg.version);
        merge_option(&mut self.package.id, pkg.id);
        merge_option(&mut self.package.authors, pkg.authors);
        merge_option(&mut self.package.license, pkg.license);
        merge_option(&mut self.package.project_url, pkg.project_url);
        merge_option(&mut self.package.repository_url, pkg.repository_url);
        merge_option(&mut self.package.description, pkg.description);

        let vcpkg = other.vcpkg;
        merge_option(&mut self.vcpkg.root, vcpkg.root);
        merge_option(&mut self.vcpkg.manifest_root, vcpkg.manifest_root);
        merge_list(&mut self.vcpkg.triplets, vcpkg.triplets);
        merge_list(&mut self.vcpkg.features, vcpkg.features);
        merge_option(&mut self.vcpkg.default_features, vcpkg.default_features);
        merge_list(&mut self.vcpkg.binary_sources, vcpkg.binary_sources);
        merge_list(&mut self.vcpkg.overlay_ports, vcpkg.overlay_ports);
        merge_list(&mut self.vcpkg.overlay_triplets, vcpkg.overlay_triplets);
        merge_option(&mut self.vcpkg.debug, vcpkg.debug);
        merge_option(&mut self.vcpkg.parallel, vcpkg.parallel);

        self.triplets.extend(other.triplets);
        merge_list(&mut self.system.packages, other.system.packages);

        merge_option(&mut self.publish.feed, other.publish.feed);
        merge_option(&mut self.publish.nuget, other.publish.nuget);
    }
}

fn merge_option<T>(slot: &mut Option<T>, other: Option<T>) {
    if other.is_some() {
        *slot = other;
    }
}

fn merge_list<T>(slot: &mut Vec<T>, other: Vec<T>) {
    if !other.is_empty() {
        *slot = other;
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (nativepack.toml)
/// 2. Global config (~/.nativepack/config.toml)
/// 3. Defaults
///
/// Unlike a missing file, a malformed one is an error.
pub fn load_config(global_path: Option<&Path>, project_path: &Path) -> Result<Config> {
    let mut config = Config::default();

    if let Some(global_path) = global_path {
        config.merge(Config::load_if_exists(global_path)?);
    }
    config.merge(Config::load_if_exists(project_path)?);

    Ok(config)
}

/// Get the global nativepack config directory (~/.nativepack).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".nativepack"))
}

/// Get the global config path (~/.nativepack/config.toml).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}
