//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell as CompletionShell;

use nativepack::graph::{GraphError, ParameterValue, Parameters};
use nativepack::ops::params::*;
use nativepack::util::shell::ColorChoice;

/// nativepack - build native libraries with vcpkg and ship them as NuGet packages
#[derive(Parser)]
#[command(name = "nativepack")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Coloring of the output
    #[arg(long, global = true, value_enum, default_value_t = ColorArg::Auto)]
    pub color: ColorArg,

    /// Project root (defaults to the nearest directory holding nativepack.toml)
    #[arg(long, global = true, env = "NATIVEPACK_ROOT")]
    pub root: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run targets of the packaging pipeline
    Run(RunArgs),

    /// List the available targets
    List,

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorArg {
    Auto,
    Always,
    Never,
}

impl From<ColorArg> for ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => ColorChoice::Auto,
            ColorArg::Always => ColorChoice::Always,
            ColorArg::Never => ColorChoice::Never,
        }
    }
}

#[derive(Args)]
pub struct RunArgs {
    /// Targets to run (defaults to build-multiplatform-package)
    pub targets: Vec<String>,

    /// Print the resolved execution order and stop
    #[arg(long)]
    pub plan: bool,

    #[command(flatten)]
    pub params: ParameterArgs,
}

/// Pipeline parameters. Each flag can also be set from a `NATIVEPACK_*`
/// environment variable.
#[derive(Args, Default)]
pub struct ParameterArgs {
    /// Name of the port to build
    #[arg(long, env = "NATIVEPACK_PACKAGE_NAME")]
    pub package_name: Option<String>,

    /// Package version (defaults to the latest git tag)
    #[arg(long, env = "NATIVEPACK_PACKAGE_VERSION")]
    pub package_version: Option<String>,

    /// Package identifier (defaults to the package name)
    #[arg(long, env = "NATIVEPACK_PACKAGE_ID")]
    pub package_id: Option<String>,

    /// Package authors
    #[arg(long, env = "NATIVEPACK_AUTHORS")]
    pub authors: Option<String>,

    /// SPDX license expression
    #[arg(long, env = "NATIVEPACK_LICENSE")]
    pub license: Option<String>,

    /// Project home page
    #[arg(long, env = "NATIVEPACK_PROJECT_URL")]
    pub project_url: Option<String>,

    /// Source repository URL
    #[arg(long, env = "NATIVEPACK_REPOSITORY_URL")]
    pub repository_url: Option<String>,

    /// Description of the multi-platform package
    #[arg(long, env = "NATIVEPACK_DESCRIPTION")]
    pub description: Option<String>,

    /// Port features to build (comma separated)
    #[arg(long, env = "NATIVEPACK_FEATURES", value_delimiter = ',')]
    pub features: Vec<String>,

    /// Keep the port's default features
    #[arg(long, env = "NATIVEPACK_DEFAULT_FEATURES")]
    pub default_features: bool,

    /// vcpkg triplets to build (comma separated)
    #[arg(long, env = "NATIVEPACK_TRIPLETS", value_delimiter = ',')]
    pub triplets: Vec<String>,

    /// vcpkg binary cache sources (semicolon separated)
    #[arg(long, env = "NATIVEPACK_BINARY_SOURCES", value_delimiter = ';')]
    pub binary_sources: Vec<String>,

    /// Overlay port directory (repeatable)
    #[arg(long = "overlay-port", env = "NATIVEPACK_OVERLAY_PORTS", value_delimiter = ';')]
    pub overlay_ports: Vec<PathBuf>,

    /// Overlay triplet directory (repeatable)
    #[arg(long = "overlay-triplet", env = "NATIVEPACK_OVERLAY_TRIPLETS", value_delimiter = ';')]
    pub overlay_triplets: Vec<PathBuf>,

    /// vcpkg checkout
    #[arg(long, env = "NATIVEPACK_VCPKG_ROOT")]
    pub vcpkg_root: Option<String>,

    /// Directory containing vcpkg.json
    #[arg(long, env = "NATIVEPACK_MANIFEST_ROOT")]
    pub manifest_root: Option<String>,

    /// Build triplets in parallel
    #[arg(long, env = "NATIVEPACK_PARALLEL")]
    pub parallel: bool,

    /// Pass --debug to vcpkg
    #[arg(long, env = "NATIVEPACK_DEBUG")]
    pub debug: bool,

    /// OS packages needed by the native build (comma separated)
    #[arg(long, env = "NATIVEPACK_SYSTEM_PACKAGES", value_delimiter = ',')]
    pub system_packages: Vec<String>,

    /// NuGet CLI executable
    #[arg(long, env = "NATIVEPACK_NUGET")]
    pub nuget: Option<String>,

    /// Feed API key
    #[arg(long, env = "NATIVEPACK_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Package feed to publish to
    #[arg(long, env = "NATIVEPACK_FEED")]
    pub feed: Option<String>,
}

impl ParameterArgs {
    /// Write every supplied flag into `params`, over whatever config set.
    pub fn apply(&self, params: &mut Parameters) -> Result<(), GraphError> {
        let strings = [
            (PACKAGE_NAME, &self.package_name),
            (PACKAGE_VERSION, &self.package_version),
            (PACKAGE_ID, &self.package_id),
            (AUTHORS, &self.authors),
            (LICENSE, &self.license),
            (PROJECT_URL, &self.project_url),
            (REPOSITORY_URL, &self.repository_url),
            (DESCRIPTION, &self.description),
            (VCPKG_ROOT, &self.vcpkg_root),
            (MANIFEST_ROOT, &self.manifest_root),
            (NUGET, &self.nuget),
            (API_KEY, &self.api_key),
            (FEED, &self.feed),
        ];
        for (name, value) in strings {
            if let Some(value) = value {
                params.set(name, ParameterValue::String(value.clone()))?;
            }
        }

        let lists = [
            (FEATURES, &self.features),
            (TRIPLETS, &self.triplets),
            (BINARY_SOURCES, &self.binary_sources),
            (SYSTEM_PACKAGES, &self.system_packages),
        ];
        for (name, value) in lists {
            if !value.is_empty() {
                params.set(name, ParameterValue::List(value.clone()))?;
            }
        }

        let paths = [
            (OVERLAY_PORTS, &self.overlay_ports),
            (OVERLAY_TRIPLETS, &self.overlay_triplets),
        ];
        for (name, value) in paths {
            if !value.is_empty() {
                params.set(name, ParameterValue::Paths(value.clone()))?;
            }
        }

        // Flags can only switch a setting on; config decides otherwise.
        let flags = [
            (DEFAULT_FEATURES, self.default_features),
            (PARALLEL, self.parallel),
            (DEBUG, self.debug),
        ];
        for (name, value) in flags {
            if value {
                params.set(name, ParameterValue::Bool(true))?;
            }
        }

        Ok(())
    }
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: CompletionShell,
}
