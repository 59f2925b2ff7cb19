//! Global context for nativepack operations.
//!
//! Provides centralized access to the working directory, the project root
//! and the configuration files.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::util::config::{global_config_dir, load_config, Config, PROJECT_CONFIG_FILE};

/// Global context containing paths and output preferences.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    /// Current working directory
    cwd: PathBuf,

    /// Project root: the directory holding nativepack.toml, or the cwd
    project_root: PathBuf,

    /// Home directory for global nativepack data (~/.nativepack/)
    home: Option<PathBuf>,

    /// Whether to use verbose output
    verbose: bool,
}

impl GlobalContext {
    /// Create a GlobalContext for the process working directory.
    pub fn new() -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;
        Ok(Self::with_cwd(cwd))
    }

    /// Create a GlobalContext with a specific working directory.
    ///
    /// The project root is the nearest ancestor containing nativepack.toml.
    pub fn with_cwd(cwd: PathBuf) -> Self {
        let project_root = find_project_root(&cwd).unwrap_or_else(|| cwd.clone());
        GlobalContext {
            cwd,
            project_root,
            home: global_config_dir(),
            verbose: false,
        }
    }

    /// Use an explicit project root instead of searching for one.
    pub fn with_project_root(mut self, root: PathBuf) -> Self {
        self.project_root = if root.is_absolute() {
            root
        } else {
            self.cwd.join(root)
        };
        self
    }

    /// Override the global data directory.
    pub fn with_home(mut self, home: Option<PathBuf>) -> Self {
        self.home = home;
        self
    }

    /// Set verbose mode.
    pub fn set_verbose(&mut self, verbose: bool) {
        self.verbose = verbose;
    }

    /// Get the current working directory.
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Get the nativepack home directory (~/.nativepack/).
    pub fn home(&self) -> Option<&Path> {
        self.home.as_deref()
    }

    /// Get the global configuration file path.
    pub fn config_path(&self) -> Option<PathBuf> {
        self.home.as_ref().map(|home| home.join("config.toml"))
    }

    /// Get the project configuration file path.
    pub fn project_config_path(&self) -> PathBuf {
        self.project_root.join(PROJECT_CONFIG_FILE)
    }

    /// Load the merged global and project configuration.
    pub fn load_config(&self) -> Result<Config> {
        load_config(self.config_path().as_deref(), &self.project_config_path())
    }

    /// Check if verbose mode is enabled.
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Nearest directory at or above `start` that contains nativepack.toml.
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(PROJECT_CONFIG_FILE).is_file())
        .map(Path::to_path_buf)
}
