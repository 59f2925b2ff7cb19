//! OS package installation for native build prerequisites.
//!
//! Installing packages is privileged, so the pipeline only ever talks to the
//! [`SystemPackageInstaller`] it was given.

use anyhow::{Context, Result};

use crate::util::process::{find_executable, ProcessBuilder};

/// Installs named OS packages.
pub trait SystemPackageInstaller {
    fn install(&self, packages: &[String]) -> Result<()>;
}

/// `apt-get` through `sudo`.
#[derive(Debug, Clone, Default)]
pub struct AptInstaller;

impl AptInstaller {
    pub fn update_command(&self) -> ProcessBuilder {
        ProcessBuilder::new("sudo").arg("apt-get").arg("update")
    }

    pub fn install_command(&self, packages: &[String]) -> ProcessBuilder {
        ProcessBuilder::new("sudo")
            .args(["apt-get", "-y", "install"])
            .args(packages)
    }
}

impl SystemPackageInstaller for AptInstaller {
    fn install(&self, packages: &[String]) -> Result<()> {
        if packages.is_empty() {
            return Ok(());
        }
        self.update_command()
            .run()
            .context("failed to update the apt package index")?;
        self.install_command(packages)
            .run()
            .with_context(|| format!("failed to install {}", packages.join(", ")))
    }
}

/// Installer for hosts without a supported package manager.
#[derive(Debug, Clone, Default)]
pub struct NoopInstaller;

impl SystemPackageInstaller for NoopInstaller {
    fn install(&self, packages: &[String]) -> Result<()> {
        if !packages.is_empty() {
            tracing::warn!(
                "no system package manager available; not installing {}",
                packages.join(", ")
            );
        }
        Ok(())
    }
}

/// The installer for the host: apt on Linux when available, otherwise none.
pub fn host_installer() -> Box<dyn SystemPackageInstaller> {
    if cfg!(target_os = "linux") && find_executable("apt-get").is_some() {
        Box::new(AptInstaller)
    } else {
        Box::new(NoopInstaller)
    }
}
