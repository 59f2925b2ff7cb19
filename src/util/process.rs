//! Subprocess execution utilities.

use std::collections::HashSet;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

use anyhow::{bail, Context, Result};

/// Placeholder printed instead of secret arguments.
const REDACTED: &str = "***";

/// Builder for subprocess execution.
#[derive(Debug, Clone)]
pub struct ProcessBuilder {
    program: PathBuf,
    args: Vec<String>,
    /// Indices into `args` that must never be displayed.
    secret_args: HashSet<usize>,
    cwd: Option<PathBuf>,
}

impl ProcessBuilder {
    /// Create a new process builder for the given program.
    pub fn new(program: impl AsRef<Path>) -> Self {
        ProcessBuilder {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
            secret_args: HashSet::new(),
            cwd: None,
        }
    }

    /// Add a single argument.
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_string_lossy().into_owned());
        self
    }

    /// Add an argument that is hidden in logs and error messages.
    pub fn secret_arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.secret_args.insert(self.args.len());
        self.arg(arg)
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args.extend(
            args.into_iter()
                .map(|s| s.as_ref().to_string_lossy().into_owned()),
        );
        self
    }

    /// Set the working directory.
    pub fn cwd(mut self, cwd: impl AsRef<Path>) -> Self {
        self.cwd = Some(cwd.as_ref().to_path_buf());
        self
    }

    /// Get the arguments.
    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    /// Get the working directory.
    pub fn get_cwd(&self) -> Option<&Path> {
        self.cwd.as_deref()
    }

    fn build_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);

        if let Some(ref cwd) = self.cwd {
            cmd.current_dir(cwd);
        }

        cmd
    }

    /// Execute with inherited stdio and return the exit status.
    pub fn status(&self) -> Result<ExitStatus> {
        let mut cmd = self.build_command();
        let status = cmd
            .status()
            .with_context(|| format!("failed to execute `{}`", self.program.display()))?;
        Ok(status)
    }

    /// Execute with inherited stdio and require success.
    ///
    /// Long-running tools stream their own output; only the exit code matters.
    pub fn run(&self) -> Result<()> {
        tracing::info!("running {}", self.display_command());
        let status = self.status()?;
        if !status.success() {
            bail!(
                "`{}` failed with exit code {:?}",
                self.display_command(),
                status.code()
            );
        }
        Ok(())
    }

    /// Display the command for logs and error messages, secrets redacted.
    pub fn display_command(&self) -> String {
        let mut parts = vec![self.program.display().to_string()];
        parts.extend(self.args.iter().enumerate().map(|(i, arg)| {
            if self.secret_args.contains(&i) {
                REDACTED.to_string()
            } else {
                arg.clone()
            }
        }));
        parts.join(" ")
    }
}

/// Find an executable in PATH.
pub fn find_executable(name: &str) -> Option<PathBuf> {
    which::which(name).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn test_run_succeeds_in_working_directory() {
        let tmp = tempfile::TempDir::new().unwrap();
        ProcessBuilder::new("touch")
            .arg("marker")
            .cwd(tmp.path())
            .run()
            .unwrap();

        assert!(tmp.path().join("marker").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_run_reports_failure() {
        let err = ProcessBuilder::new("false").run().unwrap_err();
        assert!(err.to_string().contains("`false` failed"));
    }

    #[test]
    fn test_display_command() {
        let pb = ProcessBuilder::new("vcpkg").args(["install", "--triplet=x64-linux"]);

        assert_eq!(pb.display_command(), "vcpkg install --triplet=x64-linux");
    }

    #[test]
    fn test_secret_args_are_redacted() {
        let pb = ProcessBuilder::new("nuget")
            .arg("push")
            .arg("-ApiKey")
            .secret_arg("abc123")
            .arg("-NonInteractive");

        assert_eq!(pb.display_command(), "nuget push -ApiKey *** -NonInteractive");
        assert_eq!(pb.get_args()[2], "abc123");
    }
}
