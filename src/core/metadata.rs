//! Package metadata shared by the runtime packages and the umbrella package.

use anyhow::{Context, Result};
use url::Url;

use crate::core::package_id::{PackageId, PackageVersion};
use crate::core::platform::RuntimeId;

/// Metadata every generated package manifest carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageMetadata {
    /// Umbrella package identifier; runtime package ids derive from it.
    pub id: PackageId,
    /// Normalized version used for every package in one run.
    pub version: PackageVersion,
    pub authors: String,
    /// SPDX license expression.
    pub license: String,
    /// Written to manifests exactly as given.
    pub project_url: String,
    pub repository_url: String,
    /// Overrides the generated umbrella description.
    pub description: Option<String>,
}

impl PackageMetadata {
    /// Build metadata from raw strings, validating the identifier and URLs.
    pub fn new(
        id: &str,
        raw_version: &str,
        authors: &str,
        license: &str,
        project_url: &str,
        repository_url: &str,
    ) -> Result<Self> {
        let id = PackageId::new(id)?;
        let version = PackageVersion::normalize(raw_version)?;
        Url::parse(project_url)
            .with_context(|| format!("invalid project URL `{}`", project_url))?;
        Url::parse(repository_url)
            .with_context(|| format!("invalid repository URL `{}`", repository_url))?;

        Ok(PackageMetadata {
            id,
            version,
            authors: authors.to_string(),
            license: license.to_string(),
            project_url: project_url.to_string(),
            repository_url: repository_url.to_string(),
            description: None,
        })
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn copyright(&self) -> String {
        format!("Copyright © {}", self.authors)
    }

    pub fn umbrella_description(&self) -> String {
        self.description
            .clone()
            .unwrap_or_else(|| format!("Multi-platform native library for {}.", self.id))
    }

    pub fn runtime_description(&self, runtime: &RuntimeId) -> String {
        format!("{} runtime library for {}.", runtime, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata() -> PackageMetadata {
        PackageMetadata::new(
            "FFmpeg",
            "6.1#1",
            "Jane Doe",
            "LGPL-2.1-or-later",
            "https://example.com/ffmpeg",
            "https://example.com/ffmpeg.git",
        )
        .unwrap()
    }

    #[test]
    fn test_metadata_normalizes_version() {
        assert_eq!(metadata().version.as_str(), "6.1.1");
    }

    #[test]
    fn test_descriptions() {
        let meta = metadata();
        assert_eq!(
            meta.runtime_description(&RuntimeId::new("win-x64")),
            "win-x64 runtime library for FFmpeg."
        );
        assert_eq!(meta.umbrella_description(), "Multi-platform native library for FFmpeg.");
        assert_eq!(
            meta.with_description("Custom").umbrella_description(),
            "Custom"
        );
    }

    #[test]
    fn test_rejects_bad_url() {
        let err = PackageMetadata::new("X", "1.0", "a", "MIT", "not a url", "https://x.y").unwrap_err();
        assert!(err.to_string().contains("invalid project URL"));
    }

    #[test]
    fn test_urls_are_kept_verbatim() {
        let meta = PackageMetadata::new(
            "X",
            "1.0",
            "a",
            "MIT",
            "https://example.com",
            "https://example.com/x.git",
        )
        .unwrap();
        assert_eq!(meta.project_url, "https://example.com");
        assert_eq!(meta.repository_url, "https://example.com/x.git");
    }
}
