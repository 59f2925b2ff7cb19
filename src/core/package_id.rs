//! Package identifiers and versions.
//!
//! Runtime package identifiers are derived, never configured:
//! `<base>.runtime.<rid>`. Versions are normalized once and the same
//! value then names staging directories, manifests and runtime graph ranges.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::platform::RuntimeId;

/// Maximum identifier length accepted by NuGet feeds.
const MAX_ID_LEN: usize = 100;

static PACKAGE_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\w+([_.-]\w+)*$").expect("valid package id regex"));

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PackageIdError {
    #[error("invalid package identifier `{0}`")]
    InvalidId(String),

    #[error("package identifier `{0}` is longer than {MAX_ID_LEN} characters")]
    TooLong(String),

    #[error("package version is empty")]
    EmptyVersion,
}

/// A validated package identifier (e.g. `FFmpeg`, `FFmpeg.runtime.linux-x64`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackageId(String);

impl PackageId {
    pub fn new(id: impl Into<String>) -> Result<Self, PackageIdError> {
        let id = id.into();
        if id.len() > MAX_ID_LEN {
            return Err(PackageIdError::TooLong(id));
        }
        if !PACKAGE_ID_RE.is_match(&id) {
            return Err(PackageIdError::InvalidId(id));
        }
        Ok(PackageId(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Identifier of the runtime package carrying this package's binaries for `runtime`.
    pub fn runtime_package(&self, runtime: &RuntimeId) -> PackageId {
        // Runtime identifiers are checked against [a-z0-9-] when resolved, so the
        // result stays valid.
        PackageId(format!("{}.runtime.{}", self.0, runtime))
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A package version normalized for the packaging ecosystem.
///
/// vcpkg writes port revisions as `1.2.3#4`; branch-derived labels can carry
/// `_` or `/`. None of those are legal in a package version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackageVersion(String);

impl PackageVersion {
    /// Normalize a raw version string. Pure string transform.
    pub fn normalize(raw: &str) -> Result<Self, PackageIdError> {
        let normalized: String = raw
            .trim()
            .chars()
            .map(|c| match c {
                '#' => '.',
                '_' | '/' => '-',
                other => other,
            })
            .collect();

        if normalized.is_empty() {
            return Err(PackageIdError::EmptyVersion);
        }
        Ok(PackageVersion(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Range that admits this version only.
    pub fn exact_range(&self) -> VersionRange {
        VersionRange::Exact(self.clone())
    }
}

impl fmt::Display for PackageVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Version range as written in runtime graphs and dependency lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionRange {
    Exact(PackageVersion),
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionRange::Exact(v) => write!(f, "[{}]", v),
        }
    }
}
