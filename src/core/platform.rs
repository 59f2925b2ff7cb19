//! Platform identity - vcpkg triplets and the runtime identifiers consumers see.
//!
//! A triplet names a build platform (architecture, OS, linkage, configuration).
//! Package consumers select native binaries by runtime identifier instead, so
//! every triplet we build must map to exactly one runtime identifier. The
//! mapping is a closed table: an unknown triplet is a configuration error,
//! never a guess.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::LazyLock;

use miette::Diagnostic as MietteDiagnostic;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Built-in triplet to runtime identifier table.
const RUNTIME_TABLE: &[(&str, &str)] = &[
    ("x64-linux", "linux-x64"),
    ("x64-linux-dynamic", "linux-x64"),
    ("x64-linux-release", "linux-x64"),
    ("x64-linux-dynamic-release", "linux-x64"),
    ("arm64-linux", "linux-arm64"),
    ("arm64-linux-dynamic", "linux-arm64"),
    ("arm64-linux-dynamic-release", "linux-arm64"),
    ("x64-windows", "win-x64"),
    ("x64-windows-release", "win-x64"),
    ("x86-windows", "win-x86"),
    ("x86-windows-release", "win-x86"),
    ("arm64-windows", "win-arm64"),
    ("arm64-windows-release", "win-arm64"),
    ("x64-osx-dynamic", "osx-x64"),
    ("x64-osx-dynamic-release", "osx-x64"),
    ("arm64-osx-dynamic", "osx-arm64"),
    ("arm64-osx-dynamic-release", "osx-arm64"),
];

/// Runtime identifiers name staging directories and package ids, so they
/// stay a single lowercase path component.
static RUNTIME_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]+(-[a-z0-9]+)*$").expect("valid runtime id regex"));

/// Triplet names also end up in paths and archive names.
static TRIPLET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9_]+(-[a-z0-9_]+)*$").expect("valid triplet regex"));

/// Errors raised while resolving platforms.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum PlatformError {
    #[error("the vcpkg triplet `{triplet}` is not supported")]
    #[diagnostic(
        code(nativepack::platform::unsupported),
        help("map it to a runtime identifier in the [triplets] table of nativepack.toml")
    )]
    UnsupportedTriplet { triplet: String },

    #[error("triplet `{triplet}` is mapped to invalid runtime identifier `{runtime}`")]
    #[diagnostic(
        code(nativepack::platform::invalid_runtime),
        help("runtime identifiers are lowercase words joined by `-`, such as `linux-x64`")
    )]
    InvalidRuntime { triplet: String, runtime: String },

    #[error("invalid triplet name `{triplet}` in the [triplets] table")]
    #[diagnostic(code(nativepack::platform::invalid_triplet))]
    InvalidTriplet { triplet: String },

    #[error("triplets `{first}` and `{second}` both map to runtime `{runtime}`")]
    #[diagnostic(code(nativepack::platform::duplicate_runtime))]
    DuplicateRuntime {
        first: String,
        second: String,
        runtime: String,
    },
}

/// An opaque vcpkg triplet such as `x64-linux-dynamic-release`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Triplet(String);

impl Triplet {
    pub fn new(name: impl Into<String>) -> Self {
        Triplet(name.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Triplet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Triplet {
    fn from(s: &str) -> Self {
        Triplet::new(s)
    }
}

/// Consumer-facing runtime identifier such as `linux-x64` or `win-x86`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuntimeId(String);

impl RuntimeId {
    pub fn new(name: impl Into<String>) -> Self {
        RuntimeId(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The operating system part of the identifier (`linux`, `win`, `osx`).
    pub fn os(&self) -> &str {
        self.0.split('-').next().unwrap_or(&self.0)
    }

    /// Glob patterns, relative to a triplet install directory, that match the
    /// shared libraries a runtime package for this platform ships.
    pub fn library_patterns(&self) -> &'static [&'static str] {
        match self.os() {
            "win" => &["bin/*.dll"],
            "osx" => &["lib/*.dylib"],
            _ => &["lib/*.so*"],
        }
    }
}

impl fmt::Display for RuntimeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A triplet together with the runtime identifier it resolved to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Platform {
    pub triplet: Triplet,
    pub runtime: RuntimeId,
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.triplet, self.runtime)
    }
}

/// Maps triplets to runtime identifiers.
///
/// The built-in table can be extended with explicit entries (for overlay
/// triplets); extensions never make the lookup fall back to guessing.
#[derive(Debug, Clone, Default)]
pub struct PlatformResolver {
    extra: HashMap<String, RuntimeId>,
}

impl PlatformResolver {
    pub fn new() -> Self {
        PlatformResolver::default()
    }

    /// Add explicit triplet mappings on top of the built-in table.
    ///
    /// Both sides are checked before any of them is accepted.
    pub fn with_mappings(
        mut self,
        mappings: &BTreeMap<String, String>,
    ) -> Result<Self, PlatformError> {
        for (triplet, runtime) in mappings {
            let triplet = triplet.trim();
            let runtime = runtime.trim();
            if !TRIPLET_RE.is_match(triplet) {
                return Err(PlatformError::InvalidTriplet {
                    triplet: triplet.to_string(),
                });
            }
            if !RUNTIME_ID_RE.is_match(runtime) {
                return Err(PlatformError::InvalidRuntime {
                    triplet: triplet.to_string(),
                    runtime: runtime.to_string(),
                });
            }
            self.extra
                .insert(triplet.to_string(), RuntimeId::new(runtime));
        }
        Ok(self)
    }

    /// Runtime identifier for a triplet.
    pub fn runtime_id(&self, triplet: &Triplet) -> Result<RuntimeId, PlatformError> {
        if let Some(runtime) = self.extra.get(triplet.as_str()) {
            return Ok(runtime.clone());
        }

        RUNTIME_TABLE
            .iter()
            .find(|(name, _)| *name == triplet.as_str())
            .map(|(_, runtime)| RuntimeId::new(*runtime))
            .ok_or_else(|| PlatformError::UnsupportedTriplet {
                triplet: triplet.to_string(),
            })
    }

    /// Resolve a single triplet.
    pub fn resolve(&self, triplet: &Triplet) -> Result<Platform, PlatformError> {
        Ok(Platform {
            triplet: triplet.clone(),
            runtime: self.runtime_id(triplet)?,
        })
    }

    /// Resolve a list of triplets, keeping the caller's order.
    ///
    /// Fails on the first unsupported triplet, and when two triplets would
    /// share a runtime identifier (their staging roots would collide).
    pub fn resolve_all(&self, triplets: &[Triplet]) -> Result<Vec<Platform>, PlatformError> {
        let mut seen: HashMap<RuntimeId, Triplet> = HashMap::new();
        let mut platforms = Vec::with_capacity(triplets.len());

        for triplet in triplets {
            let platform = self.resolve(triplet)?;
            if let Some(first) = seen.get(&platform.runtime) {
                if first == triplet {
                    continue;
                }
                return Err(PlatformError::DuplicateRuntime {
                    first: first.to_string(),
                    second: triplet.to_string(),
                    runtime: platform.runtime.to_string(),
                });
            }
            seen.insert(platform.runtime.clone(), triplet.clone());
            platforms.push(platform);
        }

        Ok(platforms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_triplets() {
        let resolver = PlatformResolver::new();
        let cases = [
            ("x64-linux-dynamic-release", "linux-x64"),
            ("x64-windows-release", "win-x64"),
            ("x86-windows-release", "win-x86"),
            ("x64-linux", "linux-x64"),
            ("x64-windows", "win-x64"),
        ];
        for (triplet, runtime) in cases {
            let rid = resolver.runtime_id(&Triplet::new(triplet)).unwrap();
            assert_eq!(rid.as_str(), runtime);
            // Same answer every time.
            assert_eq!(resolver.runtime_id(&Triplet::new(triplet)).unwrap(), rid);
        }
    }

    #[test]
    fn test_unknown_triplet_fails_closed() {
        let resolver = PlatformResolver::new();
        let err = resolver
            .runtime_id(&Triplet::new("riscv64-haiku"))
            .unwrap_err();
        assert!(matches!(err, PlatformError::UnsupportedTriplet { .. }));
        assert!(err.to_string().contains("riscv64-haiku"));
    }

    #[test]
    fn test_extra_mappings() {
        let mut extra = BTreeMap::new();
        extra.insert("x64-linux-custom".to_string(), "linux-x64".to_string());
        let resolver = PlatformResolver::new().with_mappings(&extra).unwrap();

        let platform = resolver.resolve(&Triplet::new("x64-linux-custom")).unwrap();
        assert_eq!(platform.runtime.as_str(), "linux-x64");
    }

    #[test]
    fn test_mapped_runtime_must_be_a_path_component() {
        for runtime in ["../../escape", "", "linux/x64", "Linux-X64", "linux-"] {
            let mut extra = BTreeMap::new();
            extra.insert("x64-custom".to_string(), runtime.to_string());
            let err = PlatformResolver::new().with_mappings(&extra).unwrap_err();
            assert!(
                matches!(err, PlatformError::InvalidRuntime { .. }),
                "{:?} was accepted",
                runtime
            );
        }
    }

    #[test]
    fn test_mapped_triplet_must_be_a_path_component() {
        let mut extra = BTreeMap::new();
        extra.insert("../x64-custom".to_string(), "linux-x64".to_string());
        let err = PlatformResolver::new().with_mappings(&extra).unwrap_err();
        assert!(matches!(err, PlatformError::InvalidTriplet { .. }));
    }

    #[test]
    fn test_resolve_all_keeps_order_and_rejects_shared_runtime() {
        let resolver = PlatformResolver::new();
        let triplets = vec![Triplet::new("x64-windows"), Triplet::new("x64-linux")];
        let platforms = resolver.resolve_all(&triplets).unwrap();
        assert_eq!(platforms[0].runtime.as_str(), "win-x64");
        assert_eq!(platforms[1].runtime.as_str(), "linux-x64");

        let clash = vec![Triplet::new("x64-linux"), Triplet::new("x64-linux-dynamic")];
        let err = resolver.resolve_all(&clash).unwrap_err();
        assert!(matches!(err, PlatformError::DuplicateRuntime { .. }));
    }

    #[test]
    fn test_repeated_triplet_is_deduplicated() {
        let resolver = PlatformResolver::new();
        let triplets = vec![Triplet::new("x64-linux"), Triplet::new("x64-linux")];
        assert_eq!(resolver.resolve_all(&triplets).unwrap().len(), 1);
    }

    #[test]
    fn test_library_patterns() {
        assert_eq!(RuntimeId::new("win-x64").library_patterns(), &["bin/*.dll"]);
        assert_eq!(RuntimeId::new("linux-arm64").library_patterns(), &["lib/*.so*"]);
        assert_eq!(RuntimeId::new("osx-x64").library_patterns(), &["lib/*.dylib"]);
    }
}
