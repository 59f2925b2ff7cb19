//! Runtime graph document (`runtime.json`).
//!
//! Maps each runtime identifier to the runtime package the umbrella package
//! needs on that platform:
//!
//! ```json
//! {
//!   "runtimes": {
//!     "linux-x64": {
//!       "#import": [],
//!       "FFmpeg": { "FFmpeg.runtime.linux-x64": "[6.1.1]" }
//!     }
//!   }
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::package_id::{PackageId, PackageVersion};
use crate::core::platform::{Platform, RuntimeId};
use crate::util::fs::write_string;

/// Name of the runtime graph file inside the umbrella package.
pub const RUNTIME_GRAPH_FILE: &str = "runtime.json";

/// Dependencies of one runtime: owner package -> (dependency -> version range).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeDescription {
    /// Runtimes this one inherits from. We never inherit.
    #[serde(rename = "#import", default)]
    pub imports: Vec<RuntimeId>,
    #[serde(flatten)]
    pub dependency_sets: BTreeMap<PackageId, BTreeMap<PackageId, String>>,
}

/// The runtime graph, keyed (and therefore written) in runtime identifier order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeGraph {
    pub runtimes: BTreeMap<RuntimeId, RuntimeDescription>,
}

impl RuntimeGraph {
    /// One entry per platform, each pinning its runtime package to `version`.
    pub fn for_platforms(owner: &PackageId, platforms: &[Platform], version: &PackageVersion) -> Self {
        let range = version.exact_range().to_string();
        let runtimes = platforms
            .iter()
            .map(|platform| {
                let mut dependencies = BTreeMap::new();
                dependencies.insert(owner.runtime_package(&platform.runtime), range.clone());

                let mut dependency_sets = BTreeMap::new();
                dependency_sets.insert(owner.clone(), dependencies);

                (
                    platform.runtime.clone(),
                    RuntimeDescription {
                        imports: Vec::new(),
                        dependency_sets,
                    },
                )
            })
            .collect();

        RuntimeGraph { runtimes }
    }

    pub fn len(&self) -> usize {
        self.runtimes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runtimes.is_empty()
    }

    /// Dependencies declared for one runtime.
    pub fn dependencies(&self, runtime: &RuntimeId) -> Vec<(&PackageId, &str)> {
        self.runtimes
            .get(runtime)
            .map(|desc| {
                desc.dependency_sets
                    .values()
                    .flat_map(|deps| deps.iter().map(|(id, range)| (id, range.as_str())))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn to_json(&self) -> Result<String> {
        let mut json =
            serde_json::to_string_pretty(self).context("failed to serialize runtime graph")?;
        json.push('\n');
        Ok(json)
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        write_string(path, &self.to_json()?)
    }
}
