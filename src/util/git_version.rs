//! Package version derived from the project's git tags.

use std::path::Path;
use std::sync::LazyLock;

use anyhow::{Context, Result};
use git2::{DescribeFormatOptions, DescribeOptions, Repository};
use regex::Regex;

static DESCRIBE_SUFFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<base>.+)-(?P<distance>\d+)-g(?P<sha>[0-9a-f]+)$")
        .expect("valid describe regex")
});

/// Describe HEAD of the repository containing `path` against its tags.
///
/// Returns `Ok(None)` when `path` isn't inside a repository or no tag is
/// reachable from HEAD.
pub fn describe_version(path: &Path) -> Result<Option<String>> {
    let repo = match Repository::discover(path) {
        Ok(repo) => repo,
        Err(_) => return Ok(None),
    };

    let mut opts = DescribeOptions::new();
    opts.describe_tags();
    let describe = match repo.describe(&opts) {
        Ok(describe) => describe,
        Err(e) => {
            tracing::debug!("git describe found no tag: {}", e);
            return Ok(None);
        }
    };

    let mut format = DescribeFormatOptions::new();
    format.abbreviated_size(7);
    let described = describe
        .format(Some(&format))
        .context("failed to format git describe output")?;

    Ok(Some(version_from_describe(&described)))
}

/// Turn `git describe --tags` output into a package version.
///
/// `v1.2.3` becomes `1.2.3`; `v1.2.3-4-gabc1234` becomes the pre-release
/// `1.2.3-4.gabc1234`.
pub fn version_from_describe(described: &str) -> String {
    let trimmed = described.trim();
    let trimmed = trimmed
        .strip_prefix('v')
        .or_else(|| trimmed.strip_prefix('V'))
        .unwrap_or(trimmed);

    match DESCRIBE_SUFFIX_RE.captures(trimmed) {
        Some(caps) => {
            let base = &caps["base"];
            // A tag that is already a pre-release gets the distance appended
            // as another dot-separated label.
            let separator = if base.contains('-') { '.' } else { '-' };
            format!("{}{}{}.g{}", base, separator, &caps["distance"], &caps["sha"])
        }
        None => trimmed.to_string(),
    }
}
