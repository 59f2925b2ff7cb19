//! Package manifest (`.nuspec`) documents.
//!
//! Output is fully determined by the metadata: no timestamps, fixed element
//! order, so rebuilding with the same inputs yields identical bytes.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::Result;

use crate::core::metadata::PackageMetadata;
use crate::core::package_id::{PackageId, PackageVersion};
use crate::core::platform::RuntimeId;
use crate::util::fs::write_string;

const NUSPEC_NAMESPACE: &str = "http://schemas.microsoft.com/packaging/2013/05/nuspec.xsd";
const MIN_CLIENT_VERSION: &str = "2.12";

/// Framework the umbrella package declares compatibility with.
pub const TARGET_FRAMEWORK: &str = ".NETStandard2.0";

/// Framework folder of the "no managed code" placeholder.
pub const TARGET_FRAMEWORK_FOLDER: &str = "netstandard2.0";

/// A package manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Nuspec {
    pub id: PackageId,
    pub version: PackageVersion,
    pub authors: String,
    pub license: String,
    pub project_url: String,
    pub description: String,
    pub copyright: String,
    pub repository_url: String,
    /// Target frameworks with an (empty) dependency group.
    pub dependency_groups: Vec<String>,
}

impl Nuspec {
    /// Manifest of the runtime package for one platform.
    pub fn runtime(meta: &PackageMetadata, runtime: &RuntimeId) -> Self {
        Nuspec {
            id: meta.id.runtime_package(runtime),
            version: meta.version.clone(),
            authors: meta.authors.clone(),
            license: meta.license.clone(),
            project_url: meta.project_url.clone(),
            description: meta.runtime_description(runtime),
            copyright: meta.copyright(),
            repository_url: meta.repository_url.clone(),
            dependency_groups: Vec::new(),
        }
    }

    /// Manifest of the umbrella package. Declares a framework group but no
    /// native dependency; those come from the runtime graph.
    pub fn umbrella(meta: &PackageMetadata) -> Self {
        Nuspec {
            id: meta.id.clone(),
            version: meta.version.clone(),
            authors: meta.authors.clone(),
            license: meta.license.clone(),
            project_url: meta.project_url.clone(),
            description: meta.umbrella_description(),
            copyright: meta.copyright(),
            repository_url: meta.repository_url.clone(),
            dependency_groups: vec![TARGET_FRAMEWORK.to_string()],
        }
    }

    /// File name of the manifest inside its staging directory.
    pub fn file_name(&self) -> String {
        format!("{}.nuspec", self.id)
    }

    pub fn to_xml(&self) -> String {
        let mut xml = String::new();
        xml.push_str("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n");
        let _ = writeln!(xml, "<package xmlns=\"{}\">", NUSPEC_NAMESPACE);
        let _ = writeln!(
            xml,
            "  <metadata minClientVersion=\"{}\">",
            MIN_CLIENT_VERSION
        );

        element(&mut xml, "id", self.id.as_str());
        element(&mut xml, "version", self.version.as_str());
        element(&mut xml, "authors", &self.authors);
        element(&mut xml, "requireLicenseAcceptance", "true");
        let _ = writeln!(
            xml,
            "    <license type=\"expression\">{}</license>",
            escape(&self.license)
        );
        element(&mut xml, "projectUrl", &self.project_url);
        element(&mut xml, "description", &self.description);
        element(&mut xml, "copyright", &self.copyright);
        let _ = writeln!(
            xml,
            "    <repository type=\"git\" url=\"{}\" />",
            escape(&self.repository_url)
        );

        if !self.dependency_groups.is_empty() {
            xml.push_str("    <dependencies>\n");
            for framework in &self.dependency_groups {
                let _ = writeln!(
                    xml,
                    "      <group targetFramework=\"{}\" />",
                    escape(framework)
                );
            }
            xml.push_str("    </dependencies>\n");
        }

        xml.push_str("  </metadata>\n");
        xml.push_str("</package>\n");
        xml
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        write_string(path, &self.to_xml())
    }
}

fn element(xml: &mut String, name: &str, value: &str) {
    let _ = writeln!(xml, "    <{name}>{}</{name}>", escape(value));
}

/// Escape text for use in element content and attribute values.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
    out
}
