//! Port archives - hand-off of one platform's build root between jobs.
//!
//! The archive holds `<selector>/<rid>/...` relative to the vcpkg artifacts
//! directory, so extracting it into that directory restores the exact tree.
//! Entries are stored uncompressed; the payload is mostly already-compressed
//! binaries and the archive only lives until the packaging job unpacks it.

use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use tar::{Archive, Builder};

use crate::core::platform::Platform;
use crate::core::store::ArtifactStore;
use crate::util::fs::{ensure_dir, remove_dir_all_if_exists};

/// Pack a platform's build root into its port archive, then delete the root.
pub fn archive_platform(store: &ArtifactStore, selector: &str, platform: &Platform) -> Result<PathBuf> {
    let root = store.platform_root(selector, platform);
    if !root.is_dir() {
        bail!(
            "nothing to archive for triplet `{}`: {} does not exist",
            platform.triplet,
            root.display()
        );
    }

    let archive = store.port_archive(selector, &platform.triplet);
    let name = Path::new(selector).join(platform.runtime.as_str());
    write_archive(&archive, &name, &root)?;

    remove_dir_all_if_exists(&root)?;
    tracing::info!("archived {} to {}", platform, archive.display());
    Ok(archive)
}

/// Restore a platform's build root from its port archive, then delete the archive.
pub fn extract_platform(store: &ArtifactStore, selector: &str, platform: &Platform) -> Result<PathBuf> {
    let archive = store.port_archive(selector, &platform.triplet);
    if !archive.is_file() {
        bail!(
            "no port archive for triplet `{}` at {}",
            platform.triplet,
            archive.display()
        );
    }

    let root = store.platform_root(selector, platform);
    remove_dir_all_if_exists(&root)?;
    unpack_archive(&archive, &store.vcpkg_root())?;

    std::fs::remove_file(&archive)
        .with_context(|| format!("failed to remove archive: {}", archive.display()))?;
    tracing::info!("extracted {} from {}", platform, archive.display());
    Ok(root)
}

fn write_archive(archive: &Path, name: &Path, src: &Path) -> Result<()> {
    if let Some(parent) = archive.parent() {
        ensure_dir(parent)?;
    }
    let file = File::create(archive)
        .with_context(|| format!("failed to create archive: {}", archive.display()))?;

    let mut builder = Builder::new(GzEncoder::new(file, Compression::none()));
    // Versioned shared objects are symlink chains; keep them as links.
    builder.follow_symlinks(false);
    builder
        .append_dir_all(name, src)
        .with_context(|| format!("failed to archive {}", src.display()))?;

    builder
        .into_inner()
        .and_then(|encoder| encoder.finish())
        .with_context(|| format!("failed to finish archive: {}", archive.display()))?;
    Ok(())
}

fn unpack_archive(archive: &Path, dest: &Path) -> Result<()> {
    ensure_dir(dest)?;
    let file = File::open(archive)
        .with_context(|| format!("failed to open archive: {}", archive.display()))?;

    let mut tar = Archive::new(GzDecoder::new(file));
    tar.set_preserve_permissions(true);
    tar.unpack(dest)
        .with_context(|| format!("failed to extract {} into {}", archive.display(), dest.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::platform::{RuntimeId, Triplet};
    use std::fs;
    use tempfile::TempDir;

    fn linux() -> Platform {
        Platform {
            triplet: Triplet::new("x64-linux"),
            runtime: RuntimeId::new("linux-x64"),
        }
    }

    #[test]
    fn test_archive_then_extract_restores_tree() {
        let tmp = TempDir::new().unwrap();
        let store = ArtifactStore::for_project(tmp.path());
        let roots = store.prepare_platform_roots("full", &linux()).unwrap();
        let header = roots.installed.join("x64-linux/include/avcodec.h");
        fs::create_dir_all(header.parent().unwrap()).unwrap();
        fs::write(&header, "#pragma once\n").unwrap();

        let archive = archive_platform(&store, "full", &linux()).unwrap();
        assert!(archive.ends_with("vcpkg/vcpkg-full-x64-linux.tar.gz"));
        assert!(archive.is_file());
        assert!(!store.platform_root("full", &linux()).exists());

        let root = extract_platform(&store, "full", &linux()).unwrap();
        assert_eq!(root, store.platform_root("full", &linux()));
        assert_eq!(fs::read_to_string(&header).unwrap(), "#pragma once\n");
        assert!(roots.downloads.is_dir());
        assert!(!archive.exists());
    }

    #[test]
    fn test_missing_inputs_name_the_triplet() {
        let tmp = TempDir::new().unwrap();
        let store = ArtifactStore::for_project(tmp.path());

        let err = archive_platform(&store, "full", &linux()).unwrap_err();
        assert!(err.to_string().contains("x64-linux"));

        let err = extract_platform(&store, "full", &linux()).unwrap_err();
        assert!(err.to_string().contains("x64-linux"));
    }
}
