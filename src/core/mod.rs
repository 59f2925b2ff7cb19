//! Core domain types: platforms, package identity, metadata and the artifact store.

pub mod metadata;
pub mod package_id;
pub mod platform;
pub mod store;

pub use metadata::PackageMetadata;
pub use package_id::{PackageId, PackageIdError, PackageVersion, VersionRange};
pub use platform::{Platform, PlatformError, PlatformResolver, RuntimeId, Triplet};
pub use store::{staging_selector, ArtifactStore, PlatformRoots};
