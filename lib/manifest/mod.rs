//! Manifest catalog of apps, boards and middleware.

mod db;
mod fetch;
mod loader;
mod types;
mod xml;

//--------------------------------------------------------------------------------------------------
// Re-Exports
//--------------------------------------------------------------------------------------------------

pub use db::{ManifestDb, latest_version};
pub use fetch::ManifestFetcher;
pub use loader::{ManifestLoader, read_manifest_loc, super_manifest_sources};
pub use types::{
    ContentRef, DependerRecord, DependerVersion, ItemKind, MtbDependency, MtbItem,
    MtbItemDetails, MtbItemVersion, PackManifest,
};
pub use xml::{
    parse_content_manifest, parse_dependency_manifest, parse_super_manifest, resolve_uri,
    split_requirements_v2,
};
