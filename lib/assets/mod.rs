//! Asset descriptors and their on-disk counterparts.

mod cyignore;
mod instance;
mod request;

//--------------------------------------------------------------------------------------------------
// Re-Exports
//--------------------------------------------------------------------------------------------------

pub use cyignore::parse_cyignore;
pub use instance::{MtbAssetInstance, MtbBspInstance, is_versioned_bsp_clone, read_version_xml};
pub use request::{AssetLocation, DirList, MtbAssetRequest};

pub(crate) use request::normalize;
