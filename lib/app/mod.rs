//! Applications, projects and their asset resolution.
//!
//! A project is resolved in a fixed order: its `.mtb` files are read, the
//! search path is derived from them, `.cyignore` files are applied, BSPs are
//! discovered, and every request is classified as present or missing.

mod appinfo;
mod project;

#[cfg(test)]
mod tests;

//--------------------------------------------------------------------------------------------------
// Re-Exports
//--------------------------------------------------------------------------------------------------

pub use appinfo::{AppType, MTB_PROJECTS_VAR, MTB_TYPE_VAR, MtbAppInfo, get_app_info, parse_app_info};
pub use project::{
    MTB_APP_NAME_VAR, MTB_DEPS_DIR_VAR, MTB_IGNORE_VAR, MTB_LIBS_VAR, MTB_SEARCH_VAR,
    MTB_TARGET_VAR, MTB_WKS_SHARED_DIR_VAR, MtbProjectInfo,
};
