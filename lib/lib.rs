//! `mtb-env` library.
//!
//! Discovers a ModusToolbox installation (tools, content packs, manifests and
//! device data) and resolves the assets of ModusToolbox applications.

pub mod app;
pub mod assets;
pub mod commands;
pub mod config;
pub mod constants;
pub mod devicedb;
pub mod env;
pub mod error;
pub mod handlers;
pub mod manifest;
pub mod packs;
pub mod platform;
pub mod process;
pub mod styles;
pub mod tools;
pub mod version;

//--------------------------------------------------------------------------------------------------
// Re-Exports
//--------------------------------------------------------------------------------------------------

pub use app::*;
pub use assets::*;
pub use commands::*;
pub use config::*;
pub use constants::*;
pub use devicedb::*;
pub use env::*;
pub use error::*;
pub use manifest::*;
pub use packs::*;
pub use process::*;
pub use tools::*;
pub use version::*;
