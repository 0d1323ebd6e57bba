//! Command handlers.

mod app_cmd;
mod common;
mod env_cmd;
mod manifest_cmd;
mod run_cmd;

//--------------------------------------------------------------------------------------------------
// Re-Exports
//--------------------------------------------------------------------------------------------------

pub use app_cmd::show_app;
pub use common::{EnvOptions, load_environment};
pub use env_cmd::{list_packs, list_tools};
pub use manifest_cmd::{list_boards, list_examples};
pub use run_cmd::run_program;
