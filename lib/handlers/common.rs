//! Shared handler helpers.

use crate::config::EnvConfig;
use crate::env::{LoadFlags, ModusToolboxEnvironment};
use crate::error::MtbResult;
use crate::styles::Spinner;
use serde::Serialize;
use std::path::{Path, PathBuf};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Global options that shape the environment.
#[derive(Debug, Clone, Default)]
pub struct EnvOptions {
    /// Configuration file; the default file when unset.
    pub config: Option<PathBuf>,

    /// Tools directory override.
    pub tools_dir: Option<PathBuf>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl EnvOptions {
    /// Read the configuration and apply the command line overrides.
    pub fn to_config(&self) -> MtbResult<EnvConfig> {
        let mut config = match &self.config {
            Some(path) => EnvConfig::load(path)?,
            None => EnvConfig::load_default()?,
        };
        if self.tools_dir.is_some() {
            config.tools_dir = self.tools_dir.clone();
        }
        Ok(config)
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Create an environment and load `flags`, showing a spinner unless `quiet`.
pub async fn load_environment(
    options: &EnvOptions,
    flags: LoadFlags,
    app_dir: Option<&Path>,
    quiet: bool,
) -> MtbResult<ModusToolboxEnvironment> {
    let env = ModusToolboxEnvironment::new(options.to_config()?);

    let spinner = (!quiet).then(|| Spinner::new("Loading ModusToolbox environment"));
    let result = env.load(flags, app_dir).await;

    match (result, spinner) {
        (Ok(()), Some(spinner)) => spinner.succeed(Some("Environment loaded")),
        (Err(e), Some(spinner)) => {
            spinner.fail(None);
            return Err(e);
        }
        (Err(e), None) => return Err(e),
        (Ok(()), None) => {}
    }
    Ok(env)
}

/// Print a value as pretty JSON.
pub(super) fn print_json<T: Serialize + ?Sized>(value: &T) -> MtbResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// `"1 tool"` or `"2 tools"`.
pub(super) fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{} {}", count, noun)
    } else {
        format!("{} {}s", count, noun)
    }
}

/// Absolute form of a user supplied directory, the current one when unset.
pub(super) fn absolute_dir(path: Option<PathBuf>) -> MtbResult<PathBuf> {
    let cwd = std::env::current_dir()?;
    Ok(match path {
        Some(p) if p.is_absolute() => p,
        Some(p) => cwd.join(p),
        None => cwd,
    })
}
