//! Environment configuration.
//!
//! Settings come from an optional TOML file and are then overlaid with the
//! environment variables ModusToolbox itself honors.

use crate::constants::{
    CY_TOOLS_PATHS_ENV, DEFAULT_CONFIG_FILE, DEFAULT_GLOBAL_PATH, DEFAULT_HTTP_TIMEOUT_SECS,
    DEFAULT_SUPER_MANIFEST_URL, EARLY_ACCESS_ENV, MANIFEST_LOC_PATH, REMOTE_MANIFEST_OVERRIDE_ENV,
};
use crate::error::MtbResult;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Settings for a [`ModusToolboxEnvironment`](crate::ModusToolboxEnvironment).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvConfig {
    /// Tools directory to use instead of searching for one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools_dir: Option<PathBuf>,

    /// Executable whose ancestors are searched for a `tools_X.Y` directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exe_path: Option<PathBuf>,

    /// Candidate tools directories, from `CY_TOOLS_PATHS`.
    pub tools_search_paths: Vec<PathBuf>,

    /// Directory holding `tools_X.Y` installations.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub install_root: Option<PathBuf>,

    /// Registry directories; empty means the platform defaults.
    pub registry_dirs: Vec<PathBuf>,

    /// Feature id of the enabled early access pack.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub early_access: Option<String>,

    /// Remote super-manifests; empty means the default one.
    pub super_manifests: Vec<String>,

    /// Replacement for the default remote super-manifest.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_manifest_override: Option<String>,

    /// File listing extra super-manifests.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifest_loc: Option<PathBuf>,

    /// Root of `$$GLOBAL$$` assets.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub global_dir: Option<PathBuf>,

    /// Timeout of manifest downloads.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_timeout_secs: Option<u64>,

    /// Roots searched for device catalogs.
    pub device_db_dirs: Vec<PathBuf>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl EnvConfig {
    /// Defaults overlaid with the process environment.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env(|name| std::env::var(name).ok());
        config
    }

    /// Read a TOML file, then overlay the process environment.
    ///
    /// A missing file yields the defaults.
    pub fn load(path: &Path) -> MtbResult<Self> {
        let mut config: Self = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            toml::from_str(&content)?
        } else {
            tracing::debug!("No config file at {}", path.display());
            Self::default()
        };
        config.apply_env(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Read the default configuration file.
    pub fn load_default() -> MtbResult<Self> {
        Self::load(&DEFAULT_CONFIG_FILE)
    }

    /// Overlay variables returned by `lookup`. Empty values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(id) = var(EARLY_ACCESS_ENV) {
            self.early_access = Some(id.trim().to_string());
        }
        if let Some(url) = var(REMOTE_MANIFEST_OVERRIDE_ENV) {
            self.remote_manifest_override = Some(url.trim().to_string());
        }
        if let Some(paths) = var(CY_TOOLS_PATHS_ENV) {
            self.tools_search_paths = paths.split_whitespace().map(PathBuf::from).collect();
        }
    }

    /// Remote super-manifests to load.
    pub fn remote_super_manifests(&self) -> Vec<String> {
        if !self.super_manifests.is_empty() {
            return self.super_manifests.clone();
        }
        vec![
            self.remote_manifest_override
                .clone()
                .unwrap_or_else(|| DEFAULT_SUPER_MANIFEST_URL.to_string()),
        ]
    }

    /// Root of `$$GLOBAL$$` assets.
    pub fn global_dir(&self) -> PathBuf {
        self.global_dir
            .clone()
            .unwrap_or_else(|| DEFAULT_GLOBAL_PATH.clone())
    }

    /// File listing extra super-manifests.
    pub fn manifest_loc(&self) -> PathBuf {
        self.manifest_loc
            .clone()
            .unwrap_or_else(|| MANIFEST_LOC_PATH.clone())
    }

    /// Timeout of manifest downloads.
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs.unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS))
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
