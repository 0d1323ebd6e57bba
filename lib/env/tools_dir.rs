//! Locating the ModusToolbox tools directory.

use crate::config::EnvConfig;
use crate::error::{MtbError, MtbResult};
use crate::platform::default_install_root;
use crate::version::MtbVersion;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Find the tools directory. The first match wins:
///
/// 1. the configured override,
/// 2. an ancestor of the executable named `tools_X.Y[.Z]`,
/// 3. the first existing `CY_TOOLS_PATHS` entry,
/// 4. the newest `tools_X.Y[.Z]` directory under the install root.
pub fn find_tools_dir(config: &EnvConfig) -> MtbResult<PathBuf> {
    if let Some(dir) = &config.tools_dir {
        if dir.is_dir() {
            tracing::debug!("Using configured tools directory {}", dir.display());
            return Ok(dir.clone());
        }
        tracing::warn!("Configured tools directory {} does not exist", dir.display());
    }

    let exe = config
        .exe_path
        .clone()
        .or_else(|| std::env::current_exe().ok());
    if let Some(dir) = exe.as_deref().and_then(tools_dir_above) {
        tracing::debug!("Using tools directory {} above the executable", dir.display());
        return Ok(dir);
    }

    if let Some(dir) = config.tools_search_paths.iter().find(|d| d.is_dir()) {
        tracing::debug!("Using tools directory {} from CY_TOOLS_PATHS", dir.display());
        return Ok(dir.clone());
    }

    let root = config.install_root.clone().or_else(default_install_root);
    if let Some(dir) = root.as_deref().and_then(newest_tools_dir) {
        tracing::debug!("Using newest installed tools directory {}", dir.display());
        return Ok(dir);
    }

    Err(MtbError::ToolsDirNotFound)
}

/// The closest ancestor of `path` whose name is a tools directory name.
pub fn tools_dir_above(path: &Path) -> Option<PathBuf> {
    path.ancestors()
        .find(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .and_then(MtbVersion::from_tools_dir_name)
                .is_some()
        })
        .filter(|p| p.is_dir())
        .map(Path::to_path_buf)
}

/// The `tools_X.Y[.Z]` child of `root` with the highest version.
///
/// Equal versions keep the first in file name order.
pub fn newest_tools_dir(root: &Path) -> Option<PathBuf> {
    let mut best: Option<(MtbVersion, PathBuf)> = None;

    for entry in WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .flatten()
    {
        if !entry.file_type().is_dir() {
            continue;
        }
        let Some(version) = entry
            .file_name()
            .to_str()
            .and_then(MtbVersion::from_tools_dir_name)
        else {
            continue;
        };
        if best.as_ref().is_none_or(|(v, _)| version.is_greater_than(v)) {
            best = Some((version, entry.into_path()));
        }
    }

    best.map(|(_, dir)| dir)
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config_in(dir: &Path) -> EnvConfig {
        EnvConfig {
            exe_path: Some(dir.join("bin").join("mtbenv")),
            install_root: Some(dir.join("no-install")),
            ..EnvConfig::default()
        }
    }

    #[test]
    fn test_override_wins() {
        let dir = TempDir::new().unwrap();
        let tools = dir.path().join("custom");
        std::fs::create_dir_all(&tools).unwrap();
        std::fs::create_dir_all(dir.path().join("tools_3.2")).unwrap();

        let config = EnvConfig {
            tools_dir: Some(tools.clone()),
            tools_search_paths: vec![dir.path().join("tools_3.2")],
            ..config_in(dir.path())
        };
        assert_eq!(find_tools_dir(&config).unwrap(), tools);
    }

    #[test]
    fn test_executable_ancestor() {
        let dir = TempDir::new().unwrap();
        let tools = dir.path().join("tools_3.1");
        let exe_dir = tools.join("mtbenv").join("bin");
        std::fs::create_dir_all(&exe_dir).unwrap();

        let config = EnvConfig {
            exe_path: Some(exe_dir.join("mtbenv")),
            tools_search_paths: vec![dir.path().to_path_buf()],
            ..config_in(dir.path())
        };
        assert_eq!(find_tools_dir(&config).unwrap(), tools);
    }

    #[test]
    fn test_search_paths_first_existing() {
        let dir = TempDir::new().unwrap();
        let second = dir.path().join("second");
        std::fs::create_dir_all(&second).unwrap();

        let config = EnvConfig {
            tools_search_paths: vec![dir.path().join("first"), second.clone()],
            ..config_in(dir.path())
        };
        assert_eq!(find_tools_dir(&config).unwrap(), second);
    }

    #[test]
    fn test_newest_under_install_root() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("ModusToolbox");
        for name in ["tools_3.1", "tools_3.2", "tools_3.10", "tools_x", "docs_3.2"] {
            std::fs::create_dir_all(root.join(name)).unwrap();
        }

        let config = EnvConfig {
            install_root: Some(root.clone()),
            ..config_in(dir.path())
        };
        assert_eq!(find_tools_dir(&config).unwrap(), root.join("tools_3.10"));
    }

    #[test]
    fn test_not_found() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            find_tools_dir(&config_in(dir.path())),
            Err(MtbError::ToolsDirNotFound)
        ));
    }
}
