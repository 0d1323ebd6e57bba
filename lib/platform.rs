//! Platform detection and platform specific locations.

use crate::constants::{REGISTRY_PRODUCT_DIR, REGISTRY_VENDOR_DIR};
use std::path::PathBuf;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Host operating system family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    MacOs,
    Linux,
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Detect the current platform.
pub fn detect_platform() -> Platform {
    if cfg!(target_os = "windows") {
        Platform::Windows
    } else if cfg!(target_os = "macos") {
        Platform::MacOs
    } else {
        Platform::Linux
    }
}

/// Directories holding IDC registry JSON files, per-user first.
pub fn registry_dirs() -> Vec<PathBuf> {
    let env = |name: &str| std::env::var_os(name).map(PathBuf::from);
    let home = env("HOME").or_else(dirs::home_dir);

    let bases: Vec<Option<PathBuf>> = match detect_platform() {
        Platform::Windows => vec![env("LOCALAPPDATA"), env("ALLUSERSPROFILE")],
        Platform::MacOs => vec![
            home.map(|h| h.join("Library").join("Application Support")),
            Some(PathBuf::from("/Library/Application Support")),
        ],
        Platform::Linux => vec![
            home.map(|h| h.join(".local").join("share")),
            Some(PathBuf::from("/usr/local/share")),
        ],
    };

    bases
        .into_iter()
        .flatten()
        .map(|b| b.join(REGISTRY_VENDOR_DIR).join(REGISTRY_PRODUCT_DIR))
        .collect()
}

/// Common ModusToolbox install location holding `tools_X.Y` directories.
pub fn default_install_root() -> Option<PathBuf> {
    match detect_platform() {
        Platform::MacOs => Some(PathBuf::from("/Applications/ModusToolbox")),
        Platform::Windows | Platform::Linux => {
            dirs::home_dir().map(|h| h.join("ModusToolbox"))
        }
    }
}

/// Name of the `make` program used to query applications.
pub fn make_program() -> &'static str {
    match detect_platform() {
        Platform::Windows => "make.exe",
        _ => "make",
    }
}

/// Build the `PATH` used for child processes.
///
/// Segments mentioning cygwin are removed; the system binary directories are
/// always appended.
pub fn filtered_path(current: &str) -> String {
    let sep = if detect_platform() == Platform::Windows {
        ';'
    } else {
        ':'
    };

    let mut segments: Vec<String> = current
        .split(sep)
        .filter(|s| !s.is_empty() && !s.to_lowercase().contains("cygwin"))
        .map(str::to_string)
        .collect();

    let system32 = std::env::var("SystemRoot")
        .map(|root| format!("{}\\System32", root))
        .unwrap_or_else(|_| "C:\\Windows\\System32".to_string());
    for extra in ["/usr/bin".to_string(), "/bin".to_string(), system32] {
        segments.push(extra);
    }

    segments.join(&sep.to_string())
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
