//! Assets and BSPs found on disk.

use super::request::MtbAssetRequest;
use crate::constants::{BSP_MAKEFILE, CYIGNORE_FILE, TARGET_PREFIX, VERSION_XML_FILE};
use serde::Serialize;
use std::path::{Path, PathBuf};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// An asset request whose full path exists on disk.
#[derive(Debug, Clone, Serialize)]
pub struct MtbAssetInstance {
    /// Root directory of the asset.
    pub path: PathBuf,

    /// The request that resolved to this directory.
    pub request: MtbAssetRequest,

    /// Installed version from `version.xml`, when present.
    pub version: Option<String>,
}

/// A board support package found on disk.
#[derive(Debug, Clone, Serialize)]
pub struct MtbBspInstance {
    /// Root directory of the BSP.
    pub root: PathBuf,

    /// Target name including the `TARGET_` prefix.
    pub target: String,

    /// Installed version from `version.xml`, when present.
    pub version: Option<String>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl MtbAssetInstance {
    /// Create an instance for an existing asset directory.
    pub fn load(path: impl Into<PathBuf>, request: MtbAssetRequest) -> Self {
        let path = path.into();
        let version = read_version_xml(&path);
        Self {
            path,
            request,
            version,
        }
    }

    /// Repository name of the asset.
    pub fn name(&self) -> &str {
        self.request.repo_name()
    }
}

impl MtbBspInstance {
    /// Probe a directory for a BSP.
    ///
    /// The target name comes from the directory itself when it carries the
    /// `TARGET_` prefix, otherwise from its parent (versioned shared clones
    /// live at `<shared>/TARGET_X/<commit>`). The directory must contain
    /// `bsp.mk` or `<target>.mk`.
    pub fn probe(dir: &Path) -> Option<Self> {
        if !dir.is_dir() {
            return None;
        }

        let target = target_name_for(dir)?;
        let has_marker =
            dir.join(BSP_MAKEFILE).is_file() || dir.join(format!("{}.mk", target)).is_file();
        if !has_marker {
            return None;
        }

        Some(Self {
            root: dir.to_path_buf(),
            version: read_version_xml(dir),
            target,
        })
    }

    /// Target name without the `TARGET_` prefix.
    pub fn board_name(&self) -> &str {
        self.target
            .strip_prefix(TARGET_PREFIX)
            .unwrap_or(&self.target)
    }

    /// Location of the BSP's own `.cyignore`.
    pub fn cyignore_path(&self) -> PathBuf {
        self.root.join(CYIGNORE_FILE)
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Work out which target a candidate BSP directory belongs to.
fn target_name_for(dir: &Path) -> Option<String> {
    let own = dir.file_name()?.to_string_lossy().to_string();
    if own.starts_with(TARGET_PREFIX) {
        return Some(own);
    }

    let parent = dir
        .parent()
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().to_string());
    match parent {
        Some(p) if p.starts_with(TARGET_PREFIX) => Some(p),
        _ => Some(format!("{}{}", TARGET_PREFIX, own)),
    }
}

/// Whether `dir` sits below a `TARGET_` directory and carries that target's makefile.
pub fn is_versioned_bsp_clone(dir: &Path) -> bool {
    let Some(parent) = dir
        .parent()
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().to_string())
    else {
        return false;
    };
    parent.starts_with(TARGET_PREFIX) && dir.join(format!("{}.mk", parent)).is_file()
}

/// Read the `<version>` text of an asset's `version.xml`.
pub fn read_version_xml(dir: &Path) -> Option<String> {
    let content = std::fs::read_to_string(dir.join(VERSION_XML_FILE)).ok()?;
    let doc = roxmltree::Document::parse(&content).ok()?;
    let root = doc.root_element();
    let node = if root.has_tag_name("version") {
        Some(root)
    } else {
        root.descendants().find(|n| n.has_tag_name("version"))
    };
    node.and_then(|n| n.text())
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_probe_requires_marker() {
        let dir = TempDir::new().unwrap();
        let bsp = dir.path().join("TARGET_KIT_A");
        std::fs::create_dir_all(&bsp).unwrap();
        assert!(MtbBspInstance::probe(&bsp).is_none());

        std::fs::write(bsp.join("bsp.mk"), "").unwrap();
        let found = MtbBspInstance::probe(&bsp).unwrap();
        assert_eq!(found.target, "TARGET_KIT_A");
        assert_eq!(found.board_name(), "KIT_A");
    }

    #[test]
    fn test_probe_versioned_clone() {
        let dir = TempDir::new().unwrap();
        let clone = dir.path().join("TARGET_KIT_B").join("release-v1.0.0");
        std::fs::create_dir_all(&clone).unwrap();
        std::fs::write(clone.join("TARGET_KIT_B.mk"), "").unwrap();
        std::fs::write(
            clone.join("version.xml"),
            "<version>1.0.0.120</version>",
        )
        .unwrap();

        assert!(is_versioned_bsp_clone(&clone));
        let found = MtbBspInstance::probe(&clone).unwrap();
        assert_eq!(found.target, "TARGET_KIT_B");
        assert_eq!(found.version.as_deref(), Some("1.0.0.120"));
    }

    #[test]
    fn test_read_version_xml_missing() {
        let dir = TempDir::new().unwrap();
        assert_eq!(read_version_xml(dir.path()), None);
        std::fs::write(dir.path().join("version.xml"), "<not xml").unwrap();
        assert_eq!(read_version_xml(dir.path()), None);
    }
}
