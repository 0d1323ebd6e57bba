//! Content packs (tech packs and early access packs).
//!
//! Packs are registered by the installer as JSON files in the IDC registry
//! directories. A pack can contribute manifests and tools; an enabled early
//! access pack is layered over the tech packs.

mod loader;

use crate::constants::{EAP_PACK_TYPE, PACK_MANIFEST_DIR, PACK_SUPER_MANIFEST, PACK_TOOLS_DIR};
use crate::manifest::PackManifest;
use crate::tools::ToolSource;
use serde::Serialize;
use std::path::PathBuf;

//--------------------------------------------------------------------------------------------------
// Re-Exports
//--------------------------------------------------------------------------------------------------

pub use loader::PackLoader;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// One installed content pack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pack {
    /// Installer feature identifier.
    pub feature_id: String,

    /// Display name, when registered.
    pub name: Option<String>,

    /// Pack version, when registered.
    pub version: Option<String>,

    /// Value of the `pack-type` attribute.
    pub pack_type: String,

    /// Installation directory.
    pub path: PathBuf,
}

/// Database of discovered packs and IDC tool registrations.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PackDb {
    packs: Vec<Pack>,
    eap: Option<Pack>,
    tool_roots: Vec<PathBuf>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl Pack {
    /// Whether this is an early access pack.
    pub fn is_eap(&self) -> bool {
        self.pack_type == EAP_PACK_TYPE
    }

    /// Super-manifest shipped with the pack, if present.
    pub fn manifest_file(&self) -> Option<PathBuf> {
        let file = self.path.join(PACK_MANIFEST_DIR).join(PACK_SUPER_MANIFEST);
        file.is_file().then_some(file)
    }

    /// Tools directory shipped with the pack, if present.
    pub fn tools_dir(&self) -> Option<PathBuf> {
        let dir = self.path.join(PACK_TOOLS_DIR);
        dir.is_dir().then_some(dir)
    }
}

impl PackDb {
    /// Create a database from its parts.
    pub fn new(packs: Vec<Pack>, eap: Option<Pack>, tool_roots: Vec<PathBuf>) -> Self {
        Self {
            packs,
            eap,
            tool_roots,
        }
    }

    /// Every accepted pack, including inactive early access packs.
    pub fn packs(&self) -> &[Pack] {
        &self.packs
    }

    /// Packs that are not early access packs.
    pub fn tech_packs(&self) -> impl Iterator<Item = &Pack> {
        self.packs.iter().filter(|p| !p.is_eap())
    }

    /// The enabled early access pack.
    pub fn active_eap(&self) -> Option<&Pack> {
        self.eap.as_ref()
    }

    /// Tool roots registered through the IDC registry.
    pub fn idc_tool_roots(&self) -> &[PathBuf] {
        &self.tool_roots
    }

    /// Manifest sources contributed by packs, early access first.
    pub fn manifests(&self) -> Vec<PackManifest> {
        let eap = self
            .eap
            .iter()
            .filter_map(|p| p.manifest_file())
            .map(|f| PackManifest::from_path(&f, true));
        let tech = self
            .tech_packs()
            .filter_map(|p| p.manifest_file())
            .map(|f| PackManifest::from_path(&f, false));
        eap.chain(tech).collect()
    }

    /// Tool directories contributed by packs and the registry, in scan order.
    pub fn tool_dirs(&self) -> Vec<(PathBuf, ToolSource)> {
        let mut dirs: Vec<(PathBuf, ToolSource)> = self
            .tech_packs()
            .filter_map(|p| p.tools_dir())
            .map(|d| (d, ToolSource::TechPack))
            .collect();
        if let Some(dir) = self.eap.as_ref().and_then(|p| p.tools_dir()) {
            dirs.push((dir, ToolSource::Eap));
        }
        dirs.extend(
            self.tool_roots
                .iter()
                .cloned()
                .map(|d| (d, ToolSource::Idc)),
        );
        dirs
    }
}
