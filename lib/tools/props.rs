//! Tool descriptor files (`props.json` / `mtbprops.json`).

use crate::constants::{MTB_PROPS_FILE, PROPS_FILE};
use crate::error::MtbResult;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Decoded tool descriptor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolProps {
    #[serde(default)]
    pub core: ToolCore,

    #[serde(default)]
    pub opt: ToolOpt,

    /// Sibling descriptor files holding the real tool definitions.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub prop_files: Vec<String>,
}

/// Required identity of a tool.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolCore {
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub version: String,
}

/// Optional tool data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolOpt {
    #[serde(default)]
    pub programs: Vec<ToolProgram>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool: Option<Value>,
}

/// One executable shipped by a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolProgram {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exe: Option<String>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl ToolProps {
    /// Whether the descriptor names a tool.
    pub fn is_complete(&self) -> bool {
        !self.core.id.trim().is_empty()
            && !self.core.name.trim().is_empty()
            && !self.core.version.trim().is_empty()
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// The descriptor file in `dir`, `props.json` preferred.
pub fn find_props_file(dir: &Path) -> Option<PathBuf> {
    [PROPS_FILE, MTB_PROPS_FILE]
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.is_file())
}

/// Read a descriptor file.
pub fn read_props(file: &Path) -> MtbResult<ToolProps> {
    let content = std::fs::read_to_string(file)?;
    Ok(serde_json::from_str(&content)?)
}

/// Read every complete tool descriptor in `dir`.
///
/// A descriptor with `prop_files` is replaced by the descriptors it lists.
/// Unreadable or incomplete descriptors are skipped.
pub fn read_tool_descriptors(dir: &Path) -> Vec<ToolProps> {
    let Some(file) = find_props_file(dir) else {
        return Vec::new();
    };

    let props = match read_props(&file) {
        Ok(props) => props,
        Err(e) => {
            tracing::debug!("Skipping {}: {}", file.display(), e);
            return Vec::new();
        }
    };

    let candidates = if props.prop_files.is_empty() {
        vec![props]
    } else {
        props
            .prop_files
            .iter()
            .filter_map(|name| {
                let nested = dir.join(name);
                read_props(&nested)
                    .inspect_err(|e| tracing::debug!("Skipping {}: {}", nested.display(), e))
                    .ok()
            })
            .collect()
    };

    candidates.into_iter().filter(ToolProps::is_complete).collect()
}
