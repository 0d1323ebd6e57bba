//! Tool discovery and the active tool set.
//!
//! Tools are found by scanning registered roots one level deep for tool
//! descriptors. Several installations of one tool id may exist; exactly one of
//! them is active: an early access installation if there is one, otherwise the
//! newest version. Equal versions keep the first one scanned. Roots are
//! scanned in registration order and their children in file name order.

mod props;

use crate::version::MtbVersion;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

//--------------------------------------------------------------------------------------------------
// Re-Exports
//--------------------------------------------------------------------------------------------------

pub use props::{ToolCore, ToolOpt, ToolProgram, ToolProps, find_props_file, read_tool_descriptors};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Where a tool installation was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ToolSource {
    TechPack,
    Eap,
    ToolsDir,
    Idc,
}

/// One tool installation.
#[derive(Debug, Clone, Serialize)]
pub struct MtbTool {
    /// Directory holding the tool.
    pub path: PathBuf,

    /// Decoded descriptor.
    pub props: ToolProps,

    /// Where the tool was found.
    pub source: ToolSource,

    /// Parsed `core.version`; unparseable versions order as `0.0.0`.
    pub version: MtbVersion,
}

/// Database of scanned tools.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ToolsDb {
    roots: Vec<(PathBuf, ToolSource)>,
    tools: Vec<MtbTool>,
    active: BTreeMap<String, usize>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl MtbTool {
    /// Create a tool from a descriptor.
    pub fn new(path: impl Into<PathBuf>, props: ToolProps, source: ToolSource) -> Self {
        let version = MtbVersion::parse(&props.core.version).unwrap_or_else(|| {
            tracing::debug!(
                "Tool {} has unparseable version '{}'",
                props.core.id,
                props.core.version
            );
            MtbVersion::new(0, 0, 0)
        });
        Self {
            path: path.into(),
            props,
            source,
            version,
        }
    }

    /// Tool id (a GUID for most tools).
    pub fn id(&self) -> &str {
        &self.props.core.id
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.props.core.name
    }

    /// Whether this installation comes from an early access pack.
    pub fn is_eap(&self) -> bool {
        self.source == ToolSource::Eap
    }

    /// Path of a program the tool ships, by program id.
    pub fn program(&self, id: &str) -> Option<PathBuf> {
        self.props
            .opt
            .programs
            .iter()
            .find(|p| p.id == id)
            .and_then(|p| p.exe.as_ref())
            .map(|exe| self.path.join(exe))
    }
}

impl ToolsDb {
    /// Create an empty database.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a root to scan. Registering the same root twice has no effect.
    pub fn add_tools_dir(&mut self, dir: impl Into<PathBuf>, source: ToolSource) {
        let dir = dir.into();
        if !self.roots.iter().any(|(d, _)| d == &dir) {
            self.roots.push((dir, source));
        }
    }

    /// Registered roots in scan order.
    pub fn roots(&self) -> &[(PathBuf, ToolSource)] {
        &self.roots
    }

    /// Rescan every root and recompute the active set.
    pub fn scan_all(&mut self) {
        self.tools.clear();

        for (root, source) in self.roots.clone() {
            if !root.is_dir() {
                tracing::debug!("Tools root {} does not exist", root.display());
                continue;
            }

            self.scan_tool_dir(&root, source);

            for entry in WalkDir::new(&root)
                .min_depth(1)
                .max_depth(1)
                .sort_by_file_name()
                .into_iter()
                .flatten()
            {
                if entry.file_type().is_dir() {
                    self.scan_tool_dir(entry.path(), source);
                }
            }
        }

        self.compute_active();
        tracing::debug!(
            "Scanned {} tools, {} active",
            self.tools.len(),
            self.active.len()
        );
    }

    /// Add a tool directly, as a scan would, and update the active set.
    pub fn insert(&mut self, tool: MtbTool) {
        self.tools.push(tool);
        self.compute_active();
    }

    /// Every scanned installation in scan order.
    pub fn all_tools(&self) -> &[MtbTool] {
        &self.tools
    }

    /// The active installation of each tool id, ordered by id.
    pub fn active_set(&self) -> Vec<&MtbTool> {
        self.active.values().map(|&i| &self.tools[i]).collect()
    }

    /// Active tool with this id.
    pub fn find_tool_by_guid(&self, id: &str) -> Option<&MtbTool> {
        self.active.get(id).map(|&i| &self.tools[i])
    }

    /// Active tool with this display name.
    pub fn find_tool_by_name(&self, name: &str) -> Option<&MtbTool> {
        self.active_set().into_iter().find(|t| t.name() == name)
    }

    fn scan_tool_dir(&mut self, dir: &Path, source: ToolSource) {
        for props in read_tool_descriptors(dir) {
            tracing::debug!("Found tool {} {} in {}", props.core.id, props.core.version, dir.display());
            self.tools.push(MtbTool::new(dir, props, source));
        }
    }

    fn compute_active(&mut self) {
        let mut active: BTreeMap<String, usize> = BTreeMap::new();

        for (index, tool) in self.tools.iter().enumerate() {
            match active.get(tool.id()) {
                None => {
                    active.insert(tool.id().to_string(), index);
                }
                Some(&current) => {
                    let existing = &self.tools[current];
                    let replace = if tool.is_eap() {
                        !existing.is_eap()
                    } else {
                        !existing.is_eap() && tool.version.is_greater_than(&existing.version)
                    };
                    if replace {
                        active.insert(tool.id().to_string(), index);
                    }
                }
            }
        }

        self.active = active;
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl fmt::Display for ToolSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::TechPack => "tech-pack",
            Self::Eap => "eap",
            Self::ToolsDir => "tools-dir",
            Self::Idc => "idc",
        };
        write!(f, "{}", s)
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
