//! Typed manifest records.

use reqwest::Url;
use serde::Serialize;
use std::fmt;
use std::path::Path;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// One manifest source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct PackManifest {
    /// Location of the document: an `http(s):` or `file:` URI, or a path.
    pub uripath: String,

    /// Whether the document comes from an early access pack.
    pub iseap: bool,
}

/// Kind of catalog item, chosen by the root element of its content manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    App,
    Board,
    Middleware,
}

/// Kind-specific item data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum MtbItemDetails {
    App {
        category: Option<String>,
        uri: Option<String>,
        description: Option<String>,
        keywords: Vec<String>,
    },
    Board {
        category: Option<String>,
        chips: Vec<String>,
        board_uri: Option<String>,
        documentation: Option<String>,
        summary: Option<String>,
    },
    Middleware {
        category: Option<String>,
        uri: Option<String>,
        description: Option<String>,
    },
}

/// An app (code example), board or middleware catalog entry.
#[derive(Debug, Clone, Serialize)]
pub struct MtbItem {
    pub id: String,
    pub name: String,

    /// Manifest the item was first seen in.
    pub source: PackManifest,

    pub versions: Vec<MtbItemVersion>,

    /// Capabilities offered (boards).
    pub provides: Vec<String>,

    /// Required capabilities, all of which must be provided.
    pub requires: Vec<String>,

    /// Required capabilities with `[a,b]` OR-groups.
    pub requiresv2: Vec<String>,

    pub details: MtbItemDetails,
}

/// One released version of an item.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MtbItemVersion {
    pub num: String,
    pub commit: String,
    pub requirements: Vec<String>,
    pub requirementsv2: Vec<String>,
    pub provides: Vec<String>,
    pub flows: Vec<String>,
    pub tools_min_version: Option<String>,
    pub dependencies: Vec<MtbDependency>,

    /// Whether the definition came from an early access manifest.
    #[serde(skip)]
    pub eap: bool,
}

/// Item and commit another item version depends on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MtbDependency {
    pub id: String,
    pub commit: String,
}

/// Dependency edges of one item from a dependency manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependerRecord {
    pub id: String,
    pub versions: Vec<DependerVersion>,
}

/// Dependencies of one depender commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependerVersion {
    pub commit: String,
    pub dependees: Vec<MtbDependency>,
}

/// One content manifest listed in a super-manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentRef {
    pub source: PackManifest,
    pub dependency_uri: Option<String>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl PackManifest {
    /// Create a manifest source.
    pub fn new(uripath: impl Into<String>, iseap: bool) -> Self {
        Self {
            uripath: uripath.into(),
            iseap,
        }
    }

    /// Manifest source for a local file, as a `file:` URI when possible.
    pub fn from_path(path: &Path, iseap: bool) -> Self {
        let uripath = Url::from_file_path(path)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| path.to_string_lossy().into_owned());
        Self::new(uripath, iseap)
    }
}

impl MtbItem {
    /// Kind of the item.
    pub fn kind(&self) -> ItemKind {
        match self.details {
            MtbItemDetails::App { .. } => ItemKind::App,
            MtbItemDetails::Board { .. } => ItemKind::Board,
            MtbItemDetails::Middleware { .. } => ItemKind::Middleware,
        }
    }

    /// Item category, if any.
    pub fn category(&self) -> Option<&str> {
        match &self.details {
            MtbItemDetails::App { category, .. }
            | MtbItemDetails::Board { category, .. }
            | MtbItemDetails::Middleware { category, .. } => category.as_deref(),
        }
    }

    /// Version with this number.
    pub fn version(&self, num: &str) -> Option<&MtbItemVersion> {
        self.versions.iter().find(|v| v.num == num)
    }

    /// Version with this commit.
    pub fn version_by_commit(&self, commit: &str) -> Option<&MtbItemVersion> {
        self.versions.iter().find(|v| v.commit == commit)
    }
}

impl MtbItemDetails {
    /// Board chips, empty for other kinds.
    pub fn chips(&self) -> &[String] {
        match self {
            Self::Board { chips, .. } => chips,
            _ => &[],
        }
    }
}

impl MtbItemVersion {
    /// Whether two definitions of a version carry the same content.
    pub fn same_definition(&self, other: &Self) -> bool {
        self.num == other.num
            && self.commit == other.commit
            && self.requirements == other.requirements
            && self.requirementsv2 == other.requirementsv2
            && self.provides == other.provides
            && self.flows == other.flows
            && self.tools_min_version == other.tools_min_version
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl fmt::Display for PackManifest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.iseap {
            write!(f, "{} (early access)", self.uripath)
        } else {
            write!(f, "{}", self.uripath)
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::App => "app",
            Self::Board => "board",
            Self::Middleware => "middleware",
        };
        write!(f, "{}", s)
    }
}
