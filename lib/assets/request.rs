//! Asset requests parsed from `.mtb` files.
//!
//! Each `.mtb` file names one dependency in the form
//! `<uri>#<commit>#<location>`, where the location starts with a token that
//! decides which base directory the asset is cloned under.

use crate::constants::{
    ABSOLUTE_TOKEN, GLOBAL_TOKEN, LOCAL_TOKEN, SHARED_TOKEN, TARGET_PREFIX,
};
use crate::error::{MtbError, MtbResult};
use regex::Regex;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// Location token followed by the relative path.
static LOCATION_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\$\$[A-Z_]+\$\$)(.*)").expect("Invalid regex"));

/// A leading location token of any name.
static LEADING_TOKEN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\$\$[A-Z_]+\$\$").expect("Invalid regex"));

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Where an asset lives relative to the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetLocation {
    Local,
    Shared,
    Global,
    Absolute,
    Project,
}

/// Base directories an asset request is resolved against.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirList {
    /// Base of `$$LOCAL$$` assets (the project libs directory).
    pub localdir: PathBuf,

    /// Base of `$$ASSET_REPO$$` assets (the shared asset repository).
    pub shareddir: PathBuf,

    /// Base of `$$GLOBAL$$` assets.
    pub globaldir: PathBuf,

    /// Base of project relative assets.
    pub projdir: PathBuf,
}

/// One parsed line of a `.mtb` file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MtbAssetRequest {
    uri: String,
    commit: String,
    location: String,
    location_type: AssetLocation,
    repo_name: String,
    path: String,

    /// The `.mtb` file this request was read from.
    source_file: Option<PathBuf>,

    /// True for files in the deps directory, false for files in libs.
    direct: bool,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl AssetLocation {
    /// Classify a location string by its leading token.
    pub fn classify(location: &str) -> Self {
        if location.starts_with(LOCAL_TOKEN) {
            Self::Local
        } else if location.starts_with(SHARED_TOKEN) {
            Self::Shared
        } else if location.starts_with(GLOBAL_TOKEN) {
            Self::Global
        } else if location.starts_with(ABSOLUTE_TOKEN) {
            Self::Absolute
        } else {
            Self::Project
        }
    }

    /// How many segments from the end the repo name sits.
    ///
    /// Shared and global layouts add one directory level below the repo name.
    fn repo_name_offset(self) -> usize {
        match self {
            Self::Shared | Self::Global => 1,
            _ => 0,
        }
    }

    /// Whether a leading `/` in the relative path must be dropped.
    fn strips_leading_slash(self) -> bool {
        matches!(self, Self::Local | Self::Shared | Self::Global)
    }
}

impl DirList {
    /// Create a directory list.
    pub fn new(
        localdir: impl Into<PathBuf>,
        shareddir: impl Into<PathBuf>,
        globaldir: impl Into<PathBuf>,
        projdir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            localdir: localdir.into(),
            shareddir: shareddir.into(),
            globaldir: globaldir.into(),
            projdir: projdir.into(),
        }
    }
}

impl MtbAssetRequest {
    /// Parse one `.mtb` line.
    pub fn parse_line(line: &str) -> MtbResult<Self> {
        let line = line.trim();
        let invalid = |reason: &str| MtbError::InvalidAssetLine {
            line: line.to_string(),
            reason: reason.to_string(),
        };

        let fields: Vec<&str> = line.split('#').collect();
        if fields.len() != 3 {
            return Err(invalid(&format!(
                "expected 3 '#' separated fields, found {}",
                fields.len()
            )));
        }

        let uri = fields[0].trim();
        let commit = fields[1].trim();
        let location = fields[2].trim();

        Url::parse(uri).map_err(|e| invalid(&format!("invalid URI '{}': {}", uri, e)))?;

        let location_type = AssetLocation::classify(location);
        let repo_name = extract_repo_name(location, location_type)
            .or_else(|| repo_name_from_uri(uri))
            .ok_or_else(|| invalid("cannot determine repository name"))?;
        let path = extract_path(location, location_type, &repo_name);

        Ok(Self {
            uri: uri.to_string(),
            commit: commit.to_string(),
            location: location.to_string(),
            location_type,
            repo_name,
            path,
            source_file: None,
            direct: true,
        })
    }

    /// Parse every request in a `.mtb` file.
    ///
    /// Blank lines and `#` comments are skipped. One bad line fails the whole
    /// file; no partial result is returned.
    pub fn from_file(file: &Path, direct: bool) -> MtbResult<Vec<Self>> {
        let content = std::fs::read_to_string(file)?;
        let mut requests = Vec::new();

        for line in content.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let mut request = Self::parse_line(trimmed).map_err(|e| match e {
                MtbError::InvalidAssetLine { line, reason } => MtbError::InvalidAssetLine {
                    line,
                    reason: format!("{} ({})", reason, file.display()),
                },
                other => other,
            })?;
            request.source_file = Some(file.to_path_buf());
            request.direct = direct;
            requests.push(request);
        }

        Ok(requests)
    }

    /// Repository URI.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Commit, tag or branch.
    pub fn commit(&self) -> &str {
        &self.commit
    }

    /// Raw location field.
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Location classification.
    pub fn location_type(&self) -> AssetLocation {
        self.location_type
    }

    /// Repository name.
    pub fn repo_name(&self) -> &str {
        &self.repo_name
    }

    /// Name used by `$(SEARCH_<name>)` references.
    pub fn name(&self) -> &str {
        &self.repo_name
    }

    /// Path relative to the location base directory.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The `.mtb` file this request came from.
    pub fn source_file(&self) -> Option<&Path> {
        self.source_file.as_deref()
    }

    /// True when declared in the deps directory.
    pub fn is_direct(&self) -> bool {
        self.direct
    }

    /// Whether this request names a board support package.
    pub fn is_bsp(&self) -> bool {
        self.repo_name.starts_with(TARGET_PREFIX)
    }

    /// Whether the request is scoped to the project libs directory.
    pub fn is_local(&self) -> bool {
        self.location_type == AssetLocation::Local
    }

    /// Full filesystem path of the asset.
    pub fn full_path(&self, dirs: &DirList) -> PathBuf {
        let base = match self.location_type {
            AssetLocation::Absolute => return normalize(Path::new(&self.path)),
            AssetLocation::Local => &dirs.localdir,
            AssetLocation::Shared => &dirs.shareddir,
            AssetLocation::Global => &dirs.globaldir,
            AssetLocation::Project => &dirs.projdir,
        };
        join_relative(base, &self.path)
    }

    /// Directory the asset is cloned into (the parent of its full path).
    pub fn clone_dir(&self, dirs: &DirList) -> PathBuf {
        let full = self.full_path(dirs);
        full.parent().map(Path::to_path_buf).unwrap_or(full)
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Pick the repository name out of the location path.
fn extract_repo_name(location: &str, location_type: AssetLocation) -> Option<String> {
    let rest = match LEADING_TOKEN_REGEX.find(location) {
        Some(m) => &location[m.end()..],
        None => location,
    };

    let segments: Vec<&str> = rest.split('/').filter(|s| !s.is_empty()).collect();
    let offset = location_type.repo_name_offset();
    if segments.len() <= offset {
        return None;
    }

    Some(segments[segments.len() - 1 - offset].to_string())
}

/// Fall back to the last path segment of the repository URI.
fn repo_name_from_uri(uri: &str) -> Option<String> {
    let url = Url::parse(uri).ok()?;
    let last = url
        .path_segments()?
        .filter(|s| !s.is_empty())
        .last()?
        .to_string();
    Some(last.strip_suffix(".git").map(str::to_string).unwrap_or(last))
}

/// Relative path below the location base directory.
///
/// An unrecognized leading token is dropped and the rest is taken relative to
/// the project.
fn extract_path(location: &str, location_type: AssetLocation, repo_name: &str) -> String {
    if location_type == AssetLocation::Project {
        return match LEADING_TOKEN_REGEX.find(location) {
            Some(m) => location[m.end()..].trim_start_matches('/').to_string(),
            None => location.to_string(),
        };
    }

    let Some(caps) = LOCATION_REGEX.captures(location) else {
        return location.to_string();
    };

    let suffix = caps.get(2).map(|m| m.as_str()).unwrap_or("");
    if suffix.is_empty() && location_type == AssetLocation::Local {
        return repo_name.to_string();
    }

    if location_type.strips_leading_slash() {
        suffix.strip_prefix('/').unwrap_or(suffix).to_string()
    } else {
        suffix.to_string()
    }
}

/// Join a relative path onto a base without leaving a trailing separator.
fn join_relative(base: &Path, rel: &str) -> PathBuf {
    if rel.is_empty() {
        return normalize(base);
    }
    normalize(&base.join(rel))
}

/// Lexically resolve `.` and `..` components and drop trailing separators.
pub(crate) fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other),
        }
    }
    out
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl fmt::Display for MtbAssetRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}#{}", self.uri, self.commit, self.location)
    }
}

impl fmt::Display for AssetLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Local => "local",
            Self::Shared => "shared",
            Self::Global => "global",
            Self::Absolute => "absolute",
            Self::Project => "project",
        };
        write!(f, "{}", s)
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
