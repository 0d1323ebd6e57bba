//! One ModusToolbox project and its resolved assets.

use crate::assets::{
    DirList, MtbAssetInstance, MtbAssetRequest, MtbBspInstance, is_versioned_bsp_clone, normalize,
    parse_cyignore,
};
use crate::constants::{BSPS_DIR, CYIGNORE_FILE, MTB_FILE_EXT, TARGET_PREFIX};
use crate::error::{MtbError, MtbResult};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

pub const MTB_TARGET_VAR: &str = "MTB_TARGET";
pub const MTB_SEARCH_VAR: &str = "MTB_SEARCH";
pub const MTB_IGNORE_VAR: &str = "MTB_IGNORE";
pub const MTB_DEPS_DIR_VAR: &str = "MTB_DEPS_DIR";
pub const MTB_LIBS_VAR: &str = "MTB_LIBS";
pub const MTB_WKS_SHARED_DIR_VAR: &str = "MTB_WKS_SHARED_DIR";
pub const MTB_APP_NAME_VAR: &str = "MTB_APP_NAME";

const DEFAULT_DEPS_DIR: &str = "deps";
const DEFAULT_LIBS_DIR: &str = "libs";
const DEFAULT_SHARED_DIR: &str = "../mtb_shared";

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// A project, its build variables and everything resolved from its `.mtb` files.
///
/// All derived state is recomputed by [`initialize`](Self::initialize).
#[derive(Debug, Clone, Serialize)]
pub struct MtbProjectInfo {
    name: String,
    path: PathBuf,
    app_dir: PathBuf,
    vars: BTreeMap<String, String>,
    dirs: DirList,

    requests: Vec<MtbAssetRequest>,
    bsps: Vec<MtbBspInstance>,
    assets: Vec<MtbAssetInstance>,
    missing: Vec<MtbAssetRequest>,
    search_path: Vec<PathBuf>,
    ignore_path: Vec<PathBuf>,
    add_back: Vec<PathBuf>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl MtbProjectInfo {
    /// Create a project from its `get_app_info` variables.
    ///
    /// Relative directory variables are resolved against the project
    /// directory; the shared directory defaults to `mtb_shared` next to the
    /// application.
    pub fn new(
        path: impl Into<PathBuf>,
        app_dir: impl Into<PathBuf>,
        vars: BTreeMap<String, String>,
        global_dir: impl Into<PathBuf>,
    ) -> Self {
        let path = normalize(&path.into());
        let app_dir = normalize(&app_dir.into());

        let resolve = |value: &str| resolve_against(&path, value);
        let libs = resolve(var_or(&vars, MTB_LIBS_VAR, DEFAULT_LIBS_DIR));
        let shared = match vars.get(MTB_WKS_SHARED_DIR_VAR).filter(|v| !v.trim().is_empty()) {
            Some(dir) => resolve(dir),
            None => resolve_against(&app_dir, DEFAULT_SHARED_DIR),
        };

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self {
            name,
            dirs: DirList::new(libs, shared, global_dir, &path),
            path,
            app_dir,
            vars,
            requests: Vec::new(),
            bsps: Vec::new(),
            assets: Vec::new(),
            missing: Vec::new(),
            search_path: Vec::new(),
            ignore_path: Vec::new(),
            add_back: Vec::new(),
        }
    }

    /// Resolve every asset of the project.
    ///
    /// Fails when the dependencies directory cannot be created or when any
    /// `.mtb` file is malformed; all malformed files are reported together.
    pub fn initialize(&mut self) -> MtbResult<()> {
        let deps_dir = self.deps_dir();
        std::fs::create_dir_all(&deps_dir).map_err(|source| MtbError::DepsDir {
            path: deps_dir.clone(),
            source,
        })?;

        self.clear();

        self.requests = self.read_requests(&deps_dir)?;
        self.search_path = self.compute_search_path();
        self.ignore_path = self.compute_ignore_path();
        self.bsps = self.discover_bsps();
        self.resolve_assets();
        self.apply_target_bsp_cyignore();
        self.filter_add_back();

        tracing::debug!(
            "Project {}: {} requests, {} assets, {} missing, {} BSPs",
            self.name,
            self.requests.len(),
            self.assets.len(),
            self.missing.len(),
            self.bsps.len()
        );
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Project directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Application directory holding the project.
    pub fn app_dir(&self) -> &Path {
        &self.app_dir
    }

    pub fn vars(&self) -> &BTreeMap<String, String> {
        &self.vars
    }

    pub fn var(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    /// Application name, falling back to the directory name.
    pub fn app_name(&self) -> &str {
        self.var(MTB_APP_NAME_VAR).unwrap_or(&self.name)
    }

    /// Build target without the `TARGET_` prefix.
    pub fn target(&self) -> Option<&str> {
        self.var(MTB_TARGET_VAR).filter(|t| !t.is_empty())
    }

    /// Directory list used to resolve asset locations.
    pub fn dirs(&self) -> &DirList {
        &self.dirs
    }

    pub fn deps_dir(&self) -> PathBuf {
        resolve_against(&self.path, var_or(&self.vars, MTB_DEPS_DIR_VAR, DEFAULT_DEPS_DIR))
    }

    pub fn libs_dir(&self) -> &Path {
        &self.dirs.localdir
    }

    pub fn shared_dir(&self) -> &Path {
        &self.dirs.shareddir
    }

    pub fn requests(&self) -> &[MtbAssetRequest] {
        &self.requests
    }

    pub fn bsps(&self) -> &[MtbBspInstance] {
        &self.bsps
    }

    /// The BSP for the project's own target.
    pub fn target_bsp(&self) -> Option<&MtbBspInstance> {
        let wanted = format!("{}{}", TARGET_PREFIX, self.target()?);
        self.bsps.iter().find(|b| b.target == wanted)
    }

    /// Requests whose directory exists.
    pub fn assets(&self) -> &[MtbAssetInstance] {
        &self.assets
    }

    /// Requests whose directory does not exist.
    pub fn missing_assets(&self) -> &[MtbAssetRequest] {
        &self.missing
    }

    pub fn search_path(&self) -> &[PathBuf] {
        &self.search_path
    }

    pub fn ignore_path(&self) -> &[PathBuf] {
        &self.ignore_path
    }

    /// Search directories that no ignore entry covers.
    pub fn add_back(&self) -> &[PathBuf] {
        &self.add_back
    }

    /// Whether `path` equals or lies under an ignore entry.
    pub fn is_ignored(&self, path: &Path) -> bool {
        self.ignore_path.iter().any(|i| path.starts_with(i))
    }

    fn clear(&mut self) {
        self.requests.clear();
        self.bsps.clear();
        self.assets.clear();
        self.missing.clear();
        self.search_path.clear();
        self.ignore_path.clear();
        self.add_back.clear();
    }

    fn read_requests(&self, deps_dir: &Path) -> MtbResult<Vec<MtbAssetRequest>> {
        let mut requests = Vec::new();
        let mut errors = Vec::new();

        for (dir, direct) in [(deps_dir, true), (self.libs_dir(), false)] {
            if !dir.is_dir() {
                continue;
            }
            let pattern = format!(
                "{}/*.{}",
                glob::Pattern::escape(&dir.to_string_lossy()),
                MTB_FILE_EXT
            );
            for file in glob::glob(&pattern)?.flatten() {
                match MtbAssetRequest::from_file(&file, direct) {
                    Ok(found) => requests.extend(found),
                    Err(e) => errors.push(e.to_string()),
                }
            }
        }

        if !errors.is_empty() {
            return Err(MtbError::MalformedAssets { errors });
        }
        Ok(requests)
    }

    /// Whether a request belongs on this project's search path.
    fn wants_request(&self, request: &MtbAssetRequest) -> bool {
        if !request.is_bsp() {
            return true;
        }
        self.target()
            .is_some_and(|t| request.repo_name() == format!("{}{}", TARGET_PREFIX, t))
    }

    fn compute_search_path(&self) -> Vec<PathBuf> {
        let mut path = self.existing_var_dirs(MTB_SEARCH_VAR);

        let local = self
            .requests
            .iter()
            .filter(|r| r.is_local() && self.wants_request(r))
            .map(|r| r.clone_dir(&self.dirs));
        let other = self
            .requests
            .iter()
            .filter(|r| !r.is_local() && self.wants_request(r))
            .map(|r| r.full_path(&self.dirs));

        for dir in local.chain(other) {
            push_unique(&mut path, dir);
        }
        path
    }

    fn compute_ignore_path(&self) -> Vec<PathBuf> {
        let mut ignore = self.existing_var_dirs(MTB_IGNORE_VAR);
        for dir in &self.search_path {
            for entry in parse_cyignore(&dir.join(CYIGNORE_FILE), |name| self.asset_path(name)) {
                push_unique(&mut ignore, entry);
            }
        }
        ignore
    }

    fn discover_bsps(&self) -> Vec<MtbBspInstance> {
        let mut candidates: Vec<PathBuf> = self
            .search_path
            .iter()
            .filter(|d| is_versioned_bsp_clone(d))
            .cloned()
            .collect();

        for base in [&self.path, &self.app_dir] {
            let bsps = base.join(BSPS_DIR);
            if !bsps.is_dir() {
                continue;
            }
            for entry in WalkDir::new(&bsps)
                .min_depth(1)
                .max_depth(1)
                .sort_by_file_name()
                .into_iter()
                .flatten()
            {
                if entry.file_type().is_dir() {
                    candidates.push(entry.into_path());
                }
            }
        }

        candidates.extend(
            self.requests
                .iter()
                .filter(|r| r.is_bsp())
                .map(|r| r.full_path(&self.dirs)),
        );

        let mut bsps: Vec<MtbBspInstance> = Vec::new();
        for dir in candidates {
            if bsps.iter().any(|b| b.root == dir) {
                continue;
            }
            if let Some(bsp) = MtbBspInstance::probe(&dir) {
                tracing::debug!("Found BSP {} at {}", bsp.target, bsp.root.display());
                bsps.push(bsp);
            }
        }
        bsps
    }

    fn resolve_assets(&mut self) {
        for request in &self.requests {
            let full = request.full_path(&self.dirs);
            if full.is_dir() {
                if !self.assets.iter().any(|a| a.path == full) {
                    self.assets.push(MtbAssetInstance::load(full, request.clone()));
                }
            } else {
                tracing::debug!("Missing asset {} at {}", request.name(), full.display());
                self.missing.push(request.clone());
            }
        }
    }

    fn apply_target_bsp_cyignore(&mut self) {
        let Some(file) = self.target_bsp().map(MtbBspInstance::cyignore_path) else {
            return;
        };
        for entry in parse_cyignore(&file, |name| self.asset_path(name)) {
            push_unique(&mut self.ignore_path, entry);
        }
    }

    fn filter_add_back(&mut self) {
        self.add_back = self
            .search_path
            .iter()
            .filter(|p| !self.is_ignored(p))
            .cloned()
            .collect();
    }

    /// Resolved path of the asset called `name`.
    fn asset_path(&self, name: &str) -> Option<PathBuf> {
        self.requests
            .iter()
            .find(|r| r.name() == name)
            .map(|r| r.full_path(&self.dirs))
    }

    /// Existing directories listed in a whitespace separated variable.
    fn existing_var_dirs(&self, var: &str) -> Vec<PathBuf> {
        let mut dirs = Vec::new();
        for entry in self.var(var).unwrap_or_default().split_whitespace() {
            let dir = resolve_against(&self.path, entry);
            if dir.is_dir() {
                push_unique(&mut dirs, dir);
            } else {
                tracing::debug!("Ignoring {} entry {}: not a directory", var, dir.display());
            }
        }
        dirs
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

fn var_or<'a>(vars: &'a BTreeMap<String, String>, name: &str, default: &'a str) -> &'a str {
    vars.get(name)
        .map(String::as_str)
        .filter(|v| !v.trim().is_empty())
        .unwrap_or(default)
}

fn resolve_against(base: &Path, value: &str) -> PathBuf {
    let path = Path::new(value.trim());
    if path.is_absolute() {
        normalize(path)
    } else {
        normalize(&base.join(path))
    }
}

fn push_unique(list: &mut Vec<PathBuf>, path: PathBuf) {
    if !list.contains(&path) {
        list.push(path);
    }
}
