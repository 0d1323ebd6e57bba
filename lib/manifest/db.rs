//! Merged catalog of apps, boards and middleware.

use super::types::{DependerRecord, ItemKind, MtbDependency, MtbItem, MtbItemVersion};
use crate::version::{MtbVersion, extract_commit_version};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Catalog built from every loaded manifest.
///
/// An id seen in several manifests is merged into one item. A version number
/// defined twice with different content rejects the id for the rest of the
/// load, unless exactly one definition is early access, which then replaces
/// the other.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ManifestDb {
    apps: BTreeMap<String, MtbItem>,
    boards: BTreeMap<String, MtbItem>,
    middleware: BTreeMap<String, MtbItem>,
    rejected: BTreeSet<String>,
    loaded: bool,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl ManifestDb {
    /// Create an empty database.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or merge an item.
    pub fn add_item(&mut self, item: MtbItem) {
        if self.rejected.contains(&item.id) {
            tracing::debug!("Ignoring rejected {} {}", item.kind(), item.id);
            return;
        }

        let map = self.map_mut(item.kind());
        let Some(existing) = map.get_mut(&item.id) else {
            map.insert(item.id.clone(), item);
            return;
        };

        if let Err(reason) = merge_item(existing, item) {
            let id = existing.id.clone();
            tracing::error!("Dropping {}: {}", id, reason);
            map.remove(&id);
            self.rejected.insert(id);
        }
    }

    /// Attach dependency edges to the versions they name.
    pub fn add_dependencies(&mut self, records: Vec<DependerRecord>) {
        for record in records {
            let kind = [ItemKind::Middleware, ItemKind::Board, ItemKind::App]
                .into_iter()
                .find(|&kind| self.map(kind).contains_key(&record.id));
            let Some(item) = kind.and_then(|kind| self.map_mut(kind).get_mut(&record.id)) else {
                tracing::debug!("Dependencies for unknown item {}", record.id);
                continue;
            };

            for deps in record.versions {
                match item.versions.iter_mut().find(|v| v.commit == deps.commit) {
                    Some(version) => version.dependencies = deps.dependees,
                    None => tracing::debug!(
                        "Dependencies for unknown commit {} of {}",
                        deps.commit,
                        record.id
                    ),
                }
            }
        }
    }

    /// Mark the database as completely loaded.
    pub fn set_loaded(&mut self) {
        self.loaded = true;
    }

    /// Whether a complete load finished.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Ids dropped because of conflicting version definitions.
    pub fn rejected_ids(&self) -> &BTreeSet<String> {
        &self.rejected
    }

    pub fn app(&self, id: &str) -> Option<&MtbItem> {
        self.apps.get(id)
    }

    pub fn board(&self, id: &str) -> Option<&MtbItem> {
        self.boards.get(id)
    }

    pub fn middleware(&self, id: &str) -> Option<&MtbItem> {
        self.middleware.get(id)
    }

    pub fn apps(&self) -> impl Iterator<Item = &MtbItem> {
        self.apps.values()
    }

    pub fn boards(&self) -> impl Iterator<Item = &MtbItem> {
        self.boards.values()
    }

    pub fn middlewares(&self) -> impl Iterator<Item = &MtbItem> {
        self.middleware.values()
    }

    /// Whether some version of `app` runs on `board` at `version`.
    ///
    /// The board offers its own capabilities plus those of the version. Every
    /// plain requirement must be offered. Every v2 `[a,b]` group needs one
    /// member offered; a plain v2 requirement must be offered by the board
    /// itself.
    pub fn match_code_example_to_bsp(
        &self,
        app: &MtbItem,
        board: &MtbItem,
        version: &MtbItemVersion,
    ) -> bool {
        let provides: BTreeSet<&str> = board
            .provides
            .iter()
            .chain(version.provides.iter())
            .map(String::as_str)
            .collect();
        let board_provides: BTreeSet<&str> = board.provides.iter().map(String::as_str).collect();

        app.versions.iter().any(|app_version| {
            let v1 = app
                .requires
                .iter()
                .chain(app_version.requirements.iter())
                .all(|req| provides.contains(req.as_str()));

            let v2 = app
                .requiresv2
                .iter()
                .chain(app_version.requirementsv2.iter())
                .all(|req| match or_group(req) {
                    Some(members) => members.iter().any(|m| provides.contains(m)),
                    None => board_provides.contains(req.as_str()),
                });

            v1 && v2
        })
    }

    /// Code examples compatible with a board.
    ///
    /// Without a version number the board's latest version is used.
    pub fn code_examples_for_board(&self, board_id: &str, version_num: Option<&str>) -> Vec<&MtbItem> {
        let Some(board) = self.board(board_id) else {
            return Vec::new();
        };
        let version = match version_num {
            Some(num) => board.version(num),
            None => latest_version(board),
        };
        let Some(version) = version else {
            return Vec::new();
        };

        self.apps()
            .filter(|app| self.match_code_example_to_bsp(app, board, version))
            .collect()
    }

    /// Latest version of an item.
    pub fn latest_version<'a>(&self, item: &'a MtbItem) -> Option<&'a MtbItemVersion> {
        latest_version(item)
    }

    /// Dependencies of the item version with this commit.
    pub fn dependencies_for(&self, id: &str, commit: &str) -> &[MtbDependency] {
        self.middleware(id)
            .or_else(|| self.board(id))
            .or_else(|| self.app(id))
            .and_then(|item| item.version_by_commit(commit))
            .map(|v| v.dependencies.as_slice())
            .unwrap_or(&[])
    }

    fn map(&self, kind: ItemKind) -> &BTreeMap<String, MtbItem> {
        match kind {
            ItemKind::App => &self.apps,
            ItemKind::Board => &self.boards,
            ItemKind::Middleware => &self.middleware,
        }
    }

    fn map_mut(&mut self, kind: ItemKind) -> &mut BTreeMap<String, MtbItem> {
        match kind {
            ItemKind::App => &mut self.apps,
            ItemKind::Board => &mut self.boards,
            ItemKind::Middleware => &mut self.middleware,
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// The version with the greatest `vX.Y[.Z]` in its commit.
///
/// Versions whose number contains "latest" are never chosen.
pub fn latest_version(item: &MtbItem) -> Option<&MtbItemVersion> {
    let mut best: Option<(&MtbItemVersion, Option<MtbVersion>)> = None;

    for version in &item.versions {
        if version.num.to_lowercase().contains("latest") {
            continue;
        }
        let embedded = extract_commit_version(&version.commit);
        let better = match &best {
            None => true,
            Some((_, current)) => embedded > *current,
        };
        if better {
            best = Some((version, embedded));
        }
    }

    best.map(|(v, _)| v)
}

/// Members of a `[a,b]` group, or `None` for a plain requirement.
fn or_group(req: &str) -> Option<Vec<&str>> {
    let inner = req.strip_prefix('[')?.strip_suffix(']')?;
    Some(
        inner
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect(),
    )
}

fn merge_item(existing: &mut MtbItem, incoming: MtbItem) -> Result<(), String> {
    let id = existing.id.clone();
    let kind = existing.kind();
    let warn_scalar = |field: &str, a: &dyn std::fmt::Debug, b: &dyn std::fmt::Debug| {
        tracing::warn!(
            "{} {}: '{}' differs between manifests ({:?} vs {:?})",
            kind,
            id,
            field,
            a,
            b
        );
    };

    if existing.name != incoming.name {
        warn_scalar("name", &existing.name, &incoming.name);
    }
    if existing.details != incoming.details {
        warn_scalar("details", &existing.details, &incoming.details);
    }
    for (field, a, b) in [
        ("provides", &existing.provides, &incoming.provides),
        ("requires", &existing.requires, &incoming.requires),
        ("requiresv2", &existing.requiresv2, &incoming.requiresv2),
    ] {
        let a: BTreeSet<&String> = a.iter().collect();
        let b: BTreeSet<&String> = b.iter().collect();
        if a != b {
            warn_scalar(field, &a, &b);
        }
    }

    let mut versions = existing.versions.clone();
    for version in incoming.versions {
        match versions.iter().position(|v| v.num == version.num) {
            None => versions.push(version),
            Some(i) if versions[i].same_definition(&version) => {}
            Some(i) if version.eap && !versions[i].eap => {
                tracing::debug!("Early access definition of {} {} wins", id, version.num);
                versions[i] = version;
            }
            Some(i) if versions[i].eap && !version.eap => {}
            Some(_) => {
                return Err(format!(
                    "version {} is defined twice with different content",
                    version.num
                ));
            }
        }
    }

    existing.versions = versions;
    Ok(())
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
