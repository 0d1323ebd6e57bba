//! Device catalog read from `mpn/mpn.xml` files.

use crate::constants::MPN_CATALOG_FILE;
use crate::error::MtbResult;
use roxmltree::{Document, Node};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// How deep below a root catalogs are searched for.
const MAX_SCAN_DEPTH: usize = 6;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// One orderable part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MpnRecord {
    pub mpn: String,
    pub die: Option<String>,
    pub family: Option<String>,
}

/// Parts from every catalog found, keyed by part number.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DeviceDb {
    records: BTreeMap<String, MpnRecord>,
    catalogs: Vec<PathBuf>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl DeviceDb {
    /// Read every catalog under `roots`. The first definition of a part wins.
    pub fn scan(roots: &[PathBuf]) -> MtbResult<Self> {
        let mut db = Self::default();

        for root in roots.iter().filter(|r| r.is_dir()) {
            for entry in WalkDir::new(root)
                .max_depth(MAX_SCAN_DEPTH)
                .sort_by_file_name()
                .into_iter()
                .flatten()
            {
                let path = entry.path();
                if entry.file_type().is_file() && path.ends_with(MPN_CATALOG_FILE) {
                    db.add_catalog(path)?;
                }
            }
        }

        tracing::debug!(
            "Device database has {} parts from {} catalogs",
            db.records.len(),
            db.catalogs.len()
        );
        Ok(db)
    }

    /// Part by number.
    pub fn get(&self, mpn: &str) -> Option<&MpnRecord> {
        self.records.get(mpn)
    }

    /// Every part, ordered by number.
    pub fn records(&self) -> impl Iterator<Item = &MpnRecord> {
        self.records.values()
    }

    /// Catalog files read.
    pub fn catalogs(&self) -> &[PathBuf] {
        &self.catalogs
    }

    /// Parts on a die.
    pub fn parts_for_die<'a>(&'a self, die: &'a str) -> impl Iterator<Item = &'a MpnRecord> {
        self.records()
            .filter(move |r| r.die.as_deref() == Some(die))
    }

    fn add_catalog(&mut self, file: &Path) -> MtbResult<()> {
        let text = std::fs::read_to_string(file)?;
        for record in parse_mpn_catalog(&text)? {
            self.records.entry(record.mpn.clone()).or_insert(record);
        }
        self.catalogs.push(file.to_path_buf());
        Ok(())
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Decode the `<mpn>` elements of a catalog. Elements without a part number
/// are skipped.
pub fn parse_mpn_catalog(text: &str) -> MtbResult<Vec<MpnRecord>> {
    let doc = Document::parse(text)?;

    Ok(doc
        .descendants()
        .filter(|n| n.is_element() && n.tag_name().name() == "mpn")
        .filter_map(|n| {
            let mpn = field(n, "id").or_else(|| field(n, "name"))?;
            Some(MpnRecord {
                mpn,
                die: field(n, "die"),
                family: field(n, "family"),
            })
        })
        .collect())
}

fn field(node: Node, name: &str) -> Option<String> {
    node.attribute(name)
        .map(str::to_string)
        .or_else(|| {
            node.children()
                .find(|c| c.is_element() && c.tag_name().name() == name)
                .and_then(|c| c.text())
                .map(|t| t.trim().to_string())
        })
        .filter(|s| !s.is_empty())
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
