//! Registry scanning for packs and tool registrations.

use super::{Pack, PackDb};
use crate::constants::{CONTENT_PACK_TYPE, EAP_PACK_TYPE, MTB_PROPS_FILE, PROPS_FILE};
use crate::error::MtbResult;
use crate::platform::registry_dirs;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Scans registry directories into a [`PackDb`].
#[derive(Debug, Clone)]
pub struct PackLoader {
    registry_dirs: Vec<PathBuf>,
    early_access: Option<String>,
}

/// One registry JSON file.
#[derive(Debug, Deserialize)]
struct RegistryEntry {
    #[serde(rename = "featureId")]
    feature_id: Option<String>,

    #[serde(rename = "type")]
    entry_type: Option<String>,

    name: Option<String>,

    version: Option<String>,

    path: Option<PathBuf>,

    #[serde(rename = "exePath", alias = "exe")]
    exe_path: Option<PathBuf>,

    #[serde(default)]
    attributes: BTreeMap<String, Value>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl Default for PackLoader {
    fn default() -> Self {
        Self {
            registry_dirs: registry_dirs(),
            early_access: None,
        }
    }
}

impl PackLoader {
    /// Create a loader over explicit registry directories.
    pub fn new(dirs: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        Self {
            registry_dirs: dirs.into_iter().map(Into::into).collect(),
            early_access: None,
        }
    }

    /// Enable the early access pack with this feature id.
    pub fn with_early_access(mut self, feature_id: Option<String>) -> Self {
        self.early_access = feature_id.filter(|s| !s.is_empty());
        self
    }

    /// Registry directories scanned, in order.
    pub fn registry_dirs(&self) -> &[PathBuf] {
        &self.registry_dirs
    }

    /// Scan every registry directory.
    ///
    /// Missing directories and unreadable files are skipped.
    pub fn load(&self) -> MtbResult<PackDb> {
        let mut packs: Vec<Pack> = Vec::new();
        let mut tool_roots: Vec<PathBuf> = Vec::new();

        for dir in &self.registry_dirs {
            if !dir.is_dir() {
                continue;
            }

            let pattern = format!("{}/*.json", glob::Pattern::escape(&dir.to_string_lossy()));
            for file in glob::glob(&pattern)?.flatten() {
                let entry = match read_entry(&file) {
                    Ok(entry) => entry,
                    Err(e) => {
                        tracing::warn!("Skipping registry file {}: {}", file.display(), e);
                        continue;
                    }
                };

                if entry.entry_type.as_deref() == Some(CONTENT_PACK_TYPE) {
                    match pack_from_entry(entry) {
                        Some(pack) if !packs.iter().any(|p| p.feature_id == pack.feature_id) => {
                            tracing::debug!("Found pack {} at {}", pack.feature_id, pack.path.display());
                            packs.push(pack);
                        }
                        Some(_) => {}
                        None => tracing::debug!("Ignoring incomplete pack {}", file.display()),
                    }
                } else if let Some(root) = tool_root_from_entry(&entry) {
                    if !tool_roots.contains(&root) {
                        tracing::debug!("Registry tool root {}", root.display());
                        tool_roots.push(root);
                    }
                }
            }
        }

        let eap = self.early_access.as_ref().and_then(|id| {
            packs
                .iter()
                .find(|p| p.pack_type == EAP_PACK_TYPE && &p.feature_id == id)
                .cloned()
        });
        if let (Some(id), None) = (&self.early_access, &eap) {
            tracing::warn!("Early access pack '{}' is enabled but not installed", id);
        }

        Ok(PackDb::new(packs, eap, tool_roots))
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

fn read_entry(file: &Path) -> MtbResult<RegistryEntry> {
    let content = std::fs::read_to_string(file)?;
    Ok(serde_json::from_str(&content)?)
}

/// Accept a content pack only when it is complete and installed.
fn pack_from_entry(entry: RegistryEntry) -> Option<Pack> {
    let feature_id = entry.feature_id.filter(|s| !s.is_empty())?;
    let pack_type = entry
        .attributes
        .get("pack-type")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())?
        .to_string();
    let path = entry.path.filter(|p| p.is_dir())?;

    Some(Pack {
        feature_id,
        name: entry.name,
        version: entry.version,
        pack_type,
        path,
    })
}

/// Tool root of a non-pack registration.
fn tool_root_from_entry(entry: &RegistryEntry) -> Option<PathBuf> {
    if let Some(root) = entry.attributes.get("tools-root").and_then(Value::as_str) {
        return Some(PathBuf::from(root));
    }

    let exe = entry.exe_path.as_ref()?;
    exe.ancestors()
        .skip(1)
        .find(|dir| dir.join(MTB_PROPS_FILE).is_file() || dir.join(PROPS_FILE).is_file())
        .map(Path::to_path_buf)
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::ToolSource;
    use tempfile::TempDir;

    fn write(path: &Path, content: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn test_pack_acceptance() {
        let reg = TempDir::new().unwrap();
        let installs = TempDir::new().unwrap();
        let tech = installs.path().join("tech");
        std::fs::create_dir_all(tech.join("tools")).unwrap();

        write(
            &reg.path().join("tech.json"),
            &format!(
                r#"{{"featureId":"com.ifx.tech","type":"content-pack","path":{:?},"attributes":{{"pack-type":"tech"}}}}"#,
                tech
            ),
        );
        write(
            &reg.path().join("no-type.json"),
            &format!(
                r#"{{"featureId":"com.ifx.notype","type":"content-pack","path":{:?}}}"#,
                tech
            ),
        );
        write(
            &reg.path().join("no-path.json"),
            r#"{"featureId":"com.ifx.gone","type":"content-pack","path":"/does/not/exist","attributes":{"pack-type":"tech"}}"#,
        );
        write(&reg.path().join("broken.json"), "{ nope");

        let db = PackLoader::new([reg.path()]).load().unwrap();
        assert_eq!(db.packs().len(), 1);
        assert_eq!(db.packs()[0].feature_id, "com.ifx.tech");
        assert_eq!(
            db.tool_dirs(),
            vec![(tech.join("tools"), ToolSource::TechPack)]
        );
    }

    #[test]
    fn test_early_access_selection() {
        let reg = TempDir::new().unwrap();
        let installs = TempDir::new().unwrap();
        for name in ["eap1", "eap2"] {
            let dir = installs.path().join(name);
            write(&dir.join("manifest").join("mtb-super-manifest-fv2.xml"), "<super-manifest/>");
            write(
                &reg.path().join(format!("{}.json", name)),
                &format!(
                    r#"{{"featureId":"com.ifx.{}","type":"content-pack","path":{:?},"attributes":{{"pack-type":"early-access"}}}}"#,
                    name, dir
                ),
            );
        }

        let db = PackLoader::new([reg.path()]).load().unwrap();
        assert!(db.active_eap().is_none());
        assert!(db.manifests().is_empty());

        let db = PackLoader::new([reg.path()])
            .with_early_access(Some("com.ifx.eap2".into()))
            .load()
            .unwrap();
        assert_eq!(db.active_eap().unwrap().feature_id, "com.ifx.eap2");
        let manifests = db.manifests();
        assert_eq!(manifests.len(), 1);
        assert!(manifests[0].iseap);
    }

    #[test]
    fn test_registry_dir_with_glob_metacharacters() {
        let reg = TempDir::new().unwrap();
        let dir = reg.path().join("Infineon [IDC]");
        write(
            &dir.join("rooted.json"),
            r#"{"featureId":"com.ifx.rooted","attributes":{"tools-root":"/opt/ifx/tools"}}"#,
        );

        let db = PackLoader::new([dir.clone()]).load().unwrap();
        assert_eq!(db.idc_tool_roots(), &[PathBuf::from("/opt/ifx/tools")]);
    }

    #[test]
    fn test_tool_registrations() {
        let reg = TempDir::new().unwrap();
        let installs = TempDir::new().unwrap();
        let tool = installs.path().join("fancy-tool");
        write(&tool.join("mtbprops.json"), "{}");
        write(&tool.join("bin").join("fancy"), "");

        write(
            &reg.path().join("a.json"),
            r#"{"featureId":"com.ifx.rooted","attributes":{"tools-root":"/opt/ifx/tools"}}"#,
        );
        write(
            &reg.path().join("b.json"),
            &format!(
                r#"{{"featureId":"com.ifx.fancy","exePath":{:?}}}"#,
                tool.join("bin").join("fancy")
            ),
        );

        let db = PackLoader::new([reg.path()]).load().unwrap();
        assert_eq!(
            db.idc_tool_roots(),
            &[PathBuf::from("/opt/ifx/tools"), tool.clone()]
        );
    }
}
