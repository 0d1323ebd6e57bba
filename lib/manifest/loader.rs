//! Three stage manifest loading.
//!
//! Super-manifests are fetched and decoded first, then every content manifest
//! they list, then every dependency manifest. Each stage is all-or-nothing and
//! the next stage starts only after the previous one completed.

use super::db::ManifestDb;
use super::fetch::ManifestFetcher;
use super::types::{ContentRef, DependerRecord, MtbItem, PackManifest};
use super::xml::{parse_content_manifest, parse_dependency_manifest, parse_super_manifest};
use crate::error::MtbResult;
use futures_util::future::try_join_all;
use std::path::Path;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Builds a [`ManifestDb`] from a list of super-manifests.
#[derive(Debug, Clone)]
pub struct ManifestLoader {
    fetcher: ManifestFetcher,
    sources: Vec<PackManifest>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl ManifestLoader {
    /// Create a loader. Early access sources are loaded first.
    pub fn new(fetcher: ManifestFetcher, mut sources: Vec<PackManifest>) -> Self {
        sources.sort_by_key(|s| !s.iseap);
        Self { fetcher, sources }
    }

    /// Super-manifest sources in load order.
    pub fn sources(&self) -> &[PackManifest] {
        &self.sources
    }

    /// Run every stage and return the merged database.
    pub async fn load(&self) -> MtbResult<ManifestDb> {
        let content_refs: Vec<ContentRef> =
            try_join_all(self.sources.iter().map(|s| self.load_super(s)))
                .await?
                .into_iter()
                .flatten()
                .collect();
        tracing::debug!("Super-manifests list {} content manifests", content_refs.len());

        let items = try_join_all(content_refs.iter().map(|r| self.load_content(&r.source))).await?;

        let mut db = ManifestDb::new();
        for item in items.into_iter().flatten() {
            db.add_item(item);
        }

        let mut dependency_uris: Vec<&str> = Vec::new();
        for uri in content_refs.iter().filter_map(|r| r.dependency_uri.as_deref()) {
            if !dependency_uris.contains(&uri) {
                dependency_uris.push(uri);
            }
        }

        let records = try_join_all(dependency_uris.iter().map(|uri| self.load_dependencies(uri))).await?;
        for batch in records {
            db.add_dependencies(batch);
        }

        db.set_loaded();
        tracing::info!(
            "Loaded manifests: {} apps, {} boards, {} middleware",
            db.apps().count(),
            db.boards().count(),
            db.middlewares().count()
        );
        Ok(db)
    }

    async fn load_super(&self, source: &PackManifest) -> MtbResult<Vec<ContentRef>> {
        match self.fetcher.fetch(&source.uripath).await? {
            Some(text) => parse_super_manifest(&text, source),
            None => Ok(Vec::new()),
        }
    }

    async fn load_content(&self, source: &PackManifest) -> MtbResult<Vec<MtbItem>> {
        match self.fetcher.fetch(&source.uripath).await? {
            Some(text) => parse_content_manifest(&text, source),
            None => Ok(Vec::new()),
        }
    }

    async fn load_dependencies(&self, uri: &str) -> MtbResult<Vec<DependerRecord>> {
        match self.fetcher.fetch(uri).await? {
            Some(text) => parse_dependency_manifest(&text, uri),
            None => Ok(Vec::new()),
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Super-manifest sources for a load.
///
/// Pack manifests come first, then the remote super-manifests, then the
/// entries of the user's `manifest.loc` file.
pub fn super_manifest_sources(
    pack_manifests: Vec<PackManifest>,
    remote: &[String],
    manifest_loc: Option<&Path>,
) -> Vec<PackManifest> {
    let mut sources = pack_manifests;
    sources.extend(remote.iter().map(|uri| PackManifest::new(uri.clone(), false)));
    if let Some(file) = manifest_loc {
        sources.extend(
            read_manifest_loc(file)
                .into_iter()
                .map(|uri| PackManifest::new(uri, false)),
        );
    }
    sources
}

/// Extra super-manifest locations, one per line.
pub fn read_manifest_loc(file: &Path) -> Vec<String> {
    match std::fs::read_to_string(file) {
        Ok(content) => content
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .map(str::to_string)
            .collect(),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
        Err(e) => {
            tracing::warn!("Cannot read {}: {}", file.display(), e);
            Vec::new()
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MtbError;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    fn boards_xml(num: &str, commit: &str) -> String {
        format!(
            r#"<boards><board><id>BOARD1</id><name>Board One</name><category>Kits</category>
                <chips><mcu>CY8C624</mcu></chips><prov_capabilities>CAPA</prov_capabilities>
                <versions><version><num>{}</num><commit>{}</commit></version></versions>
            </board></boards>"#,
            num, commit
        )
    }

    fn super_xml(boards: &str, deps: Option<&str>) -> String {
        let deps = deps
            .map(|d| format!(r#" dependency-url="{}""#, d))
            .unwrap_or_default();
        format!(
            r#"<super-manifest version="2.0">
                <board-manifest-list><board-manifest{}><uri>{}</uri></board-manifest></board-manifest-list>
                <app-manifest-list><app-manifest><uri>apps.xml</uri></app-manifest></app-manifest-list>
            </super-manifest>"#,
            deps, boards
        )
    }

    #[tokio::test]
    async fn test_pipeline_from_files() {
        let dir = TempDir::new().unwrap();
        let one = dir.path().join("one");
        let two = dir.path().join("two");
        std::fs::create_dir_all(&one).unwrap();
        std::fs::create_dir_all(&two).unwrap();

        let apps = r#"<apps><app><id>mtb-example-blinky</id><req_capabilities>CAPA</req_capabilities>
            <versions><version num="1.0" commit="release-v1.0.0"/></versions></app></apps>"#;
        let deps = r#"<dependencies><depender><id>BOARD1</id><versions><version>
            <commit>release-v1.0.0</commit>
            <dependees><dependee><id>core-lib</id><commit>release-v1.4.0</commit></dependee></dependees>
            </version></versions></depender></dependencies>"#;

        write(&one, "apps.xml", apps);
        write(&one, "deps.xml", deps);
        write(&one, "boards.xml", &boards_xml("1.0", "release-v1.0.0"));
        let s1 = write(&one, "super.xml", &super_xml("boards.xml", Some("deps.xml")));

        write(&two, "apps.xml", apps);
        write(&two, "boards.xml", &boards_xml("2.0", "release-v2.0.0"));
        let s2 = write(&two, "super.xml", &super_xml("boards.xml", None));

        let loader = ManifestLoader::new(
            ManifestFetcher::with_default_timeout().unwrap(),
            vec![PackManifest::from_path(&s1, false), PackManifest::from_path(&s2, false)],
        );
        let db = loader.load().await.unwrap();

        assert!(db.is_loaded());
        let board = db.board("BOARD1").unwrap();
        let nums: Vec<&str> = board.versions.iter().map(|v| v.num.as_str()).collect();
        assert_eq!(nums, vec!["1.0", "2.0"]);
        assert_eq!(db.apps().count(), 1);
        assert_eq!(db.dependencies_for("BOARD1", "release-v1.0.0").len(), 1);
        assert_eq!(db.code_examples_for_board("BOARD1", None).len(), 1);
    }

    #[tokio::test]
    async fn test_stage_failure_rejects_load() {
        let dir = TempDir::new().unwrap();
        let good = write(dir.path(), "super.xml", &super_xml("boards.xml", None));
        write(dir.path(), "boards.xml", &boards_xml("1.0", "release-v1.0.0"));
        // apps.xml is missing

        let loader = ManifestLoader::new(
            ManifestFetcher::with_default_timeout().unwrap(),
            vec![PackManifest::from_path(&good, false)],
        );
        assert!(matches!(
            loader.load().await,
            Err(MtbError::ManifestFetch { .. })
        ));
    }

    #[test]
    fn test_sources_order() {
        let dir = TempDir::new().unwrap();
        let loc = write(
            dir.path(),
            "manifest.loc",
            "# extra manifests\n\nfile:///opt/custom/super.xml\n",
        );

        let sources = super_manifest_sources(
            vec![PackManifest::new("file:///pack/super.xml", false)],
            &["https://example.com/super.xml".to_string()],
            Some(&loc),
        );
        let uris: Vec<&str> = sources.iter().map(|s| s.uripath.as_str()).collect();
        assert_eq!(
            uris,
            vec![
                "file:///pack/super.xml",
                "https://example.com/super.xml",
                "file:///opt/custom/super.xml"
            ]
        );

        let mut with_eap = sources.clone();
        with_eap.push(PackManifest::new("file:///eap/super.xml", true));
        let loader = ManifestLoader::new(ManifestFetcher::with_default_timeout().unwrap(), with_eap);
        assert!(loader.sources()[0].iseap);
        assert!(read_manifest_loc(&dir.path().join("missing.loc")).is_empty());
    }
}
