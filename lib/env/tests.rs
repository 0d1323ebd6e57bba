//! Environment load tests.

use super::{EnvEvent, LoadFlags, ModusToolboxEnvironment, Subsystem, SubsystemState};
use crate::config::EnvConfig;
use crate::error::{MtbError, MtbResult};
use crate::process::CommandRunner;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use tokio::sync::Notify;

//--------------------------------------------------------------------------------------------------
// Helpers
//--------------------------------------------------------------------------------------------------

/// Answers `get_app_info` for a combined application, optionally waiting
/// for a release signal first.
#[derive(Debug, Default)]
struct GatedRunner {
    gated: bool,
    started: Notify,
    release: Notify,
}

#[async_trait]
impl CommandRunner for GatedRunner {
    async fn run(&self, _program: &str, _args: &[String], _cwd: &Path) -> MtbResult<(i32, Vec<String>)> {
        if self.gated {
            self.started.notify_one();
            self.release.notified().await;
        }
        tokio::task::yield_now().await;
        Ok((0, vec!["MTB_TYPE=COMBINED".into(), "MTB_TARGET=KIT_A".into()]))
    }
}

fn write(path: &Path, content: &str) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

/// A workspace with a tools directory holding one tool, a local
/// super-manifest with one board and one device catalog.
fn workspace() -> (TempDir, EnvConfig) {
    let ws = TempDir::new().unwrap();
    let root = ws.path();

    write(
        &root.join("tools_3.2/device-configurator/props.json"),
        r#"{"core": {"id": "device-configurator", "name": "Device Configurator", "version": "4.20.0"}}"#,
    );
    write(
        &root.join("manifests/super.xml"),
        r#"<super-manifest version="2.0"><board-manifest-list>
            <board-manifest><uri>boards.xml</uri></board-manifest>
        </board-manifest-list></super-manifest>"#,
    );
    write(
        &root.join("manifests/boards.xml"),
        r#"<boards><board><id>KIT_A</id><name>Kit A</name>
            <versions><version><num>1.0</num><commit>release-v1.0.0</commit></version></versions>
        </board></boards>"#,
    );
    write(
        &root.join("devices/mpn/mpn.xml"),
        r#"<mpn-list><mpn id="CY8C6247BZI-D54" die="PSoC6A2M"/></mpn-list>"#,
    );
    std::fs::create_dir_all(root.join("app")).unwrap();

    let config = EnvConfig {
        tools_dir: Some(root.join("tools_3.2")),
        registry_dirs: vec![root.join("registry")],
        super_manifests: vec![root.join("manifests/super.xml").to_string_lossy().into_owned()],
        manifest_loc: Some(root.join("manifest.loc")),
        global_dir: Some(root.join("global")),
        device_db_dirs: vec![root.join("devices")],
        ..EnvConfig::default()
    };
    (ws, config)
}

fn environment(config: EnvConfig, runner: Arc<GatedRunner>) -> ModusToolboxEnvironment {
    ModusToolboxEnvironment::with_runner(config, runner)
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[tokio::test]
async fn test_load_everything() {
    let (ws, config) = workspace();
    let env = environment(config, Arc::new(GatedRunner::default()));
    let mut events = env.subscribe();

    env.load(LoadFlags::ALL, Some(&ws.path().join("app")))
        .await
        .unwrap();

    assert!(env.has(LoadFlags::ALL).await);
    assert!(!env.is_loading().await);
    assert_eq!(env.tools_dir().await, Some(ws.path().join("tools_3.2")));
    assert!(env.tools().await.find_tool_by_guid("device-configurator").is_some());
    assert!(env.manifest().await.board("KIT_A").is_some());
    assert!(env.device_db().await.get("CY8C6247BZI-D54").is_some());
    assert_eq!(env.app_info().await.as_ref().unwrap().projects().len(), 1);
    assert!(ws.path().join("app/deps").is_dir());

    assert_eq!(events.recv().await.unwrap(), EnvEvent::Loaded(LoadFlags::ALL));
}

#[tokio::test]
async fn test_packs_always_load_first() {
    let (_ws, config) = workspace();
    let env = environment(config, Arc::new(GatedRunner::default()));

    env.load(LoadFlags::TOOLS, None).await.unwrap();

    let state = env.state().await;
    assert_eq!(state.get(Subsystem::Packs), SubsystemState::Loaded);
    assert_eq!(state.get(Subsystem::Tools), SubsystemState::Loaded);
    assert_eq!(state.get(Subsystem::ManifestData), SubsystemState::NotRequested);
    assert!(env.manifest().await.boards().next().is_none());
}

#[tokio::test]
async fn test_load_while_loading_is_rejected() {
    let (ws, config) = workspace();
    let runner = Arc::new(GatedRunner {
        gated: true,
        ..GatedRunner::default()
    });
    let env = Arc::new(environment(config, runner.clone()));

    let first = tokio::spawn({
        let env = env.clone();
        let app = ws.path().join("app");
        async move { env.load(LoadFlags::APP_INFO, Some(&app)).await }
    });
    runner.started.notified().await;

    let before = env.state().await.has();
    let second = env.load(LoadFlags::TOOLS | LoadFlags::MANIFEST_DATA, None).await;
    assert!(matches!(second, Err(MtbError::AlreadyLoading)));
    assert_eq!(env.state().await.has(), before);
    assert!(env.is_loading().await);

    runner.release.notify_one();
    first.await.unwrap().unwrap();
    assert!(env.has(LoadFlags::APP_INFO).await);
    assert!(!env.has(LoadFlags::TOOLS).await);
}

#[tokio::test]
async fn test_failure_resets_everything() {
    let (ws, mut config) = workspace();
    config.super_manifests = vec![ws.path().join("missing.xml").to_string_lossy().into_owned()];
    let env = environment(config, Arc::new(GatedRunner::default()));
    let mut events = env.subscribe();

    env.load(LoadFlags::TOOLS, None).await.unwrap();
    assert!(env.has(LoadFlags::TOOLS).await);
    let _ = events.recv().await.unwrap();

    let result = env.load(LoadFlags::MANIFEST_DATA | LoadFlags::DEVICE_DB, None).await;
    assert!(matches!(result, Err(MtbError::ManifestFetch { .. })));

    let state = env.state().await;
    assert!(state.has().is_empty());
    assert_eq!(state.get(Subsystem::ManifestData), SubsystemState::Failed);
    assert_eq!(state.get(Subsystem::Tools), SubsystemState::NotRequested);
    assert!(env.tools().await.all_tools().is_empty());
    assert!(matches!(events.recv().await.unwrap(), EnvEvent::LoadFailed(_)));

    // A later load starts from scratch.
    env.load(LoadFlags::TOOLS, None).await.unwrap();
    assert!(env.has(LoadFlags::TOOLS | LoadFlags::PACKS).await);
}

#[tokio::test]
async fn test_device_db_includes_assets_of_app_loaded_together() {
    let (ws, config) = workspace();
    let app = ws.path().join("app");
    write(
        &app.join("deps/device-db.mtb"),
        "https://github.com/org/device-db#release-v4.0.0#$$ASSET_REPO$$device-db/release-v4.0.0\n",
    );
    write(
        &ws.path().join("mtb_shared/device-db/release-v4.0.0/mpn/mpn.xml"),
        r#"<mpn-list><mpn id="CY8C6347BZI-BLD53" die="PSoC6ABLE2"/></mpn-list>"#,
    );
    let env = environment(config, Arc::new(GatedRunner::default()));

    env.load(LoadFlags::APP_INFO | LoadFlags::DEVICE_DB, Some(&app))
        .await
        .unwrap();

    let devices = env.device_db().await;
    assert!(devices.get("CY8C6347BZI-BLD53").is_some());
    assert!(devices.get("CY8C6247BZI-D54").is_some());
}

#[tokio::test]
async fn test_reload_app_info() {
    let (ws, config) = workspace();
    let env = environment(config, Arc::new(GatedRunner::default()));

    assert!(matches!(
        env.reload_app_info().await,
        Err(MtbError::AppInfo(_))
    ));

    let app = ws.path().join("app");
    env.load(LoadFlags::APP_INFO, Some(&app)).await.unwrap();

    let mut events = env.subscribe();
    write(
        &app.join("deps/core-lib.mtb"),
        "https://github.com/org/core-lib#release-v1.4.0#$$ASSET_REPO$$core-lib/release-v1.4.0\n",
    );
    env.reload_app_info().await.unwrap();

    assert_eq!(events.recv().await.unwrap(), EnvEvent::Loaded(LoadFlags::APP_INFO | LoadFlags::PACKS));
    assert_eq!(events.recv().await.unwrap(), EnvEvent::AppUpdated(PathBuf::from(&app)));

    let info = env.app_info().await;
    let project = &info.as_ref().unwrap().projects()[0];
    assert_eq!(project.missing_assets().len(), 1);
}

#[tokio::test]
async fn test_missing_tools_dir() {
    let (ws, mut config) = workspace();
    config.tools_dir = None;
    config.exe_path = Some(ws.path().join("bin/mtbenv"));
    config.install_root = Some(ws.path().join("nowhere"));
    let env = environment(config, Arc::new(GatedRunner::default()));

    assert!(matches!(
        env.load(LoadFlags::TOOLS, None).await,
        Err(MtbError::ToolsDirNotFound)
    ));
    assert!(!env.has(LoadFlags::PACKS).await);
}
