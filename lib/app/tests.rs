//! Application and project resolution tests.

use super::{AppType, MtbAppInfo, MtbProjectInfo, parse_app_info};
use crate::error::{MtbError, MtbResult};
use crate::process::CommandRunner;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

//--------------------------------------------------------------------------------------------------
// Helpers
//--------------------------------------------------------------------------------------------------

#[derive(Debug, Default)]
struct FakeRunner {
    outputs: BTreeMap<PathBuf, (i32, Vec<String>)>,
}

#[async_trait]
impl CommandRunner for FakeRunner {
    async fn run(&self, _program: &str, args: &[String], cwd: &Path) -> MtbResult<(i32, Vec<String>)> {
        assert_eq!(args[0], "get_app_info");
        self.outputs
            .get(cwd)
            .cloned()
            .ok_or_else(|| MtbError::Generic(format!("unexpected directory {}", cwd.display())))
    }
}

fn write(path: &Path, content: &str) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

fn vars(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn shared_mtb(repo: &str, commit: &str) -> String {
    format!(
        "https://github.com/org/{}#{}#$$ASSET_REPO$${}/{}\n",
        repo, commit, repo, commit
    )
}

/// A combined application targeting `KIT_A` with requests for two BSPs, one
/// present library, one missing library and a `.cyignore` in the library.
fn shared_fixture() -> (TempDir, PathBuf) {
    let ws = TempDir::new().unwrap();
    let app = ws.path().join("app");
    let shared = ws.path().join("mtb_shared");

    write(&app.join("deps/TARGET_KIT_A.mtb"), &shared_mtb("TARGET_KIT_A", "release-v1.0.0"));
    write(&app.join("deps/TARGET_KIT_B.mtb"), &shared_mtb("TARGET_KIT_B", "release-v1.0.0"));
    write(&app.join("deps/core-lib.mtb"), &shared_mtb("core-lib", "release-v1.4.0"));
    write(&app.join("deps/missing-lib.mtb"), &shared_mtb("missing-lib", "release-v2.0.0"));
    std::fs::create_dir_all(app.join("extra")).unwrap();

    let kit_a = shared.join("TARGET_KIT_A/release-v1.0.0");
    write(&kit_a.join("TARGET_KIT_A.mk"), "");
    write(&kit_a.join(".cyignore"), "COMPONENT_DISABLED\n");
    write(
        &kit_a.join("version.xml"),
        "<version>1.0.0.123</version>",
    );
    write(&shared.join("TARGET_KIT_B/release-v1.0.0/TARGET_KIT_B.mk"), "");
    write(
        &shared.join("core-lib/release-v1.4.0/.cyignore"),
        "# docs are not built\ndocs/\n$(SEARCH_TARGET_KIT_A)/COMPONENT_X\n$(SEARCH_unknown)/x\n",
    );

    (ws, app)
}

fn shared_project(app: &Path) -> MtbProjectInfo {
    MtbProjectInfo::new(
        app,
        app,
        vars(&[
            ("MTB_TARGET", "KIT_A"),
            ("MTB_SEARCH", "extra does-not-exist"),
            ("MTB_IGNORE", "extra"),
        ]),
        "/global",
    )
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[test]
fn test_search_path_excludes_foreign_bsps() {
    let (ws, app) = shared_fixture();
    let shared = ws.path().join("mtb_shared");
    let mut project = shared_project(&app);
    project.initialize().unwrap();

    let search = project.search_path();
    assert_eq!(search[0], app.join("extra"));
    assert!(search.contains(&shared.join("TARGET_KIT_A/release-v1.0.0")));
    assert!(search.contains(&shared.join("core-lib/release-v1.4.0")));
    assert!(
        search
            .iter()
            .all(|p| !p.to_string_lossy().contains("TARGET_KIT_B"))
    );
    assert_eq!(search.len(), 4);
}

#[test]
fn test_assets_and_missing_assets_partition_requests() {
    let (ws, app) = shared_fixture();
    let mut project = shared_project(&app);
    project.initialize().unwrap();

    assert_eq!(project.requests().len(), 4);
    assert_eq!(project.assets().len() + project.missing_assets().len(), 4);

    for request in project.requests() {
        let full = request.full_path(project.dirs());
        let present = project.assets().iter().any(|a| a.path == full);
        let missing = project
            .missing_assets()
            .iter()
            .any(|m| m.full_path(project.dirs()) == full);
        assert_ne!(present, missing, "{} must be in exactly one set", request);
        assert_eq!(present, full.is_dir());
    }

    assert_eq!(project.missing_assets()[0].name(), "missing-lib");
    assert_eq!(project.shared_dir(), ws.path().join("mtb_shared"));

    let kit_a = project
        .assets()
        .iter()
        .find(|a| a.name() == "TARGET_KIT_A")
        .unwrap();
    assert_eq!(kit_a.version.as_deref(), Some("1.0.0.123"));
}

#[test]
fn test_ignore_path_and_add_back() {
    let (ws, app) = shared_fixture();
    let shared = ws.path().join("mtb_shared");
    let mut project = shared_project(&app);
    project.initialize().unwrap();

    let ignore = project.ignore_path();
    assert!(ignore.contains(&app.join("extra")));
    assert!(ignore.contains(&shared.join("core-lib/release-v1.4.0/docs")));
    assert!(ignore.contains(&shared.join("TARGET_KIT_A/release-v1.0.0/COMPONENT_X")));
    assert!(ignore.contains(&shared.join("TARGET_KIT_A/release-v1.0.0/COMPONENT_DISABLED")));
    assert!(ignore.iter().all(|p| !p.ends_with("x")));

    assert!(!project.add_back().contains(&app.join("extra")));
    assert_eq!(project.add_back().len(), project.search_path().len() - 1);
}

#[test]
fn test_bsp_discovery() {
    let (ws, app) = shared_fixture();
    let mut project = shared_project(&app);
    project.initialize().unwrap();

    let targets: Vec<&str> = project.bsps().iter().map(|b| b.target.as_str()).collect();
    assert!(targets.contains(&"TARGET_KIT_A"));
    assert!(targets.contains(&"TARGET_KIT_B"));
    assert_eq!(project.bsps().len(), 2);

    let target = project.target_bsp().unwrap();
    assert_eq!(target.root, ws.path().join("mtb_shared/TARGET_KIT_A/release-v1.0.0"));
    assert_eq!(target.board_name(), "KIT_A");
}

#[test]
fn test_local_bsp_and_cyignore() {
    let ws = TempDir::new().unwrap();
    let app = ws.path().join("app");
    let bsp = app.join("bsps/TARGET_APP_KIT_C");
    write(&bsp.join("bsp.mk"), "");
    write(&bsp.join(".cyignore"), "COMPONENT_CM0P\n");
    write(
        &app.join("deps/repo.mtb"),
        "https://github.com/org/repo#abc123#$$LOCAL$$\n\n",
    );

    let mut project = MtbProjectInfo::new(&app, &app, vars(&[("MTB_TARGET", "APP_KIT_C")]), "/global");
    project.initialize().unwrap();

    assert_eq!(project.target_bsp().unwrap().root, bsp);
    assert!(project.ignore_path().contains(&bsp.join("COMPONENT_CM0P")));

    // `$$LOCAL$$` assets are searched through their clone directory.
    assert_eq!(project.search_path(), &[app.join("libs")]);
    assert_eq!(project.missing_assets()[0].full_path(project.dirs()), app.join("libs/repo"));
}

#[test]
fn test_malformed_files_are_reported_together() {
    let ws = TempDir::new().unwrap();
    let app = ws.path().join("app");
    write(&app.join("deps/good.mtb"), &shared_mtb("core-lib", "release-v1.4.0"));
    write(&app.join("deps/bad.mtb"), "not an asset line\n");
    write(&app.join("libs/worse.mtb"), "https://github.com/org/x#only-two\n");

    let mut project = MtbProjectInfo::new(&app, &app, BTreeMap::new(), "/global");
    match project.initialize() {
        Err(MtbError::MalformedAssets { errors }) => {
            assert_eq!(errors.len(), 2);
            assert!(errors.iter().any(|e| e.contains("bad.mtb")));
            assert!(errors.iter().any(|e| e.contains("worse.mtb")));
        }
        other => panic!("expected malformed assets, got {:?}", other),
    }
    assert!(project.requests().is_empty());
}

#[test]
fn test_reads_requests_under_glob_metacharacters() {
    let ws = TempDir::new().unwrap();
    let app = ws.path().join("Hello [v2]*?");
    write(&app.join("deps/core-lib.mtb"), &shared_mtb("core-lib", "release-v1.4.0"));
    write(&app.join("libs/retarget-io.mtb"), &shared_mtb("retarget-io", "release-v1.6.0"));

    let mut project = MtbProjectInfo::new(&app, &app, BTreeMap::new(), "/global");
    project.initialize().unwrap();

    assert_eq!(project.requests().len(), 2);
    assert_eq!(project.missing_assets().len(), 2);
    assert!(project.requests().iter().any(|r| r.name() == "core-lib" && r.is_direct()));
    assert!(project.requests().iter().any(|r| r.name() == "retarget-io" && !r.is_direct()));
}

#[test]
fn test_deps_dir_is_created_or_fails() {
    let ws = TempDir::new().unwrap();
    let app = ws.path().join("app");

    let mut project = MtbProjectInfo::new(&app, &app, BTreeMap::new(), "/global");
    project.initialize().unwrap();
    assert!(app.join("deps").is_dir());

    write(&app.join("not-a-dir"), "");
    let mut broken = MtbProjectInfo::new(
        &app,
        &app,
        vars(&[("MTB_DEPS_DIR", "not-a-dir")]),
        "/global",
    );
    assert!(matches!(broken.initialize(), Err(MtbError::DepsDir { .. })));
}

#[test]
fn test_parse_app_info_lines() {
    let lines: Vec<String> = [
        "Tools Directory: /opt/tools_3.2",
        "MTB_TYPE=COMBINED",
        "MTB_TARGET=KIT_A",
        "MTB_SEARCH=",
        "lowercase=ignored",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();

    let parsed = parse_app_info(&lines);
    assert_eq!(parsed.len(), 3);
    assert_eq!(parsed["MTB_TARGET"], "KIT_A");
    assert_eq!(parsed["MTB_SEARCH"], "");
}

#[tokio::test]
async fn test_load_multi_project_application() {
    let ws = TempDir::new().unwrap();
    let app = ws.path().join("app");
    for name in ["proj_cm0p", "proj_cm4"] {
        write(
            &app.join(name).join("deps/core-lib.mtb"),
            &shared_mtb("core-lib", "release-v1.4.0"),
        );
    }

    let mut runner = FakeRunner::default();
    runner.outputs.insert(
        app.clone(),
        (0, vec!["MTB_TYPE=APPLICATION".into(), "MTB_PROJECTS=proj_cm0p proj_cm4".into()]),
    );
    runner.outputs.insert(app.join("proj_cm0p"), (0, vec!["MTB_TARGET=KIT_A".into()]));
    runner.outputs.insert(app.join("proj_cm4"), (0, vec!["MTB_TARGET=KIT_A".into()]));

    let info = MtbAppInfo::load(&app, Path::new("/opt/tools_3.2"), Path::new("/global"), &runner)
        .await
        .unwrap();

    assert_eq!(info.app_type(), AppType::Application);
    assert_eq!(info.projects().len(), 2);
    assert!(info.has_missing_assets());

    let cm4 = info.project("proj_cm4").unwrap();
    assert_eq!(cm4.shared_dir(), ws.path().join("mtb_shared"));
    assert_eq!(
        cm4.missing_assets()[0].full_path(cm4.dirs()),
        ws.path().join("mtb_shared/core-lib/release-v1.4.0")
    );
}

#[tokio::test]
async fn test_load_reports_command_failure() {
    let ws = TempDir::new().unwrap();
    let mut runner = FakeRunner::default();
    runner.outputs.insert(
        ws.path().to_path_buf(),
        (2, vec!["make: *** No rule to make target 'get_app_info'.".into()]),
    );

    let result = MtbAppInfo::load(ws.path(), Path::new("/tools"), Path::new("/global"), &runner).await;
    match result {
        Err(MtbError::Command { code, output, .. }) => {
            assert_eq!(code, 2);
            assert_eq!(output.len(), 1);
        }
        other => panic!("expected command failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_application_without_projects() {
    let ws = TempDir::new().unwrap();
    let mut runner = FakeRunner::default();
    runner
        .outputs
        .insert(ws.path().to_path_buf(), (0, vec!["MTB_TYPE=APPLICATION".into()]));

    assert!(matches!(
        MtbAppInfo::load(ws.path(), Path::new("/tools"), Path::new("/global"), &runner).await,
        Err(MtbError::AppInfo(_))
    ));
}
