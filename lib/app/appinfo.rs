//! Application level information from `make get_app_info`.

use super::project::MtbProjectInfo;
use crate::error::{MtbError, MtbResult};
use crate::platform::make_program;
use crate::process::CommandRunner;
use futures_util::future::try_join_all;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

pub const MTB_TYPE_VAR: &str = "MTB_TYPE";
pub const MTB_PROJECTS_VAR: &str = "MTB_PROJECTS";

/// `NAME=value` line printed by `get_app_info`.
static APP_INFO_LINE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Z_][A-Z0-9_]*)=(.*)$").expect("Invalid regex"));

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Application layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AppType {
    /// Several projects below one application directory.
    Application,

    /// Application and project share one directory.
    Combined,
}

/// An application and its projects.
#[derive(Debug, Clone, Serialize)]
pub struct MtbAppInfo {
    app_dir: PathBuf,
    app_type: AppType,
    vars: BTreeMap<String, String>,
    projects: Vec<MtbProjectInfo>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl MtbAppInfo {
    /// Query the application and initialize every project.
    pub async fn load(
        app_dir: &Path,
        tools_dir: &Path,
        global_dir: &Path,
        runner: &dyn CommandRunner,
    ) -> MtbResult<Self> {
        let vars = get_app_info(runner, app_dir, tools_dir).await?;
        let app_type = match vars.get(MTB_TYPE_VAR).map(|s| s.trim()) {
            Some("APPLICATION") => AppType::Application,
            Some("COMBINED") | Some("") | None => AppType::Combined,
            Some(other) => {
                return Err(MtbError::AppInfo(format!("unknown {} '{}'", MTB_TYPE_VAR, other)));
            }
        };

        let mut projects = match app_type {
            AppType::Combined => vec![MtbProjectInfo::new(app_dir, app_dir, vars.clone(), global_dir)],
            AppType::Application => {
                let names: Vec<&str> = vars
                    .get(MTB_PROJECTS_VAR)
                    .map(|s| s.split_whitespace().collect())
                    .unwrap_or_default();
                if names.is_empty() {
                    return Err(MtbError::AppInfo(format!(
                        "application {} lists no projects",
                        app_dir.display()
                    )));
                }

                let dirs: Vec<PathBuf> = names.iter().map(|name| app_dir.join(name)).collect();
                let project_vars =
                    try_join_all(dirs.iter().map(|dir| get_app_info(runner, dir, tools_dir))).await?;

                dirs.into_iter()
                    .zip(project_vars)
                    .map(|(dir, pvars)| MtbProjectInfo::new(dir, app_dir, pvars, global_dir))
                    .collect()
            }
        };

        for project in &mut projects {
            project.initialize()?;
        }

        tracing::info!(
            "Loaded application {} ({}, {} projects)",
            app_dir.display(),
            app_type,
            projects.len()
        );

        Ok(Self {
            app_dir: app_dir.to_path_buf(),
            app_type,
            vars,
            projects,
        })
    }

    pub fn app_dir(&self) -> &Path {
        &self.app_dir
    }

    pub fn app_type(&self) -> AppType {
        self.app_type
    }

    /// Variables reported for the application directory.
    pub fn vars(&self) -> &BTreeMap<String, String> {
        &self.vars
    }

    pub fn projects(&self) -> &[MtbProjectInfo] {
        &self.projects
    }

    /// Project by directory name.
    pub fn project(&self, name: &str) -> Option<&MtbProjectInfo> {
        self.projects.iter().find(|p| p.name() == name)
    }

    /// Whether any project has missing assets.
    pub fn has_missing_assets(&self) -> bool {
        self.projects.iter().any(|p| !p.missing_assets().is_empty())
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Run `make get_app_info` in `dir` and collect its variables.
pub async fn get_app_info(
    runner: &dyn CommandRunner,
    dir: &Path,
    tools_dir: &Path,
) -> MtbResult<BTreeMap<String, String>> {
    let program = make_program();
    let args = vec![
        "get_app_info".to_string(),
        format!("CY_TOOLS_PATHS={}", tools_dir.display()),
    ];

    let (code, output) = runner.run(program, &args, dir).await?;
    if code != 0 {
        return Err(MtbError::Command {
            command: format!("{} {}", program, args.join(" ")),
            code,
            output,
        });
    }

    Ok(parse_app_info(&output))
}

/// Collect `NAME=value` lines; other lines are ignored.
pub fn parse_app_info(lines: &[String]) -> BTreeMap<String, String> {
    lines
        .iter()
        .filter_map(|line| {
            let caps = APP_INFO_LINE_REGEX.captures(line.trim_end())?;
            Some((caps[1].to_string(), caps[2].trim().to_string()))
        })
        .collect()
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl fmt::Display for AppType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Application => write!(f, "application"),
            Self::Combined => write!(f, "combined"),
        }
    }
}
