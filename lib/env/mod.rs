//! The ModusToolbox environment.
//!
//! [`ModusToolboxEnvironment`] owns the pack, tool, manifest, application and
//! device databases and loads them on request. Packs are always loaded first;
//! the remaining subsystems are loaded concurrently. A failed load discards
//! everything that was loaded before it. Only one load runs at a time and a
//! second request is rejected rather than queued.

mod state;
mod tools_dir;

#[cfg(test)]
mod tests;

use crate::app::MtbAppInfo;
use crate::config::EnvConfig;
use crate::constants::{DEVICE_DB_ASSET, EVENT_CHANNEL_CAPACITY};
use crate::devicedb::DeviceDb;
use crate::error::{MtbError, MtbResult};
use crate::manifest::{ManifestDb, ManifestFetcher, ManifestLoader, super_manifest_sources};
use crate::packs::{PackDb, PackLoader};
use crate::process::{CommandRunner, ShellRunner, run_cmd_capture_output};
use crate::tools::{ToolSource, ToolsDb};
use futures_util::FutureExt;
use futures_util::future::{BoxFuture, join_all};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock, RwLockReadGuard, broadcast};

//--------------------------------------------------------------------------------------------------
// Re-Exports
//--------------------------------------------------------------------------------------------------

pub use state::{LoadFlags, LoadState, Subsystem, SubsystemState};
pub use tools_dir::{find_tools_dir, newest_tools_dir, tools_dir_above};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Notification sent to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvEvent {
    /// A load finished; carries every loaded subsystem.
    Loaded(LoadFlags),

    /// A load failed and the environment was reset.
    LoadFailed(String),

    /// The application was reloaded.
    AppUpdated(PathBuf),
}

/// Tools, packs, manifests, device data and the current application.
#[derive(Debug)]
pub struct ModusToolboxEnvironment {
    config: EnvConfig,
    runner: Arc<dyn CommandRunner>,
    state: Mutex<LoadState>,
    tools_dir: RwLock<Option<PathBuf>>,
    app_dir: RwLock<Option<PathBuf>>,
    packs: RwLock<PackDb>,
    tools: RwLock<ToolsDb>,
    manifest: RwLock<ManifestDb>,
    app_info: RwLock<Option<MtbAppInfo>>,
    device_db: RwLock<DeviceDb>,
    events: broadcast::Sender<EnvEvent>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl ModusToolboxEnvironment {
    /// Create an environment that runs real processes.
    pub fn new(config: EnvConfig) -> Self {
        Self::with_runner(config, Arc::new(ShellRunner))
    }

    /// Create an environment with a custom command runner.
    pub fn with_runner(config: EnvConfig, runner: Arc<dyn CommandRunner>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            config,
            runner,
            state: Mutex::new(LoadState::new()),
            tools_dir: RwLock::new(None),
            app_dir: RwLock::new(None),
            packs: RwLock::new(PackDb::default()),
            tools: RwLock::new(ToolsDb::new()),
            manifest: RwLock::new(ManifestDb::new()),
            app_info: RwLock::new(None),
            device_db: RwLock::new(DeviceDb::default()),
            events,
        }
    }

    /// Load the requested subsystems.
    ///
    /// Subsystems that are already loaded are skipped unless
    /// [`LoadFlags::RELOAD`] is set; the application is also reloaded when
    /// `app_dir` names a different directory than the last load. Fails with
    /// [`MtbError::AlreadyLoading`] while another load runs.
    pub async fn load(&self, flags: LoadFlags, app_dir: Option<&Path>) -> MtbResult<()> {
        let plan = self.begin(flags, app_dir).await?;
        tracing::debug!("Loading {:?}", plan);

        let result = self.run_plan(&plan).await;

        let mut state = self.state.lock().await;
        match result {
            Ok(()) => {
                for subsystem in &plan {
                    state.transition(*subsystem, SubsystemState::Loaded)?;
                }
                let has = state.has();
                drop(state);

                tracing::info!("Environment loaded: {:?}", has);
                self.emit(EnvEvent::Loaded(has));
                Ok(())
            }
            Err(e) => {
                state.reset_after_failure()?;
                drop(state);
                self.clear().await;

                tracing::error!("Environment load failed: {}", e);
                self.emit(EnvEvent::LoadFailed(e.to_string()));
                Err(e)
            }
        }
    }

    /// Reload the application from the last application directory.
    pub async fn reload_app_info(&self) -> MtbResult<()> {
        self.load(LoadFlags::APP_INFO | LoadFlags::RELOAD, None).await?;
        if let Some(dir) = self.app_dir().await {
            self.emit(EnvEvent::AppUpdated(dir));
        }
        Ok(())
    }

    /// Receive events from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<EnvEvent> {
        self.events.subscribe()
    }

    /// Whether every subsystem in `flags` is loaded.
    pub async fn has(&self, flags: LoadFlags) -> bool {
        self.state
            .lock()
            .await
            .has()
            .contains(flags.difference(LoadFlags::RELOAD))
    }

    /// Snapshot of the load state.
    pub async fn state(&self) -> LoadState {
        self.state.lock().await.clone()
    }

    pub async fn is_loading(&self) -> bool {
        self.state.lock().await.is_loading()
    }

    pub fn config(&self) -> &EnvConfig {
        &self.config
    }

    /// Tools directory, once located.
    pub async fn tools_dir(&self) -> Option<PathBuf> {
        self.tools_dir.read().await.clone()
    }

    /// Directory of the last application requested.
    pub async fn app_dir(&self) -> Option<PathBuf> {
        self.app_dir.read().await.clone()
    }

    pub async fn packs(&self) -> RwLockReadGuard<'_, PackDb> {
        self.packs.read().await
    }

    pub async fn tools(&self) -> RwLockReadGuard<'_, ToolsDb> {
        self.tools.read().await
    }

    pub async fn manifest(&self) -> RwLockReadGuard<'_, ManifestDb> {
        self.manifest.read().await
    }

    pub async fn app_info(&self) -> RwLockReadGuard<'_, Option<MtbAppInfo>> {
        self.app_info.read().await
    }

    pub async fn device_db(&self) -> RwLockReadGuard<'_, DeviceDb> {
        self.device_db.read().await
    }

    /// Run a program with the environment's `PATH` rules.
    pub async fn run_command(
        &self,
        program: &str,
        args: &[String],
        cwd: &Path,
        on_line: Option<&mut (dyn FnMut(&str) + Send)>,
    ) -> MtbResult<(i32, Vec<String>)> {
        run_cmd_capture_output(program, args, cwd, on_line).await
    }

    /// Check for a running load and mark the planned subsystems as loading.
    async fn begin(&self, flags: LoadFlags, app_dir: Option<&Path>) -> MtbResult<Vec<Subsystem>> {
        let mut state = self.state.lock().await;
        if state.is_loading() {
            return Err(MtbError::AlreadyLoading);
        }

        let mut current_app = self.app_dir.write().await;
        let app_changed = app_dir.is_some_and(|d| current_app.as_deref() != Some(d));
        if flags.contains(LoadFlags::APP_INFO) && app_dir.is_none() && current_app.is_none() {
            return Err(MtbError::AppInfo("no application directory given".to_string()));
        }

        let reload = flags.contains(LoadFlags::RELOAD);
        let mut plan = Vec::new();
        for subsystem in Subsystem::ALL {
            let requested = flags.contains(subsystem.flag());
            if !requested && subsystem != Subsystem::Packs {
                continue;
            }

            let forced = (reload && requested) || (subsystem == Subsystem::AppInfo && app_changed);
            if state.get(subsystem) == SubsystemState::Loaded && !forced {
                continue;
            }
            plan.push(subsystem);
        }

        for subsystem in &plan {
            state.transition(*subsystem, SubsystemState::Requested)?;
        }
        for subsystem in &plan {
            state.transition(*subsystem, SubsystemState::Loading)?;
        }

        if let Some(dir) = app_dir {
            *current_app = Some(dir.to_path_buf());
        }
        Ok(plan)
    }

    async fn run_plan(&self, plan: &[Subsystem]) -> MtbResult<()> {
        if plan.contains(&Subsystem::Packs) {
            self.load_packs().await?;
        }

        // The device scan reads app assets, so it waits for an app load in the same plan.
        let chain_devices = plan.contains(&Subsystem::AppInfo) && plan.contains(&Subsystem::DeviceDb);

        let tasks: Vec<BoxFuture<'_, MtbResult<()>>> = plan
            .iter()
            .filter_map(|subsystem| match subsystem {
                Subsystem::Packs => None,
                Subsystem::AppInfo if chain_devices => Some(
                    async move {
                        self.load_app_info().await?;
                        self.load_device_db().await
                    }
                    .boxed(),
                ),
                Subsystem::AppInfo => Some(self.load_app_info().boxed()),
                Subsystem::Tools => Some(self.load_tools().boxed()),
                Subsystem::ManifestData => Some(self.load_manifest_data().boxed()),
                Subsystem::DeviceDb if chain_devices => None,
                Subsystem::DeviceDb => Some(self.load_device_db().boxed()),
            })
            .collect();

        join_all(tasks).await.into_iter().collect()
    }

    async fn load_packs(&self) -> MtbResult<()> {
        let loader = if self.config.registry_dirs.is_empty() {
            PackLoader::default()
        } else {
            PackLoader::new(self.config.registry_dirs.clone())
        }
        .with_early_access(self.config.early_access.clone());

        let db = loader.load()?;
        tracing::debug!("Loaded {} packs", db.packs().len());
        *self.packs.write().await = db;
        Ok(())
    }

    async fn load_tools(&self) -> MtbResult<()> {
        let tools_dir = self.ensure_tools_dir().await?;

        let mut db = ToolsDb::new();
        db.add_tools_dir(tools_dir, ToolSource::ToolsDir);
        for (dir, source) in self.packs.read().await.tool_dirs() {
            db.add_tools_dir(dir, source);
        }

        let db = tokio::task::spawn_blocking(move || {
            db.scan_all();
            db
        })
        .await
        .map_err(|e| MtbError::Generic(format!("Tool scan failed: {}", e)))?;

        tracing::debug!("Active tools: {}", db.active_set().len());
        *self.tools.write().await = db;
        Ok(())
    }

    async fn load_manifest_data(&self) -> MtbResult<()> {
        let manifest_loc = self.config.manifest_loc();
        let sources = super_manifest_sources(
            self.packs.read().await.manifests(),
            &self.config.remote_super_manifests(),
            Some(manifest_loc.as_path()),
        );

        let fetcher = ManifestFetcher::new(self.config.http_timeout())?;
        let db = ManifestLoader::new(fetcher, sources).load().await?;
        *self.manifest.write().await = db;
        Ok(())
    }

    async fn load_app_info(&self) -> MtbResult<()> {
        let app_dir = self
            .app_dir()
            .await
            .ok_or_else(|| MtbError::AppInfo("no application directory given".to_string()))?;
        let tools_dir = self.ensure_tools_dir().await?;

        let info = MtbAppInfo::load(
            &app_dir,
            &tools_dir,
            &self.config.global_dir(),
            self.runner.as_ref(),
        )
        .await?;
        *self.app_info.write().await = Some(info);
        Ok(())
    }

    /// Scan the configured device roots and any `device-db` asset of the
    /// current application.
    async fn load_device_db(&self) -> MtbResult<()> {
        let mut roots = self.config.device_db_dirs.clone();
        if let Some(info) = self.app_info.read().await.as_ref() {
            roots.extend(
                info.projects()
                    .iter()
                    .flat_map(|p| p.assets())
                    .filter(|a| a.name() == DEVICE_DB_ASSET)
                    .map(|a| a.path.clone()),
            );
        }

        let db = tokio::task::spawn_blocking(move || DeviceDb::scan(&roots))
            .await
            .map_err(|e| MtbError::Generic(format!("Device scan failed: {}", e)))??;
        *self.device_db.write().await = db;
        Ok(())
    }

    /// Locate the tools directory once.
    async fn ensure_tools_dir(&self) -> MtbResult<PathBuf> {
        let mut tools_dir = self.tools_dir.write().await;
        if let Some(dir) = tools_dir.as_ref() {
            return Ok(dir.clone());
        }

        let dir = find_tools_dir(&self.config)?;
        tracing::info!("Using tools directory {}", dir.display());
        *tools_dir = Some(dir.clone());
        Ok(dir)
    }

    async fn clear(&self) {
        *self.packs.write().await = PackDb::default();
        *self.tools.write().await = ToolsDb::new();
        *self.manifest.write().await = ManifestDb::new();
        *self.app_info.write().await = None;
        *self.device_db.write().await = DeviceDb::default();
    }

    fn emit(&self, event: EnvEvent) {
        // No subscribers is not an error.
        let _ = self.events.send(event);
    }
}
