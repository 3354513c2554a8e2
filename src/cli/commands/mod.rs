pub mod cleanup;
pub mod config;
pub mod daemon;
pub mod db;
pub mod init;
pub mod log;
pub mod start;
pub mod stats;
pub mod status;
pub mod stop;

use crate::config::Config;
use crate::core::lifecycle::SessionController;
use crate::core::state_store::StateStore;
use crate::errors::AppResult;
use crate::platform::launcher::SelfExecLauncher;
use crate::platform::process::SystemProcesses;
use crate::platform::workspace::DirWorkspaces;

/// Real collaborators used by the lifecycle commands.
pub struct Runtime {
    pub procs: SystemProcesses,
    pub launcher: SelfExecLauncher,
    pub workspaces: DirWorkspaces,
}

impl Runtime {
    pub fn from_config(cfg: &Config) -> AppResult<Self> {
        Ok(Self {
            procs: SystemProcesses,
            launcher: SelfExecLauncher::current(
                &cfg.database,
                &cfg.state_file,
                cfg.poll_interval_secs(),
            )?,
            workspaces: DirWorkspaces::new(cfg.clients_dir.as_deref()),
        })
    }

    pub fn controller<'a>(&'a self, cfg: &Config) -> SessionController<'a> {
        SessionController::new(
            &cfg.database,
            StateStore::new(&cfg.state_file),
            &self.procs,
            &self.launcher,
            &self.workspaces,
        )
    }
}
