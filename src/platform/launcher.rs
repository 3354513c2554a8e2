//! Spawning the tracking daemon.
//!
//! The daemon is this same executable re-run with the hidden `daemon`
//! subcommand. It gets its own process group and no inherited stdio, so it
//! outlives the short-lived command that started it and never holds the
//! caller's terminal or pipes open.

use crate::errors::{AppError, AppResult};
use crate::models::client::ClientName;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::thread;

pub trait DaemonLauncher {
    /// Start a daemon for `session_id` and return its pid.
    fn launch(&self, session_id: i64, client: &ClientName) -> AppResult<u32>;
}

#[derive(Debug, Clone)]
pub struct SelfExecLauncher {
    pub exe: PathBuf,
    pub database: String,
    pub state_file: String,
    pub poll_interval_secs: u64,
}

impl SelfExecLauncher {
    pub fn current(database: &str, state_file: &str, poll_interval_secs: u64) -> AppResult<Self> {
        let exe = std::env::current_exe()
            .map_err(|e| AppError::DaemonSpawn(format!("cannot locate executable: {e}")))?;
        Ok(Self {
            exe,
            database: database.to_string(),
            state_file: state_file.to_string(),
            poll_interval_secs,
        })
    }

    pub fn command(&self, session_id: i64, client: &ClientName) -> Command {
        let mut cmd = Command::new(&self.exe);
        cmd.arg("--db")
            .arg(&self.database)
            .arg("--state")
            .arg(&self.state_file)
            .arg("daemon")
            .arg("--session-id")
            .arg(session_id.to_string())
            .arg("--client")
            .arg(client.as_str())
            .arg("--interval")
            .arg(self.poll_interval_secs.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }

        cmd
    }
}

impl DaemonLauncher for SelfExecLauncher {
    fn launch(&self, session_id: i64, client: &ClientName) -> AppResult<u32> {
        let mut child = self
            .command(session_id, client)
            .spawn()
            .map_err(|e| AppError::DaemonSpawn(format!("{}: {}", self.exe.display(), e)))?;

        let pid = child.id();
        log::info!("spawned tracking daemon pid {pid} for session {session_id}");

        // Reap the daemon if it exits while we are still running, otherwise
        // it lingers as a zombie and keeps answering liveness checks. When
        // this process exits first the daemon is reparented and the thread
        // simply goes away with us.
        let reaper = thread::Builder::new()
            .name(format!("reap-{pid}"))
            .spawn(move || match child.wait() {
                Ok(status) => log::debug!("daemon {pid} exited: {status}"),
                Err(e) => log::debug!("could not wait on daemon {pid}: {e}"),
            });
        if let Err(e) = reaper {
            log::warn!("no reaper thread for daemon {pid}: {e}");
        }

        Ok(pid)
    }
}
