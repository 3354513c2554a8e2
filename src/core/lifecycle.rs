//! Session lifecycle: `status`, `start` and `stop`.
//!
//! The controller runs inside short-lived command invocations. It owns the
//! daemon only through the pid stored in the state record; the only things it
//! ever does to the daemon are checking liveness and sending signals.

use crate::core::cleanup::{CleanupLogic, CleanupReport};
use crate::core::state_store::StateStore;
use crate::db::initialize::open_initialized;
use crate::db::log::ttlog_soft;
use crate::db::pool::DbPool;
use crate::db::queries::{close_session, create_session, ensure_client, find_session};
use crate::errors::{AppError, AppResult};
use crate::models::client::ClientName;
use crate::models::session_state::SessionState;
use crate::platform::launcher::DaemonLauncher;
use crate::platform::process::{ProcessControl, SignalKind};
use crate::platform::workspace::WorkspaceCheck;
use crate::utils::formatting::format_duration;
use crate::utils::time::now_ts;
use rusqlite::TransactionBehavior;
use std::thread;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
pub struct Timing {
    /// How long `start` waits for the daemon to publish its pid.
    pub publish_wait: Duration,
    /// How long `stop` waits after SIGTERM before sending SIGKILL.
    pub grace: Duration,
    pub poll_step: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            publish_wait: Duration::from_secs(1),
            grace: Duration::from_millis(500),
            poll_step: Duration::from_millis(50),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    Started {
        client: ClientName,
        session_id: i64,
        tracker_pid: u32,
        /// Session stopped because another client was being tracked.
        previous: Option<StopOutcome>,
        /// Cleanup run because the recorded daemon was dead.
        repaired: Option<CleanupReport>,
        /// Open sessions nobody was tracking, closed before inserting the new one.
        closed_untracked: Vec<i64>,
    },
    AlreadyTracking(SessionState),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopOutcome {
    NothingToStop,
    Stopped {
        client: String,
        session_id: i64,
        duration: i64,
    },
}

pub struct SessionController<'a> {
    db_path: String,
    state: StateStore,
    procs: &'a dyn ProcessControl,
    launcher: &'a dyn DaemonLauncher,
    workspaces: &'a dyn WorkspaceCheck,
    timing: Timing,
}

impl<'a> SessionController<'a> {
    pub fn new(
        db_path: &str,
        state: StateStore,
        procs: &'a dyn ProcessControl,
        launcher: &'a dyn DaemonLauncher,
        workspaces: &'a dyn WorkspaceCheck,
    ) -> Self {
        Self {
            db_path: db_path.to_string(),
            state,
            procs,
            launcher,
            workspaces,
            timing: Timing::default(),
        }
    }

    pub fn with_timing(mut self, timing: Timing) -> Self {
        self.timing = timing;
        self
    }

    pub fn status(&self) -> Option<SessionState> {
        self.state.read()
    }

    pub fn start(&self, raw_client: &str) -> AppResult<StartOutcome> {
        // ------------------------------------------------
        // 1️⃣ Validate before touching anything
        // ------------------------------------------------
        let client = ClientName::parse(raw_client)?;
        if !self.workspaces.exists(&client) {
            return Err(AppError::WorkspaceMissing(client.to_string()));
        }

        // ------------------------------------------------
        // 2️⃣ Resolve the current state record
        // ------------------------------------------------
        let mut previous = None;
        let mut repaired = None;

        if let Some(current) = self.state.read() {
            if self.procs.is_alive(current.tracker_pid) {
                if current.client == client.as_str() {
                    return Ok(StartOutcome::AlreadyTracking(current));
                }
                log::info!("stopping session {} for {}", current.session_id, current.client);
                previous = Some(self.stop()?);
            } else {
                log::info!(
                    "state record for session {} has a dead daemon, cleaning up",
                    current.session_id
                );
                match CleanupLogic::run(&self.db_path, &self.state, self.procs, now_ts()) {
                    Ok(report) => repaired = Some(report),
                    Err(e) => {
                        log::warn!("cleanup before start failed: {e}");
                        self.state.clear()?;
                    }
                }
            }
        }

        // ------------------------------------------------
        // 3️⃣ Client row + fresh open session, atomically
        // ------------------------------------------------
        let mut pool = open_initialized(&self.db_path)?;

        // IMMEDIATE takes the write lock up front, so contention goes through
        // the busy timeout instead of failing on a read-to-write upgrade.
        let tx = pool
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let now = now_ts();
        let closed_untracked = CleanupLogic::close_untracked_open_sessions(&tx, now)?;
        ensure_client(&tx, client.as_str())?;
        let session_id = create_session(&tx, client.as_str(), now)?;
        tx.commit()?;

        // ------------------------------------------------
        // 4️⃣ Daemon + state record
        // ------------------------------------------------
        let spawned_pid = match self.launcher.launch(session_id, &client) {
            Ok(pid) => pid,
            Err(e) => {
                if let Err(close_err) = close_session(&pool.conn, session_id, now) {
                    log::warn!("could not close session {session_id} after spawn failure: {close_err}");
                }
                return Err(e);
            }
        };

        let tracker_pid = self.wait_for_publish(session_id).unwrap_or(spawned_pid);

        let record = SessionState {
            client: client.to_string(),
            session_id,
            pid: self.procs.current_pid(),
            tracker_pid,
        };

        if let Err(e) = self.state.write(&record) {
            log::error!("state write failed, rolling back session {session_id}: {e}");
            self.terminate_daemon(tracker_pid);
            self.discard_published(session_id);
            if let Err(close_err) = close_session(&pool.conn, session_id, now_ts()) {
                log::warn!("could not close session {session_id}: {close_err}");
            }
            return Err(e);
        }

        ttlog_soft(
            &pool.conn,
            "start",
            client.as_str(),
            &format!("Started session {} (daemon pid {})", session_id, tracker_pid),
        );

        Ok(StartOutcome::Started {
            client,
            session_id,
            tracker_pid,
            previous,
            repaired,
            closed_untracked,
        })
    }

    /// Stop the active session.
    ///
    /// The state record is cleared even when the database update fails, so a
    /// broken database never leaves a permanently "active" session behind.
    pub fn stop(&self) -> AppResult<StopOutcome> {
        let Some(current) = self.state.read() else {
            return Ok(StopOutcome::NothingToStop);
        };

        self.terminate_daemon(current.tracker_pid);

        let finalized = self.finalize(&current, now_ts());
        let cleared = self.state.clear();

        let duration = finalized?;
        cleared?;

        Ok(StopOutcome::Stopped {
            client: current.client,
            session_id: current.session_id,
            duration,
        })
    }

    fn finalize(&self, current: &SessionState, end_time: i64) -> AppResult<i64> {
        let pool = DbPool::open_existing(&self.db_path)?;

        if !close_session(&pool.conn, current.session_id, end_time)? {
            log::warn!(
                "session {} was already closed or missing when stopping",
                current.session_id
            );
        }

        let duration = find_session(&pool.conn, current.session_id)?
            .and_then(|s| s.duration)
            .unwrap_or(0);

        ttlog_soft(
            &pool.conn,
            "stop",
            &current.client,
            &format!(
                "Stopped session {} ({})",
                current.session_id,
                format_duration(duration)
            ),
        );

        Ok(duration)
    }

    /// SIGTERM, wait out the grace period, then SIGKILL if needed.
    fn terminate_daemon(&self, pid: u32) {
        if pid == self.procs.current_pid() {
            log::warn!("state record points at this process ({pid}), not signaling");
            return;
        }
        if !self.procs.is_alive(pid) {
            return;
        }

        self.procs.signal(pid, SignalKind::Terminate);
        if self.wait_until_dead(pid, self.timing.grace) {
            return;
        }

        log::warn!("daemon {pid} ignored SIGTERM, sending SIGKILL");
        self.procs.signal(pid, SignalKind::Kill);
    }

    fn wait_until_dead(&self, pid: u32, limit: Duration) -> bool {
        let deadline = Instant::now() + limit;
        loop {
            if !self.procs.is_alive(pid) {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            thread::sleep(self.timing.poll_step);
        }
    }

    /// Remove a record the daemon published for a session being rolled back.
    fn discard_published(&self, session_id: i64) {
        let Some(published) = self.state.read() else {
            return;
        };
        if published.session_id != session_id {
            return;
        }
        if let Err(e) = self.state.clear() {
            log::warn!("could not remove state record of rolled back session {session_id}: {e}");
        }
    }

    fn wait_for_publish(&self, session_id: i64) -> Option<u32> {
        let deadline = Instant::now() + self.timing.publish_wait;
        loop {
            if let Some(published) = self.state.read()
                && published.session_id == session_id
            {
                return Some(published.tracker_pid);
            }
            if Instant::now() >= deadline {
                log::debug!("daemon for session {session_id} did not publish its pid in time");
                return None;
            }
            thread::sleep(self.timing.poll_step);
        }
    }
}
