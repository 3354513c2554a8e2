#![allow(dead_code)]
use assert_cmd::{Command, cargo_bin_cmd};
use clientclock::core::lifecycle::Timing;
use clientclock::core::state_store::StateStore;
use clientclock::errors::{AppError, AppResult};
use clientclock::models::client::ClientName;
use clientclock::models::session_state::SessionState;
use clientclock::platform::launcher::DaemonLauncher;
use clientclock::platform::process::{ProcessControl, SignalKind};
use clientclock::platform::sampler::{AppSample, ForegroundSampler};
use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

pub fn clock() -> Command {
    cargo_bin_cmd!("clientclock")
}

/// Database and state file paths inside a fresh per-test directory.
pub struct TestPaths {
    pub dir: PathBuf,
    pub db: String,
    pub state: String,
}

impl TestPaths {
    pub fn state_store(&self) -> StateStore {
        StateStore::new(&self.state)
    }
}

/// Create a unique test directory inside the system temp dir, removing any leftovers
pub fn setup_paths(name: &str) -> TestPaths {
    let mut dir: PathBuf = env::temp_dir();
    dir.push("clientclock_tests");
    dir.push(format!("{}_{}", name, std::process::id()));
    fs::remove_dir_all(&dir).ok();
    fs::create_dir_all(&dir).expect("create test dir");

    TestPaths {
        db: dir.join("time-tracking.sqlite").to_string_lossy().to_string(),
        state: dir.join("active-session.state").to_string_lossy().to_string(),
        dir,
    }
}

pub fn fast_timing() -> Timing {
    Timing {
        publish_wait: Duration::from_millis(40),
        grace: Duration::from_millis(30),
        poll_step: Duration::from_millis(5),
    }
}

/// In-memory process table.
pub struct FakeProcesses {
    pub alive: RefCell<HashSet<u32>>,
    pub signals: RefCell<Vec<(u32, SignalKind)>>,
    /// When set, SIGTERM is ignored and only SIGKILL ends a process.
    pub ignore_term: Cell<bool>,
    pub own_pid: u32,
}

impl FakeProcesses {
    pub fn new() -> Self {
        Self {
            alive: RefCell::new(HashSet::new()),
            signals: RefCell::new(Vec::new()),
            ignore_term: Cell::new(false),
            own_pid: 7,
        }
    }

    pub fn spawn(&self, pid: u32) {
        self.alive.borrow_mut().insert(pid);
    }

    pub fn is_alive_pid(&self, pid: u32) -> bool {
        self.alive.borrow().contains(&pid)
    }

    pub fn kill_silently(&self, pid: u32) {
        self.alive.borrow_mut().remove(&pid);
    }

    pub fn signals_for(&self, pid: u32) -> Vec<SignalKind> {
        self.signals
            .borrow()
            .iter()
            .filter(|(p, _)| *p == pid)
            .map(|(_, k)| *k)
            .collect()
    }
}

impl ProcessControl for FakeProcesses {
    fn is_alive(&self, pid: u32) -> bool {
        self.alive.borrow().contains(&pid)
    }

    fn signal(&self, pid: u32, kind: SignalKind) {
        self.signals.borrow_mut().push((pid, kind));
        if kind == SignalKind::Kill || !self.ignore_term.get() {
            self.alive.borrow_mut().remove(&pid);
        }
    }

    fn current_pid(&self) -> u32 {
        self.own_pid
    }
}

/// Pretends to spawn a daemon: hands out pids and marks them alive.
pub struct FakeLauncher<'a> {
    pub procs: &'a FakeProcesses,
    pub next_pid: Cell<u32>,
    pub launched: RefCell<Vec<(i64, String)>>,
    pub fail: Cell<bool>,
    /// When set, the fake daemon publishes its pid like the real one does.
    pub publish_to: Option<StateStore>,
    /// After publishing, occupy the state store's temp path so the next write fails.
    pub jam_state_writes: Cell<bool>,
}

impl<'a> FakeLauncher<'a> {
    pub fn new(procs: &'a FakeProcesses) -> Self {
        Self {
            procs,
            next_pid: Cell::new(1000),
            launched: RefCell::new(Vec::new()),
            fail: Cell::new(false),
            publish_to: None,
            jam_state_writes: Cell::new(false),
        }
    }

    pub fn publishing(procs: &'a FakeProcesses, store: StateStore) -> Self {
        Self {
            publish_to: Some(store),
            ..Self::new(procs)
        }
    }

    pub fn launch_count(&self) -> usize {
        self.launched.borrow().len()
    }
}

impl DaemonLauncher for FakeLauncher<'_> {
    fn launch(&self, session_id: i64, client: &ClientName) -> AppResult<u32> {
        if self.fail.get() {
            return Err(AppError::DaemonSpawn("simulated failure".into()));
        }

        let pid = self.next_pid.get();
        self.next_pid.set(pid + 1);
        self.procs.spawn(pid);
        self.launched
            .borrow_mut()
            .push((session_id, client.to_string()));

        if let Some(store) = &self.publish_to {
            store.write(&SessionState {
                client: client.to_string(),
                session_id,
                pid: self.procs.own_pid,
                tracker_pid: pid,
            })?;

            if self.jam_state_writes.get() {
                fs::create_dir_all(state_temp_path(store))?;
            }
        }
        Ok(pid)
    }
}

/// Temp file a `StateStore` write in this process goes through.
pub fn state_temp_path(store: &StateStore) -> PathBuf {
    let mut name = store
        .path()
        .file_name()
        .expect("state file name")
        .to_os_string();
    name.push(format!(".{}.tmp", std::process::id()));
    store.path().with_file_name(name)
}

/// Always reports the same foreground application.
pub struct FixedSampler(pub AppSample);

impl ForegroundSampler for FixedSampler {
    fn sample(&self) -> AppSample {
        self.0.clone()
    }
}

/// Pid of a process that has already exited and been reaped.
#[cfg(unix)]
pub fn dead_pid() -> u32 {
    let mut child = std::process::Command::new("true")
        .spawn()
        .expect("spawn true");
    let pid = child.id();
    child.wait().expect("wait true");
    pid
}
