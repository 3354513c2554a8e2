//! Process liveness and signal delivery.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    /// Ask the process to exit (SIGTERM).
    Terminate,
    /// Force the process to exit (SIGKILL).
    Kill,
}

pub trait ProcessControl {
    fn is_alive(&self, pid: u32) -> bool;

    /// Best-effort delivery. A process that is already gone counts as success.
    fn signal(&self, pid: u32, kind: SignalKind);

    fn current_pid(&self) -> u32 {
        std::process::id()
    }
}

/// Real processes on this machine.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProcesses;

#[cfg(unix)]
impl ProcessControl for SystemProcesses {
    fn is_alive(&self, pid: u32) -> bool {
        use nix::errno::Errno;
        use nix::sys::signal::{Signal, kill};

        let Some(pid) = to_nix_pid(pid) else {
            return false;
        };
        match kill(pid, None::<Signal>) {
            Ok(()) => true,
            // exists, but owned by someone else
            Err(Errno::EPERM) => true,
            Err(_) => false,
        }
    }

    fn signal(&self, pid: u32, kind: SignalKind) {
        use nix::errno::Errno;
        use nix::sys::signal::{Signal, kill};

        let Some(target) = to_nix_pid(pid) else {
            log::warn!("refusing to signal invalid pid {pid}");
            return;
        };
        let sig = match kind {
            SignalKind::Terminate => Signal::SIGTERM,
            SignalKind::Kill => Signal::SIGKILL,
        };

        match kill(target, sig) {
            Ok(()) => log::debug!("sent {sig} to {pid}"),
            Err(Errno::ESRCH) => log::debug!("pid {pid} already gone"),
            Err(e) => log::warn!("failed to send {sig} to {pid}: {e}"),
        }
    }
}

/// Pid 0 and negative values address process groups, never a single process.
#[cfg(unix)]
fn to_nix_pid(pid: u32) -> Option<nix::unistd::Pid> {
    match i32::try_from(pid) {
        Ok(raw) if raw > 0 => Some(nix::unistd::Pid::from_raw(raw)),
        _ => None,
    }
}

#[cfg(not(unix))]
impl ProcessControl for SystemProcesses {
    fn is_alive(&self, _pid: u32) -> bool {
        false
    }

    fn signal(&self, pid: u32, _kind: SignalKind) {
        log::warn!("signals are not supported on this platform (pid {pid})");
    }
}

/// Pid of the process that spawned us, when the platform exposes it.
pub fn parent_pid() -> u32 {
    #[cfg(unix)]
    {
        std::os::unix::process::parent_id()
    }
    #[cfg(not(unix))]
    {
        0
    }
}
