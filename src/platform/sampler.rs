//! Foreground application detection.
//!
//! Sampling never fails from the caller's point of view: every platform error
//! or timeout turns into [`AppSample::unknown`], so the daemon keeps ticking.

use std::io::Read;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

pub const UNKNOWN_APP: &str = "Unknown";

/// Upper bound for a single external detection command.
pub const DETECT_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppSample {
    pub name: String,
    /// Bundle id, executable path or similar platform identifier.
    pub identifier: Option<String>,
}

impl AppSample {
    pub fn new(name: impl Into<String>, identifier: Option<String>) -> Self {
        Self {
            name: name.into(),
            identifier: identifier.filter(|id| !id.trim().is_empty()),
        }
    }

    pub fn unknown() -> Self {
        Self {
            name: UNKNOWN_APP.to_string(),
            identifier: None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.name == UNKNOWN_APP
    }
}

pub trait ForegroundSampler {
    fn sample(&self) -> AppSample;
}

/// Queries the running desktop for the frontmost application.
#[derive(Debug, Clone)]
pub struct SystemSampler {
    timeout: Duration,
}

impl Default for SystemSampler {
    fn default() -> Self {
        Self::new(DETECT_TIMEOUT)
    }
}

impl SystemSampler {
    pub fn new(timeout: Duration) -> Self {
        #[cfg(target_os = "macos")]
        log::info!("foreground detection: osascript (System Events)");

        #[cfg(target_os = "linux")]
        log::info!("foreground detection: xdotool + /proc");

        #[cfg(feature = "active-window")]
        log::info!("foreground detection: active-win-pos-rs enabled");

        Self { timeout }
    }

    fn detect(&self) -> Option<AppSample> {
        #[cfg(feature = "active-window")]
        {
            if let Some(sample) = detect_active_window() {
                return Some(sample);
            }
        }

        #[cfg(target_os = "macos")]
        {
            detect_macos(self.timeout)
        }

        #[cfg(target_os = "linux")]
        {
            detect_linux(self.timeout)
        }

        #[cfg(not(any(target_os = "macos", target_os = "linux")))]
        {
            let _ = self.timeout;
            None
        }
    }
}

impl ForegroundSampler for SystemSampler {
    fn sample(&self) -> AppSample {
        match self.detect() {
            Some(sample) if !sample.name.trim().is_empty() => sample,
            _ => {
                log::debug!("foreground detection returned nothing, using sentinel");
                AppSample::unknown()
            }
        }
    }
}

#[cfg(feature = "active-window")]
fn detect_active_window() -> Option<AppSample> {
    match active_win_pos_rs::get_active_window() {
        Ok(window) => {
            let path = window.process_path.to_string_lossy().to_string();
            Some(AppSample::new(window.app_name, Some(path)))
        }
        Err(()) => None,
    }
}

#[cfg(target_os = "macos")]
fn detect_macos(timeout: Duration) -> Option<AppSample> {
    let name = run_with_timeout(
        Command::new("osascript").args([
            "-e",
            "tell application \"System Events\" to get name of first application process whose frontmost is true",
        ]),
        timeout,
    )?;
    let bundle = run_with_timeout(
        Command::new("osascript").args([
            "-e",
            "tell application \"System Events\" to get bundle identifier of first application process whose frontmost is true",
        ]),
        timeout,
    );
    Some(AppSample::new(name, bundle))
}

#[cfg(target_os = "linux")]
fn detect_linux(timeout: Duration) -> Option<AppSample> {
    let pid = run_with_timeout(
        Command::new("xdotool").args(["getactivewindow", "getwindowpid"]),
        timeout,
    )?;
    let pid: u32 = pid.parse().ok()?;

    let name = std::fs::read_to_string(format!("/proc/{pid}/comm")).ok()?;
    let exe = std::fs::read_link(format!("/proc/{pid}/exe"))
        .ok()
        .map(|p| p.to_string_lossy().to_string());

    Some(AppSample::new(name.trim(), exe))
}

/// Run a command, returning its trimmed stdout when it succeeds within `timeout`.
/// The child is killed once the bound is exceeded.
pub fn run_with_timeout(cmd: &mut Command, timeout: Duration) -> Option<String> {
    let mut child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .ok()?;

    let deadline = Instant::now() + timeout;
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) if Instant::now() >= deadline => {
                log::debug!("detection command timed out after {:?}", timeout);
                let _ = child.kill();
                let _ = child.wait();
                return None;
            }
            Ok(None) => thread::sleep(Duration::from_millis(20)),
            Err(e) => {
                log::debug!("detection command wait failed: {e}");
                return None;
            }
        }
    };

    if !status.success() {
        return None;
    }

    let mut out = String::new();
    child.stdout.take()?.read_to_string(&mut out).ok()?;
    let out = out.trim().to_string();
    if out.is_empty() { None } else { Some(out) }
}
