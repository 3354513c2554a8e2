//! Durable single-slot store for the active-session record.
//!
//! Writes go to a sibling temp file which is then renamed over the slot, so a
//! concurrent reader sees either the old record or the new one, never a
//! partial file. Reads never fail: a missing, unreadable or malformed file is
//! "no active session", which keeps cleanup possible after any crash.

use crate::errors::AppResult;
use crate::models::session_state::SessionState;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// What the slot holds, classified from a single read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateRead {
    Missing,
    Malformed,
    Valid(SessionState),
}

#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn read(&self) -> Option<SessionState> {
        match self.load() {
            StateRead::Valid(state) => Some(state),
            StateRead::Missing | StateRead::Malformed => None,
        }
    }

    /// Read the slot once and classify it. An unreadable file counts as missing.
    pub fn load(&self) -> StateRead {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return StateRead::Missing,
            Err(e) => {
                log::warn!("cannot read state file {}: {e}", self.path.display());
                return StateRead::Missing;
            }
        };

        match SessionState::parse(&content) {
            Some(state) => StateRead::Valid(state),
            None => {
                log::warn!(
                    "ignoring malformed state file {} ({} bytes)",
                    self.path.display(),
                    content.len()
                );
                StateRead::Malformed
            }
        }
    }

    pub fn write(&self, state: &SessionState) -> AppResult<()> {
        if let Some(dir) = self.path.parent()
            && !dir.as_os_str().is_empty()
        {
            fs::create_dir_all(dir)?;
        }

        let tmp = self.temp_path();
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(state.to_file_contents().as_bytes())?;
            file.sync_all()?;
        }

        if let Err(e) = fs::rename(&tmp, &self.path) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        Ok(())
    }

    pub fn clear(&self) -> AppResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Temp name is per-process so two writers never share a temp file.
    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "state".into());
        name.push(format!(".{}.tmp", std::process::id()));
        self.path.with_file_name(name)
    }
}
