use crate::errors::{AppError, AppResult};
use crate::utils::path::expand_tilde;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// SQLite database holding sessions and application usage.
    pub database: String,
    /// Single-slot record of the active session.
    pub state_file: String,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    /// Directory holding one provisioned workspace per client. When unset,
    /// any valid client name may be tracked.
    #[serde(default)]
    pub clients_dir: Option<String>,
}

fn default_poll_interval() -> u64 {
    DEFAULT_POLL_INTERVAL_SECS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: Self::database_file().to_string_lossy().to_string(),
            state_file: Self::state_file_path().to_string_lossy().to_string(),
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            clients_dir: None,
        }
    }
}

impl Config {
    /// Return the standard configuration directory depending on the platform
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("clientclock")
    }

    /// Return the full path of the config file
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("config.yml")
    }

    /// Return the full path of the SQLite database
    pub fn database_file() -> PathBuf {
        Self::config_dir().join("time-tracking.sqlite")
    }

    pub fn state_file_path() -> PathBuf {
        Self::config_dir().join("active-session.state")
    }

    /// Load configuration from file, or return defaults if not found
    pub fn load() -> AppResult<Self> {
        let path = Self::config_file();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)
            .map_err(|e| AppError::Config(format!("cannot read {}: {}", path.display(), e)))?;
        let mut cfg: Config = serde_yaml::from_str(&content)
            .map_err(|e| AppError::Config(format!("cannot parse {}: {}", path.display(), e)))?;
        cfg.expand_paths();
        Ok(cfg)
    }

    fn expand_paths(&mut self) {
        self.database = expand_tilde(&self.database).to_string_lossy().to_string();
        self.state_file = expand_tilde(&self.state_file).to_string_lossy().to_string();
        if let Some(dir) = &self.clients_dir {
            self.clients_dir = Some(expand_tilde(dir).to_string_lossy().to_string());
        }
    }

    /// Poll interval used by the daemon, never below one second.
    pub fn poll_interval_secs(&self) -> u64 {
        self.poll_interval_secs.max(1)
    }

    /// The daemon writes its diagnostics next to the state file.
    pub fn daemon_log_file(&self) -> PathBuf {
        match Path::new(&self.state_file).parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.join("daemon.log"),
            _ => PathBuf::from("daemon.log"),
        }
    }

    /// Create the config directory and, unless `is_test`, write the config file.
    pub fn init_all(&self, is_test: bool) -> AppResult<Option<PathBuf>> {
        if is_test {
            return Ok(None);
        }

        fs::create_dir_all(Self::config_dir())?;

        let path = Self::config_file();
        if !path.exists() {
            fs::write(&path, serde_yaml::to_string(self)?)?;
        }
        Ok(Some(path))
    }
}
