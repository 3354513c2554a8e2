//! The active-session record persisted outside the database.
//!
//! On disk it is four `KEY=value` lines:
//!
//! ```text
//! CLIENT='acme'
//! SESSION_ID=42
//! PID=1234
//! TRACKER_PID=1240
//! ```
//!
//! Parsing is permissive: unknown keys and junk lines are ignored, values may
//! be single-quoted, and a record missing a required field is simply absent.

use crate::models::client::is_valid_slug;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionState {
    pub client: String,
    pub session_id: i64,
    /// Pid of the controller invocation that started the session.
    pub pid: u32,
    /// Pid of the tracking daemon.
    pub tracker_pid: u32,
}

impl SessionState {
    pub fn to_file_contents(&self) -> String {
        format!(
            "CLIENT='{}'\nSESSION_ID={}\nPID={}\nTRACKER_PID={}\n",
            self.client, self.session_id, self.pid, self.tracker_pid
        )
    }

    /// Parse a state file. Returns `None` for anything that is not a complete record.
    pub fn parse(content: &str) -> Option<Self> {
        let mut client = None;
        let mut session_id = None;
        let mut pid = None;
        let mut tracker_pid = None;

        for line in content.lines() {
            let Some((key, raw)) = line.trim().split_once('=') else {
                continue;
            };
            let value = unquote(raw.trim());

            match key.trim() {
                "CLIENT" => client = Some(value.to_string()),
                "SESSION_ID" => session_id = value.parse::<i64>().ok(),
                "PID" => pid = value.parse::<u32>().ok(),
                "TRACKER_PID" => tracker_pid = value.parse::<u32>().ok(),
                _ => {}
            }
        }

        let client = client.filter(|c| is_valid_slug(c))?;
        let session_id = session_id.filter(|id| *id > 0)?;
        let tracker_pid = tracker_pid.filter(|p| *p > 0)?;

        Some(Self {
            client,
            session_id,
            pid: pid.unwrap_or(0),
            tracker_pid,
        })
    }
}

fn unquote(value: &str) -> &str {
    let value = value.strip_prefix('\'').unwrap_or(value);
    value.strip_suffix('\'').unwrap_or(value)
}
