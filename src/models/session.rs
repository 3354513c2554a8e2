//! Session rows as stored in the `sessions` table.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub id: i64,
    pub client: String,
    pub start_time: i64,       // ⇔ sessions.start_time (unix seconds)
    pub end_time: Option<i64>, // NULL while the session is open
    pub duration: Option<i64>, // set together with end_time
    pub created_at: i64,
}

impl Session {
    pub fn is_open(&self) -> bool {
        self.end_time.is_none()
    }

    /// Seconds elapsed so far for an open session, or the stored duration.
    pub fn elapsed(&self, now: i64) -> i64 {
        match self.duration {
            Some(d) => d,
            None => (now - self.start_time).max(0),
        }
    }
}
