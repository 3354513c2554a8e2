//! Reconciliation of state left behind by crashes and killed processes.
//!
//! Two independent passes:
//!
//! 1. a state record whose daemon is gone marks an abandoned session; it is
//!    closed at the best estimate the usage rows allow and the record removed;
//! 2. any session still open a day after it started is closed with a flat
//!    eight hour duration, whether or not a state record points at it.
//!
//! Both passes only touch sessions nobody is tracking, so running cleanup
//! next to a live daemon is safe, and running it twice equals running it once.

use crate::core::state_store::{StateRead, StateStore};
use crate::db::log::ttlog_soft;
use crate::db::pool::DbPool;
use crate::db::queries::{
    close_session, close_session_with_duration, find_session, find_stale_open_sessions,
    last_seen_for_session, open_sessions,
};
use crate::errors::AppResult;
use crate::platform::process::ProcessControl;
use rusqlite::Connection;

/// Assumed length of an abandoned session that recorded no usage.
pub const ABANDONED_FALLBACK_SECS: i64 = 3600;
/// Open sessions older than this are closed by the staleness sweep.
pub const STALE_AFTER_SECS: i64 = 24 * 3600;
/// Duration given to sessions closed by the staleness sweep.
pub const STALE_DEFAULT_DURATION_SECS: i64 = 8 * 3600;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbandonedSession {
    pub client: String,
    pub session_id: i64,
    pub end_time: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub abandoned: Option<AbandonedSession>,
    pub stale_closed: Vec<i64>,
    /// State record removed because there is no database to reconcile with.
    pub orphan_state_removed: bool,
    /// State file removed because it could not be parsed.
    pub corrupt_state_removed: bool,
}

impl CleanupReport {
    pub fn is_noop(&self) -> bool {
        self.abandoned.is_none()
            && self.stale_closed.is_empty()
            && !self.orphan_state_removed
            && !self.corrupt_state_removed
    }

    pub fn summary(&self) -> String {
        let mut parts = Vec::new();
        if let Some(a) = &self.abandoned {
            parts.push(format!("closed abandoned session {} ({})", a.session_id, a.client));
        }
        if !self.stale_closed.is_empty() {
            parts.push(format!("closed {} stale session(s)", self.stale_closed.len()));
        }
        if self.orphan_state_removed {
            parts.push("removed orphaned state record".to_string());
        }
        if self.corrupt_state_removed {
            parts.push("removed malformed state file".to_string());
        }
        if parts.is_empty() {
            "nothing to clean".to_string()
        } else {
            parts.join(", ")
        }
    }
}

pub struct CleanupLogic;

impl CleanupLogic {
    pub fn run(
        db_path: &str,
        state: &StateStore,
        procs: &dyn ProcessControl,
        now: i64,
    ) -> AppResult<CleanupReport> {
        let mut report = CleanupReport::default();
        let record = match state.load() {
            StateRead::Valid(rec) => Some(rec),
            StateRead::Missing => None,
            StateRead::Malformed => {
                state.clear()?;
                report.corrupt_state_removed = true;
                None
            }
        };

        //
        // No database: the state record alone is cleared
        //
        if !DbPool::exists(db_path) {
            if record.is_some() {
                state.clear()?;
                report.orphan_state_removed = true;
            }
            return Ok(report);
        }

        let pool = DbPool::open_existing(db_path)?;

        //
        // 1) Abandoned session: state present, daemon gone
        //
        let mut live_session = None;
        if let Some(rec) = &record {
            if procs.is_alive(rec.tracker_pid) {
                live_session = Some(rec.session_id);
            } else {
                let end_time = estimate_end_time(&pool.conn, rec.session_id, now)?;
                if !close_session(&pool.conn, rec.session_id, end_time)? {
                    log::info!(
                        "abandoned session {} was already closed or missing",
                        rec.session_id
                    );
                }
                state.clear()?;
                log::info!(
                    "closed abandoned session {} for {} at {}",
                    rec.session_id,
                    rec.client,
                    end_time
                );
                report.abandoned = Some(AbandonedSession {
                    client: rec.client.clone(),
                    session_id: rec.session_id,
                    end_time,
                });
            }
        }

        //
        // 2) Staleness sweep
        //
        report.stale_closed = close_stale_sessions(&pool.conn, now, live_session)?;

        if !report.is_noop() {
            ttlog_soft(&pool.conn, "cleanup", "", &report.summary());
        }

        Ok(report)
    }

    /// Close every open session at its estimated end time.
    ///
    /// Used right before a new session is inserted: at that point no state
    /// record points at any open session, so any that remain are leftovers.
    pub fn close_untracked_open_sessions(conn: &Connection, now: i64) -> AppResult<Vec<i64>> {
        let mut closed = Vec::new();
        for session in open_sessions(conn)? {
            let end_time = estimate_end_time(conn, session.id, now)?;
            if close_session(conn, session.id, end_time)? {
                log::warn!(
                    "closed untracked open session {} for {} at {}",
                    session.id,
                    session.client,
                    end_time
                );
                closed.push(session.id);
            }
        }
        Ok(closed)
    }
}

/// Best-effort end time for a session whose daemon died.
///
/// The latest usage timestamp when there is one, else one hour after the
/// start, never before the start nor after `now`. Unknown sessions get `now`.
pub fn estimate_end_time(conn: &Connection, session_id: i64, now: i64) -> AppResult<i64> {
    let Some(session) = find_session(conn, session_id)? else {
        return Ok(now);
    };

    let estimate = last_seen_for_session(conn, session_id)?
        .unwrap_or(session.start_time + ABANDONED_FALLBACK_SECS);

    Ok(estimate.min(now).max(session.start_time))
}

fn close_stale_sessions(conn: &Connection, now: i64, keep: Option<i64>) -> AppResult<Vec<i64>> {
    let threshold = now - STALE_AFTER_SECS;
    let mut closed = Vec::new();

    for id in find_stale_open_sessions(conn, threshold)? {
        if Some(id) == keep {
            continue;
        }
        if close_session_with_duration(conn, id, STALE_DEFAULT_DURATION_SECS)? {
            closed.push(id);
        }
    }

    if !closed.is_empty() {
        log::info!("closed {} stale session(s): {:?}", closed.len(), closed);
    }
    Ok(closed)
}
