use clientclock::core::audit::AuditLogic;
use clientclock::core::cleanup::{
    ABANDONED_FALLBACK_SECS, CleanupLogic, STALE_DEFAULT_DURATION_SECS, estimate_end_time,
};
use clientclock::db::initialize::open_initialized;
use clientclock::db::queries::{close_session, create_session, find_session, record_usage};
use clientclock::models::session_state::SessionState;
use std::fs;

mod common;
use common::{FakeProcesses, setup_paths};

fn state_for(session_id: i64, tracker_pid: u32) -> SessionState {
    SessionState {
        client: "acme".into(),
        session_id,
        pid: 1,
        tracker_pid,
    }
}

#[test]
fn dead_daemon_session_closes_one_hour_after_start() {
    let paths = setup_paths("cleanup_fallback_hour");
    let pool = open_initialized(&paths.db).unwrap();
    let id = create_session(&pool.conn, "acme", 1_000).unwrap();

    let store = paths.state_store();
    store.write(&state_for(id, 4242)).unwrap();
    let procs = FakeProcesses::new();

    let report = CleanupLogic::run(&paths.db, &store, &procs, 100_000).unwrap();

    let s = find_session(&pool.conn, id).unwrap().unwrap();
    assert_eq!(s.end_time, Some(1_000 + ABANDONED_FALLBACK_SECS));
    assert_eq!(s.duration, Some(ABANDONED_FALLBACK_SECS));
    assert!(store.read().is_none());

    let abandoned = report.abandoned.expect("abandoned session reported");
    assert_eq!(abandoned.session_id, id);
    assert_eq!(abandoned.end_time, 4_600);
    // already closed by the first pass, so the sweep has nothing to do
    assert!(report.stale_closed.is_empty());
}

#[test]
fn dead_daemon_session_ends_at_last_recorded_usage() {
    let paths = setup_paths("cleanup_last_seen");
    let mut pool = open_initialized(&paths.db).unwrap();
    let id = create_session(&pool.conn, "acme", 1_000).unwrap();
    record_usage(&mut pool, id, "Terminal", None, 5, 1_300).unwrap();
    record_usage(&mut pool, id, "Browser", None, 5, 1_450).unwrap();

    let store = paths.state_store();
    store.write(&state_for(id, 4242)).unwrap();

    CleanupLogic::run(&paths.db, &store, &FakeProcesses::new(), 2_000).unwrap();

    let s = find_session(&pool.conn, id).unwrap().unwrap();
    assert_eq!(s.end_time, Some(1_450));
    assert_eq!(s.duration, Some(450));
}

#[test]
fn end_estimate_never_passes_now() {
    let paths = setup_paths("cleanup_clamp_now");
    let pool = open_initialized(&paths.db).unwrap();
    let id = create_session(&pool.conn, "acme", 1_000).unwrap();

    assert_eq!(estimate_end_time(&pool.conn, id, 1_600).unwrap(), 1_600);
    assert_eq!(estimate_end_time(&pool.conn, id, 500).unwrap(), 1_000);
    assert_eq!(estimate_end_time(&pool.conn, 999, 7_777).unwrap(), 7_777);
}

#[test]
fn old_open_sessions_get_eight_hours() {
    let paths = setup_paths("cleanup_stale");
    let pool = open_initialized(&paths.db).unwrap();
    let old = create_session(&pool.conn, "acme", 1_000).unwrap();
    let recent = create_session(&pool.conn, "beta", 90_000).unwrap();

    let report =
        CleanupLogic::run(&paths.db, &paths.state_store(), &FakeProcesses::new(), 100_000)
            .unwrap();

    assert_eq!(report.stale_closed, vec![old]);
    let s = find_session(&pool.conn, old).unwrap().unwrap();
    assert_eq!(s.duration, Some(STALE_DEFAULT_DURATION_SECS));
    assert_eq!(s.end_time, Some(1_000 + STALE_DEFAULT_DURATION_SECS));

    assert!(find_session(&pool.conn, recent).unwrap().unwrap().is_open());
}

#[test]
fn cleanup_twice_changes_nothing_more() {
    let paths = setup_paths("cleanup_idempotent");
    let pool = open_initialized(&paths.db).unwrap();
    let abandoned = create_session(&pool.conn, "acme", 1_000).unwrap();
    let stale = create_session(&pool.conn, "beta", 2_000).unwrap();

    let store = paths.state_store();
    store.write(&state_for(abandoned, 4242)).unwrap();
    let procs = FakeProcesses::new();

    let first = CleanupLogic::run(&paths.db, &store, &procs, 200_000).unwrap();
    assert!(!first.is_noop());
    let after_first: Vec<_> = [abandoned, stale]
        .iter()
        .map(|id| find_session(&pool.conn, *id).unwrap())
        .collect();

    let second = CleanupLogic::run(&paths.db, &store, &procs, 200_000).unwrap();
    assert!(second.is_noop());
    let after_second: Vec<_> = [abandoned, stale]
        .iter()
        .map(|id| find_session(&pool.conn, *id).unwrap())
        .collect();

    assert_eq!(after_first, after_second);
}

#[test]
fn live_tracked_session_is_left_alone() {
    let paths = setup_paths("cleanup_live");
    let pool = open_initialized(&paths.db).unwrap();
    // older than the staleness window, but its daemon is still running
    let id = create_session(&pool.conn, "acme", 1_000).unwrap();

    let store = paths.state_store();
    store.write(&state_for(id, 4242)).unwrap();
    let procs = FakeProcesses::new();
    procs.spawn(4242);

    let report = CleanupLogic::run(&paths.db, &store, &procs, 200_000).unwrap();

    assert!(report.is_noop());
    assert!(find_session(&pool.conn, id).unwrap().unwrap().is_open());
    assert_eq!(store.read(), Some(state_for(id, 4242)));
    assert!(procs.signals.borrow().is_empty());
}

#[test]
fn state_for_already_closed_session_is_just_removed() {
    let paths = setup_paths("cleanup_already_closed");
    let pool = open_initialized(&paths.db).unwrap();
    let id = create_session(&pool.conn, "acme", 1_000).unwrap();
    close_session(&pool.conn, id, 1_200).unwrap();

    let store = paths.state_store();
    store.write(&state_for(id, 4242)).unwrap();

    CleanupLogic::run(&paths.db, &store, &FakeProcesses::new(), 100_000).unwrap();

    assert!(store.read().is_none());
    assert_eq!(find_session(&pool.conn, id).unwrap().unwrap().end_time, Some(1_200));
}

#[test]
fn without_database_only_the_state_is_cleared() {
    let paths = setup_paths("cleanup_no_db");
    let store = paths.state_store();
    store.write(&state_for(7, 4242)).unwrap();

    let report = CleanupLogic::run(&paths.db, &store, &FakeProcesses::new(), 100_000).unwrap();

    assert!(report.orphan_state_removed);
    assert!(store.read().is_none());
    assert!(!std::path::Path::new(&paths.db).exists());
}

#[test]
fn nothing_to_do_without_database_or_state() {
    let paths = setup_paths("cleanup_noop");
    let report =
        CleanupLogic::run(&paths.db, &paths.state_store(), &FakeProcesses::new(), 100_000)
            .unwrap();
    assert!(report.is_noop());
    assert_eq!(report.summary(), "nothing to clean");
}

#[test]
fn malformed_state_file_is_removed() {
    let paths = setup_paths("cleanup_corrupt");
    fs::write(&paths.state, "SESSION_ID=what\n").unwrap();
    let store = paths.state_store();

    let report = CleanupLogic::run(&paths.db, &store, &FakeProcesses::new(), 100_000).unwrap();

    assert!(report.corrupt_state_removed);
    assert!(!store.path().exists());
}

#[test]
fn cleanup_writes_an_audit_entry() {
    let paths = setup_paths("cleanup_audit");
    let pool = open_initialized(&paths.db).unwrap();
    create_session(&pool.conn, "acme", 1_000).unwrap();

    CleanupLogic::run(&paths.db, &paths.state_store(), &FakeProcesses::new(), 100_000).unwrap();

    let entries = AuditLogic::entries(&pool).unwrap();
    let cleanup = entries
        .iter()
        .find(|e| e.operation == "cleanup")
        .expect("cleanup entry");
    assert!(cleanup.message.contains("1 stale session"));
}

#[test]
fn untracked_open_sessions_are_closed_at_estimate() {
    let paths = setup_paths("cleanup_untracked");
    let pool = open_initialized(&paths.db).unwrap();
    let a = create_session(&pool.conn, "acme", 1_000).unwrap();
    let b = create_session(&pool.conn, "beta", 2_000).unwrap();

    let closed = CleanupLogic::close_untracked_open_sessions(&pool.conn, 2_500).unwrap();
    assert_eq!(closed, vec![a, b]);

    assert_eq!(find_session(&pool.conn, a).unwrap().unwrap().end_time, Some(2_500));
    assert_eq!(find_session(&pool.conn, b).unwrap().unwrap().end_time, Some(2_500));
}

#[test]
fn unreadable_state_slot_is_left_in_place() {
    let paths = setup_paths("cleanup_unreadable_state");
    fs::create_dir_all(&paths.state).unwrap();
    let store = paths.state_store();

    let report = CleanupLogic::run(&paths.db, &store, &FakeProcesses::new(), 100_000).unwrap();

    assert!(!report.corrupt_state_removed);
    assert!(store.path().is_dir());
}
