use clientclock::core::state_store::StateRead;
use clientclock::models::session_state::SessionState;
use std::fs;

mod common;
use common::setup_paths;

fn sample_state() -> SessionState {
    SessionState {
        client: "acme".into(),
        session_id: 42,
        pid: 1234,
        tracker_pid: 1240,
    }
}

#[test]
fn missing_file_means_no_session() {
    let paths = setup_paths("state_missing");
    assert!(paths.state_store().read().is_none());
}

#[test]
fn written_state_reads_back() {
    let paths = setup_paths("state_write_read");
    let store = paths.state_store();

    store.write(&sample_state()).unwrap();
    assert_eq!(store.read(), Some(sample_state()));

    let raw = fs::read_to_string(&paths.state).unwrap();
    assert_eq!(
        raw,
        "CLIENT='acme'\nSESSION_ID=42\nPID=1234\nTRACKER_PID=1240\n"
    );
}

#[test]
fn write_replaces_the_previous_record() {
    let paths = setup_paths("state_overwrite");
    let store = paths.state_store();

    store.write(&sample_state()).unwrap();
    let next = SessionState {
        client: "beta-corp".into(),
        session_id: 43,
        pid: 1300,
        tracker_pid: 1301,
    };
    store.write(&next).unwrap();

    assert_eq!(store.read(), Some(next));
}

#[test]
fn write_leaves_no_temp_files() {
    let paths = setup_paths("state_no_temp");
    let store = paths.state_store();
    store.write(&sample_state()).unwrap();
    store.write(&sample_state()).unwrap();

    let names: Vec<String> = fs::read_dir(&paths.dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    assert_eq!(names, vec!["active-session.state".to_string()]);
}

#[test]
fn write_creates_parent_directory() {
    let paths = setup_paths("state_parent_dir");
    let nested = paths.dir.join("nested").join("active-session.state");
    let store = clientclock::core::state_store::StateStore::new(&nested);

    store.write(&sample_state()).unwrap();
    assert!(nested.is_file());
}

#[test]
fn clear_is_idempotent() {
    let paths = setup_paths("state_clear");
    let store = paths.state_store();
    store.write(&sample_state()).unwrap();

    store.clear().unwrap();
    assert!(store.read().is_none());
    assert!(!store.path().exists());
    store.clear().unwrap();
}

#[test]
fn malformed_files_read_as_no_session() {
    let paths = setup_paths("state_malformed");
    let store = paths.state_store();

    let broken = [
        "",
        "garbage\n\u{0}\u{1}",
        "CLIENT='acme'\nSESSION_ID=42\nPID=1234\n",
        "CLIENT='acme'\nSESSION_ID=abc\nPID=1234\nTRACKER_PID=1240\n",
        "CLIENT='Acme Corp'\nSESSION_ID=42\nPID=1234\nTRACKER_PID=1240\n",
        "CLIENT='acme'\nSESSION_ID=0\nPID=1234\nTRACKER_PID=1240\n",
        "CLIENT='acme'\nSESSION_ID=42\nPID=1234\nTRACKER_PID=0\n",
    ];

    for content in broken {
        fs::write(&paths.state, content).unwrap();
        assert!(store.read().is_none(), "accepted: {content:?}");
    }
}

#[test]
fn parsing_is_permissive_about_format() {
    let parsed = SessionState::parse(
        "# written by hand\n  CLIENT = acme \nEXTRA=1\nSESSION_ID='42'\nTRACKER_PID=1240\n",
    )
    .expect("should parse");

    assert_eq!(parsed.client, "acme");
    assert_eq!(parsed.session_id, 42);
    assert_eq!(parsed.tracker_pid, 1240);
    // missing PID defaults to zero
    assert_eq!(parsed.pid, 0);
}

#[test]
fn load_tells_missing_from_malformed() {
    let paths = setup_paths("state_load_kinds");
    let store = paths.state_store();

    assert_eq!(store.load(), StateRead::Missing);

    fs::write(&paths.state, "CLIENT='acme'\nSESSION_ID=oops\n").unwrap();
    assert_eq!(store.load(), StateRead::Malformed);

    store.write(&sample_state()).unwrap();
    assert_eq!(store.load(), StateRead::Valid(sample_state()));
}

#[test]
fn unreadable_slot_is_not_malformed() {
    let paths = setup_paths("state_load_unreadable");
    fs::create_dir_all(&paths.state).unwrap();

    assert_eq!(paths.state_store().load(), StateRead::Missing);
}
