use clientclock::models::client::ClientName;
use clientclock::platform::launcher::SelfExecLauncher;
use clientclock::platform::sampler::{AppSample, run_with_timeout};
use clientclock::platform::workspace::{DirWorkspaces, WorkspaceCheck};
use std::fs;
use std::time::{Duration, Instant};

mod common;
use common::setup_paths;

#[test]
fn blank_identifiers_are_dropped() {
    let sample = AppSample::new("Editor", Some("   ".into()));
    assert_eq!(sample.identifier, None);
    assert!(!sample.is_unknown());
}

#[test]
fn workspaces_require_a_directory_per_client() {
    let paths = setup_paths("platform_workspaces");
    fs::create_dir_all(paths.dir.join("acme")).unwrap();
    fs::write(paths.dir.join("beta"), "not a dir").unwrap();

    let ws = DirWorkspaces::new(paths.dir.to_str());
    assert!(ws.exists(&ClientName::parse("acme").unwrap()));
    assert!(!ws.exists(&ClientName::parse("beta").unwrap()));
    assert!(!ws.exists(&ClientName::parse("gamma").unwrap()));

    let open = DirWorkspaces::default();
    assert!(open.exists(&ClientName::parse("gamma").unwrap()));
}

#[test]
fn daemon_command_line_carries_session_and_paths() {
    let launcher = SelfExecLauncher {
        exe: "/usr/local/bin/clientclock".into(),
        database: "/tmp/t.sqlite".into(),
        state_file: "/tmp/t.state".into(),
        poll_interval_secs: 5,
    };
    let cmd = launcher.command(42, &ClientName::parse("acme-corp").unwrap());

    let args: Vec<String> = cmd
        .get_args()
        .map(|a| a.to_string_lossy().to_string())
        .collect();
    assert_eq!(
        args,
        vec![
            "--db",
            "/tmp/t.sqlite",
            "--state",
            "/tmp/t.state",
            "daemon",
            "--session-id",
            "42",
            "--client",
            "acme-corp",
            "--interval",
            "5",
        ]
    );
}

#[cfg(unix)]
mod unix {
    use super::*;
    use clientclock::platform::process::{ProcessControl, SignalKind, SystemProcesses};
    use std::process::Command;

    #[test]
    fn sampler_command_output_is_trimmed() {
        let out = run_with_timeout(
            Command::new("sh").args(["-c", "echo '  Terminal  '"]),
            Duration::from_secs(2),
        );
        assert_eq!(out.as_deref(), Some("Terminal"));
    }

    #[test]
    fn failing_or_silent_commands_yield_nothing() {
        assert_eq!(run_with_timeout(&mut Command::new("false"), Duration::from_secs(2)), None);
        assert_eq!(run_with_timeout(&mut Command::new("true"), Duration::from_secs(2)), None);
        assert_eq!(
            run_with_timeout(
                &mut Command::new("clientclock-no-such-binary"),
                Duration::from_secs(2)
            ),
            None
        );
    }

    #[test]
    fn slow_command_is_abandoned() {
        let started = Instant::now();
        let out = run_with_timeout(
            Command::new("sleep").arg("5"),
            Duration::from_millis(200),
        );
        assert_eq!(out, None);
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[test]
    fn liveness_follows_the_process() {
        let procs = SystemProcesses;
        assert!(procs.is_alive(std::process::id()));
        assert!(!procs.is_alive(0));
        assert!(!procs.is_alive(super::common::dead_pid()));

        let mut child = Command::new("sleep").arg("30").spawn().unwrap();
        let pid = child.id();
        assert!(procs.is_alive(pid));

        procs.signal(pid, SignalKind::Terminate);
        child.wait().unwrap();
        assert!(!procs.is_alive(pid));

        // already gone: nothing happens
        procs.signal(pid, SignalKind::Kill);
    }

    #[test]
    fn exited_daemon_is_reaped() {
        use clientclock::platform::launcher::DaemonLauncher;

        // `true` ignores the daemon arguments and exits right away
        let launcher = SelfExecLauncher {
            exe: "true".into(),
            database: "/tmp/unused.sqlite".into(),
            state_file: "/tmp/unused.state".into(),
            poll_interval_secs: 5,
        };
        let pid = launcher
            .launch(1, &ClientName::parse("acme").unwrap())
            .unwrap();

        let procs = SystemProcesses;
        let deadline = Instant::now() + Duration::from_secs(5);
        while procs.is_alive(pid) && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(20));
        }
        assert!(!procs.is_alive(pid), "pid {pid} still answers liveness checks");
    }
}
