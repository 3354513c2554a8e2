use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::cleanup::CleanupLogic;
use crate::core::state_store::StateStore;
use crate::errors::AppResult;
use crate::platform::process::SystemProcesses;
use crate::ui::messages::success;
use crate::utils::time::now_ts;

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if matches!(cmd, Commands::Cleanup) {
        let state = StateStore::new(&cfg.state_file);
        let report = CleanupLogic::run(&cfg.database, &state, &SystemProcesses, now_ts())?;

        if report.is_noop() {
            success("No cleanup needed");
            return Ok(());
        }

        if let Some(a) = &report.abandoned {
            println!("🧹 Found stale session: {}", a.client);
            success(format!("Cleaned up session {}", a.session_id));
        }
        if !report.stale_closed.is_empty() {
            println!(
                "🧹 Found {} old unclosed session(s)",
                report.stale_closed.len()
            );
            success(format!(
                "Closed {} old session(s) (estimated 8h duration)",
                report.stale_closed.len()
            ));
        }
        if report.orphan_state_removed {
            success("Removed orphaned state file");
        }
        if report.corrupt_state_removed {
            success("Removed malformed state file");
        }
    }

    Ok(())
}
