use crate::cli::commands::Runtime;
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::lifecycle::{StartOutcome, StopOutcome};
use crate::errors::AppResult;
use crate::ui::messages::{info, success, warning};
use crate::utils::formatting::format_duration;

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Start { client } = cmd {
        let runtime = Runtime::from_config(cfg)?;
        let controller = runtime.controller(cfg);

        match controller.start(client)? {
            StartOutcome::AlreadyTracking(state) => {
                warning(format!(
                    "Already tracking: {} (session {})",
                    state.client, state.session_id
                ));
            }
            StartOutcome::Started {
                client,
                session_id,
                tracker_pid,
                previous,
                repaired,
                closed_untracked,
            } => {
                if let Some(StopOutcome::Stopped {
                    client: prev,
                    duration,
                    ..
                }) = previous
                {
                    info(format!(
                        "Stopped previous session: {} ({})",
                        prev,
                        format_duration(duration)
                    ));
                }
                if let Some(report) = repaired
                    && !report.is_noop()
                {
                    info(format!("Cleaned up stale state: {}", report.summary()));
                }
                if !closed_untracked.is_empty() {
                    warning(format!(
                        "Closed {} untracked open session(s): {:?}",
                        closed_untracked.len(),
                        closed_untracked
                    ));
                }
                success(format!(
                    "Started tracking: {} (session {}, tracker pid {})",
                    client, session_id, tracker_pid
                ));
            }
        }
    }

    Ok(())
}
