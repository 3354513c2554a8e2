use crate::cli::commands::Runtime;
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::lifecycle::StopOutcome;
use crate::errors::AppResult;
use crate::ui::messages::{info, success, warning};
use crate::utils::formatting::format_duration;

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if matches!(cmd, Commands::Stop) {
        let runtime = Runtime::from_config(cfg)?;
        let controller = runtime.controller(cfg);

        match controller.stop() {
            Ok(StopOutcome::NothingToStop) => info("No active session"),
            Ok(StopOutcome::Stopped {
                client, duration, ..
            }) => success(format!(
                "Stopped tracking: {} ({})",
                client,
                format_duration(duration)
            )),
            Err(e) => {
                warning("Failed to update session in database; state record cleared anyway");
                return Err(e);
            }
        }
    }

    Ok(())
}
