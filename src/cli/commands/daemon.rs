use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::daemon::TrackingDaemon;
use crate::core::state_store::StateStore;
use crate::db::pool::DbPool;
use crate::errors::AppResult;
use crate::models::client::ClientName;
use crate::platform::sampler::SystemSampler;
use std::time::Duration;

/// Entry point of the background tracker spawned by `start`.
pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Daemon {
        session_id,
        client,
        interval,
    } = cmd
    {
        let client = ClientName::parse(client)?;
        let interval = interval.unwrap_or_else(|| cfg.poll_interval_secs());

        let pool = DbPool::open_existing(&cfg.database).inspect_err(|e| {
            log::error!("daemon for session {session_id} cannot open the database: {e}");
        })?;

        let mut daemon = TrackingDaemon::new(
            pool,
            StateStore::new(&cfg.state_file),
            SystemSampler::default(),
            *session_id,
            client,
            Duration::from_secs(interval),
        )?;
        daemon.run()?;
    }

    Ok(())
}
