use crate::cli::commands::Runtime;
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::db::pool::DbPool;
use crate::db::queries::find_session;
use crate::errors::AppResult;
use crate::models::session_state::SessionState;
use crate::platform::process::ProcessControl;
use crate::ui::messages::info;
use crate::utils::colors::{RESET, color_for_liveness};
use crate::utils::formatting::{format_duration, format_timestamp};
use crate::utils::time::now_ts;
use serde::Serialize;

#[derive(Serialize)]
struct StatusView<'a> {
    active: bool,
    #[serde(flatten)]
    state: Option<&'a SessionState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tracker_alive: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    start_time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    elapsed_seconds: Option<i64>,
}

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Status { json } = cmd {
        let runtime = Runtime::from_config(cfg)?;
        let controller = runtime.controller(cfg);
        let state = controller.status();

        let alive = state
            .as_ref()
            .map(|s| runtime.procs.is_alive(s.tracker_pid));

        // The database is only used to enrich the output.
        let session = match (&state, DbPool::open_existing(&cfg.database)) {
            (Some(s), Ok(pool)) => find_session(&pool.conn, s.session_id).ok().flatten(),
            _ => None,
        };
        let now = now_ts();

        if *json {
            let view = StatusView {
                active: state.is_some(),
                state: state.as_ref(),
                tracker_alive: alive,
                start_time: session.as_ref().map(|s| s.start_time),
                elapsed_seconds: session.as_ref().map(|s| s.elapsed(now)),
            };
            println!("{}", serde_json::to_string_pretty(&view)?);
            return Ok(());
        }

        let Some(state) = state else {
            info("No active session");
            return Ok(());
        };

        let alive = alive.unwrap_or(false);
        println!("⏱️  Tracking: {}", state.client);
        println!("   Session:  {}", state.session_id);
        if let Some(session) = &session {
            println!("   Since:    {}", format_timestamp(session.start_time));
            println!("   Elapsed:  {}", format_duration(session.elapsed(now)));
        }
        println!(
            "   Tracker:  {}{} ({}){}",
            color_for_liveness(alive),
            state.tracker_pid,
            if alive { "running" } else { "not running, run `clientclock cleanup`" },
            RESET
        );
    }

    Ok(())
}
