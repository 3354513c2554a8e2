//! The tracking daemon: sample the foreground app, credit one poll interval
//! to it, sleep, repeat. It has no stop condition of its own; it runs until
//! SIGTERM/SIGINT (or SIGKILL) arrives.

use crate::core::state_store::StateStore;
use crate::db::pool::DbPool;
use crate::db::queries::record_usage;
use crate::errors::{AppError, AppResult};
use crate::models::client::ClientName;
use crate::models::session_state::SessionState;
use crate::platform::process::parent_pid;
use crate::platform::sampler::{AppSample, ForegroundSampler};
use crate::utils::time::now_ts;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

/// Longest uninterrupted sleep, so a shutdown request is noticed quickly.
const SLEEP_SLICE: Duration = Duration::from_millis(100);

pub struct TrackingDaemon<S: ForegroundSampler> {
    pool: DbPool,
    state: StateStore,
    sampler: S,
    session_id: i64,
    client: ClientName,
    interval: Duration,
    shutdown: Arc<AtomicBool>,
}

impl<S: ForegroundSampler> TrackingDaemon<S> {
    pub fn new(
        pool: DbPool,
        state: StateStore,
        sampler: S,
        session_id: i64,
        client: ClientName,
        interval: Duration,
    ) -> AppResult<Self> {
        if session_id <= 0 {
            return Err(AppError::InvalidSession(session_id));
        }
        Ok(Self {
            pool,
            state,
            sampler,
            session_id,
            client,
            interval: interval.max(Duration::from_secs(1)),
            shutdown: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Record our pid in the state store so `stop` and `cleanup` can supervise us.
    pub fn publish_pid(&self) -> AppResult<SessionState> {
        let own_pid = std::process::id();
        let record = match self.state.read() {
            Some(existing) if existing.session_id == self.session_id => SessionState {
                tracker_pid: own_pid,
                ..existing
            },
            _ => SessionState {
                client: self.client.to_string(),
                session_id: self.session_id,
                pid: parent_pid(),
                tracker_pid: own_pid,
            },
        };
        self.state.write(&record)?;
        Ok(record)
    }

    /// One poll: sample and credit the interval to the foreground app.
    pub fn tick(&mut self, now: i64) -> AppResult<AppSample> {
        let sample = self.sampler.sample();
        let increment = i64::try_from(self.interval.as_secs()).unwrap_or(i64::MAX);

        record_usage(
            &mut self.pool,
            self.session_id,
            &sample.name,
            sample.identifier.as_deref(),
            increment,
            now,
        )?;
        Ok(sample)
    }

    /// Install signal handlers, publish the pid and loop until told to stop.
    pub fn run(&mut self) -> AppResult<u64> {
        for sig in [signal_hook::consts::SIGTERM, signal_hook::consts::SIGINT] {
            signal_hook::flag::register(sig, self.shutdown_flag())
                .map_err(|e| AppError::Daemon(format!("cannot install handler for signal {sig}: {e}")))?;
        }

        match self.publish_pid() {
            Ok(record) => log::info!(
                "daemon pid {} tracking session {} ({})",
                record.tracker_pid,
                record.session_id,
                record.client
            ),
            Err(e) => log::error!("failed to publish daemon pid: {e}"),
        }

        let ticks = self.run_until_shutdown();
        log::info!(
            "shutdown requested, exiting after {ticks} tick(s) for session {}",
            self.session_id
        );
        Ok(ticks)
    }

    /// The poll loop. Storage failures are logged and the loop goes on.
    pub fn run_until_shutdown(&mut self) -> u64 {
        let mut ticks = 0;

        while !self.shutdown.load(Ordering::Relaxed) {
            let started = Instant::now();

            match self.tick(now_ts()) {
                Ok(sample) => log::debug!("+{}s {}", self.interval.as_secs(), sample.name),
                Err(e) => log::warn!("sample not recorded: {e}"),
            }
            ticks += 1;

            self.sleep_until(started + self.interval);
        }

        ticks
    }

    fn sleep_until(&self, deadline: Instant) {
        loop {
            if self.shutdown.load(Ordering::Relaxed) {
                return;
            }
            let now = Instant::now();
            if now >= deadline {
                return;
            }
            thread::sleep((deadline - now).min(SLEEP_SLICE));
        }
    }
}
