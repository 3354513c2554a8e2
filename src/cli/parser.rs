use clap::{Parser, Subcommand};

/// Command-line interface definition for clientclock
/// Track focus sessions per client and the applications used during them
#[derive(Parser)]
#[command(
    name = "clientclock",
    version = env!("CARGO_PKG_VERSION"),
    about = "Track time spent per client, with a per-application breakdown, using SQLite",
    long_about = None
)]
pub struct Cli {
    /// Override database path (useful for tests or custom DB)
    #[arg(global = true, long = "db")]
    pub db: Option<String>,

    /// Override the active-session state file path
    #[arg(global = true, long = "state")]
    pub state: Option<String>,

    /// Run in test mode (no config file update)
    #[arg(global = true, long = "test", hide = true)]
    pub test: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database and configuration
    Init,

    /// Start tracking a client (stops any other active session first)
    Start {
        /// Client name (kebab-case, e.g. acme-corp)
        client: String,
    },

    /// Stop the active session
    Stop,

    /// Show the active session, if any
    Status {
        #[arg(long = "json", help = "Print the active session as JSON")]
        json: bool,
    },

    /// Repair sessions left open by crashed or killed trackers
    Cleanup,

    /// Show per-client totals, and the application breakdown for one client
    Stats {
        /// Restrict to one client
        client: Option<String>,

        #[arg(
            long = "limit",
            default_value_t = 10,
            help = "Maximum number of applications listed"
        )]
        limit: usize,
    },

    /// Manage the database (integrity checks, etc.)
    Db {
        #[arg(long = "check", help = "Check database integrity")]
        check: bool,

        #[arg(long = "vacuum", help = "Optimize the database using VACUUM")]
        vacuum: bool,

        #[arg(long = "info", help = "Show database information")]
        info: bool,
    },

    /// Print the internal log table
    Log {
        #[arg(long = "print", help = "Print rows from the internal log table")]
        print: bool,
    },

    /// Show the configuration
    Config {
        #[arg(long = "print", help = "Print the current configuration")]
        print_config: bool,
    },

    /// Background tracker (started by `start`, not meant to be run by hand)
    #[command(hide = true)]
    Daemon {
        #[arg(long = "session-id")]
        session_id: i64,

        #[arg(long = "client")]
        client: String,

        #[arg(long = "interval")]
        interval: Option<u64>,
    },
}
