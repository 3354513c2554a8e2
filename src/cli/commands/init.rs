use crate::cli::parser::Cli;
use crate::config::Config;
use crate::db::initialize::init_db;
use crate::db::log;
use crate::db::pool::DbPool;
use crate::errors::AppResult;
use crate::ui::messages::success;

/// Handle the `init` command
///
/// This initializes:
///  - the config directory and file (skipped in test mode)
///  - the SQLite database
///  - all pending DB migrations
pub fn handle(cli: &Cli, cfg: &Config) -> AppResult<()> {
    let config_path = cfg.init_all(cli.test)?;

    println!("⚙️  Initializing clientclock…");
    if let Some(path) = &config_path {
        println!("📄 Config file : {}", path.display());
    }
    println!("🗄️  Database   : {}", &cfg.database);

    let pool = DbPool::new(&cfg.database)?;
    let applied = init_db(&pool.conn)?;

    if applied.is_empty() {
        success(format!("Database already up to date: {}", &cfg.database));
    } else {
        for version in &applied {
            success(format!("Migration applied: {}", version));
        }
        log::ttlog_soft(
            &pool.conn,
            "init",
            "Database initialized",
            &format!("Database initialized at {}", &cfg.database),
        );
    }

    success(format!("Time tracking database initialized: {}", &cfg.database));
    Ok(())
}
