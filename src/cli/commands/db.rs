use crate::cli::parser::Commands;
use crate::config::Config;
use crate::db::pool::DbPool;
use crate::db::queries::open_sessions;
use crate::db::stats;
use crate::errors::AppResult;
use crate::utils::colors::{CYAN, GREEN, RED, RESET, YELLOW};

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Db {
        check,
        vacuum,
        info,
    } = cmd
    {
        let mut pool = DbPool::open_existing(&cfg.database)?;

        if *info {
            stats::print_db_info(&mut pool, &cfg.database)?;
        }

        if *check {
            run_checks(&pool)?;
        }

        if *vacuum {
            println!("{}▶ Running VACUUM…{}", CYAN, RESET);
            // the daemon may hold a WAL reader; fold the log back first
            pool.with_conn(|conn| {
                conn.query_row("PRAGMA wal_checkpoint(TRUNCATE);", [], |_| Ok(()))?;
                conn.execute_batch("VACUUM;")?;
                Ok(())
            })?;
            println!("{}✔ Vacuum completed.{}\n", GREEN, RESET);
        }
    }

    Ok(())
}

/// SQLite integrity, foreign keys, and the session invariants.
fn run_checks(pool: &DbPool) -> AppResult<()> {
    println!("{}▶ Running integrity check…{}", CYAN, RESET);

    let integrity: String = pool
        .conn
        .query_row("PRAGMA integrity_check;", [], |row| row.get(0))?;
    if integrity == "ok" {
        println!("{}✔ Integrity check passed.{}", GREEN, RESET);
    } else {
        println!("{}✘ Integrity check failed:{} {}", RED, RESET, integrity);
    }

    let orphans: i64 = {
        let mut stmt = pool.conn.prepare("PRAGMA foreign_key_check;")?;
        let mut rows = stmt.query([])?;
        let mut n = 0;
        while rows.next()?.is_some() {
            n += 1;
        }
        n
    };
    if orphans == 0 {
        println!("{}✔ Foreign keys consistent.{}", GREEN, RESET);
    } else {
        println!("{}✘ {} row(s) violate foreign keys.{}", RED, orphans, RESET);
    }

    let open = open_sessions(&pool.conn)?;
    match open.len() {
        0 | 1 => println!("{}✔ {} open session(s).{}", GREEN, open.len(), RESET),
        n => {
            let ids: Vec<String> = open.iter().map(|s| s.id.to_string()).collect();
            println!(
                "{}⚠ {} open sessions ({}), run `clientclock cleanup`.{}",
                YELLOW,
                n,
                ids.join(", "),
                RESET
            );
        }
    }

    let mismatched: i64 = pool.conn.query_row(
        "SELECT COUNT(*) FROM sessions
          WHERE end_time IS NOT NULL AND duration != end_time - start_time",
        [],
        |row| row.get(0),
    )?;
    if mismatched > 0 {
        println!(
            "{}⚠ {} session(s) with a duration that does not match their end time.{}",
            YELLOW, mismatched, RESET
        );
    }

    println!();
    Ok(())
}
