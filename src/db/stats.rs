use crate::db::pool::DbPool;
use crate::db::queries::list_clients;
use crate::errors::AppResult;
use crate::models::report::{AppBreakdown, ClientSummary};
use crate::utils::colors::{CYAN, GREEN, GREY, RESET, YELLOW};
use crate::utils::formatting::{format_duration, format_timestamp};
use rusqlite::{Connection, OptionalExtension, Row};
use std::fs;

fn map_summary(row: &Row) -> rusqlite::Result<ClientSummary> {
    Ok(ClientSummary {
        client: row.get(0)?,
        session_count: row.get(1)?,
        total_seconds: row.get(2)?,
        avg_seconds: row.get(3)?,
        last_start: row.get(4)?,
    })
}

/// Per-client totals, ordered by total tracked time (descending).
///
/// Open sessions are counted but contribute nothing to the totals until closed.
pub fn query_session_summary(
    conn: &Connection,
    client_filter: Option<&str>,
) -> AppResult<Vec<ClientSummary>> {
    let mut stmt = conn.prepare(
        "SELECT client,
                COUNT(*) AS sessions,
                COALESCE(SUM(duration), 0) AS total_seconds,
                CAST(COALESCE(AVG(duration), 0) AS INTEGER) AS avg_seconds,
                MAX(start_time) AS last_start
           FROM sessions
          WHERE ?1 IS NULL OR client = ?1
          GROUP BY client
          ORDER BY total_seconds DESC, client ASC",
    )?;

    let rows = stmt.query_map([client_filter], map_summary)?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

/// Foreground time per application for one client, largest first.
pub fn query_app_breakdown(
    conn: &Connection,
    client: &str,
    limit: usize,
) -> AppResult<Vec<AppBreakdown>> {
    let mut stmt = conn.prepare(
        "SELECT a.name, SUM(au.total_seconds) AS total_seconds
           FROM app_usage au
           JOIN applications a ON au.application_id = a.id
           JOIN sessions s ON au.session_id = s.id
          WHERE s.client = ?1
          GROUP BY a.name
          ORDER BY total_seconds DESC, a.name ASC
          LIMIT ?2",
    )?;

    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    let rows = stmt.query_map(rusqlite::params![client, limit], |row| {
        Ok(AppBreakdown {
            app_name: row.get(0)?,
            total_seconds: row.get(1)?,
        })
    })?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

pub fn print_db_info(pool: &mut DbPool, db_path: &str) -> AppResult<()> {
    println!();

    //
    // 1) FILE SIZE
    //
    let file_size = fs::metadata(db_path).map(|m| m.len()).unwrap_or(0);
    let file_mb = (file_size as f64) / (1024.0 * 1024.0);

    println!("{}• File:{} {}{}{}", CYAN, RESET, YELLOW, db_path, RESET);
    println!("{}• Size:{} {:.2} MB", CYAN, RESET, file_mb);

    //
    // 2) COUNTS
    //
    let sessions: i64 = pool
        .conn
        .query_row("SELECT COUNT(*) FROM sessions", [], |row| row.get(0))?;
    let open: i64 = pool.conn.query_row(
        "SELECT COUNT(*) FROM sessions WHERE end_time IS NULL",
        [],
        |row| row.get(0),
    )?;
    let apps: i64 = pool
        .conn
        .query_row("SELECT COUNT(*) FROM applications", [], |row| row.get(0))?;
    let clients = list_clients(&pool.conn)?;

    println!(
        "{}• Sessions:{} {}{}{} ({} open)",
        CYAN, RESET, GREEN, sessions, RESET, open
    );
    println!("{}• Applications:{} {}", CYAN, RESET, apps);
    if clients.is_empty() {
        println!("{}• Clients:{} {GREY}--{RESET}", CYAN, RESET);
    } else {
        println!("{}• Clients:{} {}", CYAN, RESET, clients.join(", "));
    }

    //
    // 3) TRACKED RANGE
    //
    let range: Option<(Option<i64>, Option<i64>)> = pool
        .conn
        .query_row(
            "SELECT MIN(start_time), MAX(start_time) FROM sessions",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;

    let (first, last) = range.unwrap_or((None, None));
    let fmt = |ts: Option<i64>| ts.map_or_else(|| format!("{GREY}--{RESET}"), format_timestamp);

    println!("{}• Tracked range:{}", CYAN, RESET);
    println!("    from: {}", fmt(first));
    println!("    to:   {}", fmt(last));

    //
    // 4) TOTAL TIME
    //
    let total: i64 = pool.conn.query_row(
        "SELECT COALESCE(SUM(duration), 0) FROM sessions",
        [],
        |row| row.get(0),
    )?;
    println!("{}• Total tracked:{} {}", CYAN, RESET, format_duration(total));

    println!();
    Ok(())
}
