use crate::cli::parser::Commands;
use crate::config::Config;
use crate::db::pool::DbPool;
use crate::db::stats::{query_app_breakdown, query_session_summary};
use crate::errors::AppResult;
use crate::models::client::ClientName;
use crate::ui::messages::info;
use crate::utils::formatting::{bold, format_duration, format_timestamp};
use crate::utils::table::{Column, Table};

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Stats { client, limit } = cmd {
        // Validate before looking at the database
        let client = client.as_deref().map(ClientName::parse).transpose()?;

        if !DbPool::exists(&cfg.database) {
            info("No time tracking data");
            return Ok(());
        }
        let pool = DbPool::open_existing(&cfg.database)?;

        let rows = query_session_summary(&pool.conn, client.as_ref().map(|c| c.as_str()))?;
        if rows.is_empty() {
            info("No sessions recorded yet");
            return Ok(());
        }

        println!("{}", bold("📊 TIME TRACKING STATISTICS"));
        println!("{}\n", "━".repeat(60));

        let mut table = Table::new(vec![
            Column::left("CLIENT", 15),
            Column::right("SESSIONS", 10),
            Column::right("TOTAL TIME", 15),
            Column::right("AVG SESSION", 15),
            Column::right("LAST FOCUSED", 20),
        ]);
        for row in &rows {
            table.add_row(vec![
                row.client.clone(),
                row.session_count.to_string(),
                format_duration(row.total_seconds),
                format_duration(row.avg_seconds),
                row.last_start
                    .map(format_timestamp)
                    .unwrap_or_else(|| "N/A".to_string()),
            ]);
        }
        print!("{}", table.render());

        //
        // Application breakdown, only for a single client
        //
        if let Some(client) = client {
            println!();
            println!("{}", bold(&format!("📱 APPLICATION USAGE: {}", client)));

            let apps = query_app_breakdown(&pool.conn, client.as_str(), *limit)?;
            if apps.is_empty() {
                info(format!("No application usage data for {}", client));
                return Ok(());
            }

            let mut table = Table::new(vec![
                Column::left("APPLICATION", 50),
                Column::right("TIME", 15),
            ]);
            for app in apps {
                table.add_row(vec![app.app_name, format_duration(app.total_seconds)]);
            }
            print!("{}", table.render());
        }
    }

    Ok(())
}
