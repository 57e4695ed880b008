pub mod migrations;
pub mod queries;

use std::time::Duration;

use anyhow::Context;
use rusqlite::Connection;

/// Opens the appointment store and applies pending migrations. `:memory:`
/// gives a private throwaway database.
pub fn init_db(path: &str) -> anyhow::Result<Connection> {
    let conn = if path == ":memory:" {
        Connection::open_in_memory()
    } else {
        Connection::open(path)
    }
    .with_context(|| format!("failed to open database {path}"))?;

    conn.busy_timeout(Duration::from_secs(5))
        .context("failed to set busy timeout")?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
        .context("failed to set database pragmas")?;

    migrations::run_migrations(&conn)?;
    tracing::debug!(path = %path, "database ready");

    Ok(conn)
}
