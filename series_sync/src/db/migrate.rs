//! Embedded schema migrations.

use anyhow::anyhow;
use diesel::{Connection, SqliteConnection, connection::SimpleConnection};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};

use super::connection::sqlite_path;

/// Embedded Diesel migrations bundled with this crate.
///
/// Creates the overview, daily/intraday bar, and weekly/monthly/yearly
/// average tables.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Runs pending Diesel migrations on a SQLite database at the given path.
///
/// Switches the file to WAL first; the journal mode sticks to the file.
pub fn run_sqlite(path: &str) -> anyhow::Result<()> {
    let mut conn = SqliteConnection::establish(path)?;
    conn.batch_execute("PRAGMA journal_mode=WAL;")?;
    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|e| anyhow!(e))?;

    Ok(())
}

/// Runs pending migrations for a `DATABASE_URL`.
///
/// Accepts `sqlite://path`, `sqlite:path`, or a bare file path. Other
/// schemes are rejected.
pub fn run_all(database_url: &str) -> anyhow::Result<()> {
    if database_url.contains("://") && !database_url.starts_with("sqlite://") {
        anyhow::bail!("Unsupported DATABASE_URL: {database_url}");
    }
    run_sqlite(sqlite_path(database_url))
}
