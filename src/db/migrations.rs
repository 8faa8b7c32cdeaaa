use anyhow::{bail, Context, Result};
use rusqlite::Connection;

/// Schema scripts in order; the script at index `i` takes the history file
/// from `user_version = i` to `i + 1`.
const MIGRATIONS: &[(&str, &str)] = &[("schema_v1.sql", include_str!("schemas/schema_v1.sql"))];

fn schema_version(conn: &Connection) -> Result<usize> {
    let version: i64 = conn
        .pragma_query_value(None, "user_version", |row| row.get(0))
        .context("failed to read user_version pragma")?;
    usize::try_from(version).with_context(|| format!("negative schema version {version}"))
}

/// Brings the history file up to the newest schema in one transaction.
pub fn run_migrations(conn: &mut Connection) -> Result<()> {
    let current = schema_version(conn)?;
    let target = MIGRATIONS.len();

    if current > target {
        bail!("history database schema v{current} is newer than this build (v{target})");
    }
    if current == target {
        return Ok(());
    }

    let tx = conn
        .transaction()
        .context("failed to open migration transaction")?;
    for (index, (name, script)) in MIGRATIONS.iter().enumerate().skip(current) {
        tx.execute_batch(script)
            .with_context(|| format!("migration to v{} ({name}) failed", index + 1))?;
    }
    tx.pragma_update(None, "user_version", target as i64)
        .context("failed to update user_version pragma")?;
    tx.commit().context("failed to commit migrations")
}
