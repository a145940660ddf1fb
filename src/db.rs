// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use once_cell::sync::Lazy;
use rusqlite::Connection;
use std::fs;
use std::path::PathBuf;

static APP: Lazy<(&str, &str, &str)> =
    Lazy::new(|| ("com.alphavelocity", "Moneyrail", "moneyrail"));

/// `MONEYRAIL_DB` overrides the platform data dir.
pub const DB_ENV: &str = "MONEYRAIL_DB";

pub fn db_path() -> Result<PathBuf> {
    if let Some(custom) = std::env::var_os(DB_ENV) {
        return Ok(PathBuf::from(custom));
    }
    let proj = ProjectDirs::from(APP.0, APP.1, APP.2)
        .context("Could not determine platform-specific data dir")?;
    let data_dir = proj.data_dir();
    fs::create_dir_all(data_dir).context("Failed to create data dir")?;
    Ok(data_dir.join("moneyrail.sqlite"))
}

pub fn open_or_init() -> Result<Connection> {
    let path = db_path()?;
    let conn =
        Connection::open(&path).with_context(|| format!("Open DB at {}", path.display()))?;
    init_schema(&conn)?;
    tracing::debug!(path = %path.display(), "database ready");
    Ok(conn)
}

/// Money columns are TEXT so decimals round-trip exactly; NULL limit
/// columns mean "no limit".
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS settings(
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS accounts(
        kind TEXT NOT NULL CHECK(kind IN ('bank','vault','ewallet','prepaid','credit')),
        id TEXT NOT NULL,
        display_name TEXT NOT NULL,
        stored_balance TEXT NOT NULL DEFAULT '0',
        is_active INTEGER NOT NULL DEFAULT 1,
        max_capacity TEXT,
        min_balance TEXT,
        daily_withdrawal_limit TEXT,
        withdrawn_today TEXT NOT NULL DEFAULT '0',
        daily_limit TEXT,
        daily_used TEXT NOT NULL DEFAULT '0',
        monthly_limit TEXT,
        monthly_used TEXT NOT NULL DEFAULT '0',
        transaction_limit TEXT,
        credit_limit TEXT,
        current_balance TEXT NOT NULL DEFAULT '0',
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        PRIMARY KEY(kind, id)
    );

    CREATE TABLE IF NOT EXISTS ledger_entries(
        id INTEGER PRIMARY KEY,
        kind TEXT NOT NULL CHECK(kind IN ('deposit','withdrawal','payment','transfer')),
        source_ref TEXT,
        destination_ref TEXT,
        amount TEXT NOT NULL,
        fee TEXT NOT NULL,
        commission TEXT NOT NULL,
        total_debited TEXT NOT NULL,
        total_credited TEXT NOT NULL,
        source_balance_after TEXT,
        destination_balance_after TEXT,
        timestamp TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT ''
    );
    CREATE INDEX IF NOT EXISTS idx_ledger_timestamp ON ledger_entries(timestamp);
    CREATE INDEX IF NOT EXISTS idx_ledger_source ON ledger_entries(source_ref);
    CREATE INDEX IF NOT EXISTS idx_ledger_destination ON ledger_entries(destination_ref);

    CREATE TRIGGER IF NOT EXISTS ledger_entries_no_update
    BEFORE UPDATE ON ledger_entries
    BEGIN
        SELECT RAISE(ABORT, 'ledger entries are append-only');
    END;

    CREATE TRIGGER IF NOT EXISTS ledger_entries_no_delete
    BEFORE DELETE ON ledger_entries
    BEGIN
        SELECT RAISE(ABORT, 'ledger entries are append-only');
    END;
    "#,
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap();
    }

    #[test]
    fn ledger_rows_cannot_be_changed() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn.execute(
            "INSERT INTO ledger_entries(id, kind, amount, fee, commission, total_debited, total_credited, timestamp)
             VALUES (1, 'deposit', '1.00', '0.00', '0.00', '1.00', '1.00', '2025-01-01T00:00:00+00:00')",
            [],
        )
        .unwrap();
        let err = conn
            .execute("UPDATE ledger_entries SET amount='2.00' WHERE id=1", [])
            .unwrap_err();
        assert!(err.to_string().contains("append-only"));
        assert!(conn.execute("DELETE FROM ledger_entries", []).is_err());
    }
}
