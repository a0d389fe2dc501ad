//! Store schema creation and updates.
use log::info;
use rusqlite::Connection;

use crate::error::Error;

/// Current schema version
const SCHEMA_VERSION: i32 = 1;

/// Bring the schema of `conn` up to date.
pub fn run_migrations(conn: &Connection) -> Result<(), Error> {
    let current_version = get_schema_version(conn)?;

    if current_version < 1 {
        migrate_v1(conn)?;
    }

    Ok(())
}

/// 0 when the store is blank.
fn get_schema_version(conn: &Connection) -> Result<i32, Error> {
    let table_exists: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name='schema_version'",
        [],
        |row| row.get(0),
    )?;

    if !table_exists {
        return Ok(0);
    }

    let version: Option<i32> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| {
            row.get(0)
        })?;

    Ok(version.unwrap_or(0))
}

fn migrate_v1(conn: &Connection) -> Result<(), Error> {
    info!("creating store schema v{}", SCHEMA_VERSION);

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        );

        CREATE TABLE IF NOT EXISTS recordings (
            reco_id TEXT PRIMARY KEY NOT NULL,
            wav TEXT NOT NULL,
            corpus TEXT,
            duration REAL
        );

        CREATE TABLE IF NOT EXISTS speakers (
            spk_id TEXT PRIMARY KEY NOT NULL,
            gender TEXT,
            cmvn TEXT
        );

        CREATE TABLE IF NOT EXISTS sentences (
            sent_id TEXT PRIMARY KEY NOT NULL,
            text TEXT NOT NULL,
            length INTEGER NOT NULL
        );

        -- parents can not be deleted while utterances reference them
        CREATE TABLE IF NOT EXISTS utterances (
            utt_id TEXT PRIMARY KEY NOT NULL,
            reco_id TEXT NOT NULL REFERENCES recordings(reco_id) ON DELETE RESTRICT,
            spk_id TEXT NOT NULL REFERENCES speakers(spk_id) ON DELETE RESTRICT,
            sent_id TEXT NOT NULL REFERENCES sentences(sent_id) ON DELETE RESTRICT,
            feat TEXT,
            duration REAL,
            start_time REAL,
            end_time REAL,
            is_segment INTEGER NOT NULL DEFAULT 0
        );

        CREATE INDEX IF NOT EXISTS idx_utterances_reco ON utterances(reco_id);
        CREATE INDEX IF NOT EXISTS idx_utterances_spk ON utterances(spk_id);
        CREATE INDEX IF NOT EXISTS idx_utterances_sent ON utterances(sent_id);

        INSERT INTO schema_version (version) VALUES (1);
        "#,
    )?;

    Ok(())
}
