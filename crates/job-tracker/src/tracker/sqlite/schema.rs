//! SQLite schema for the tracker.

use rusqlite::{params, Connection};

use super::{decode_timestamp, encode_timestamp};
use crate::tracker::repository::StoreError;

const SCHEMA: &str = r#"
-- ============================================
-- APPLICATIONS
-- ============================================

CREATE TABLE IF NOT EXISTS job_applications (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    company_name TEXT NOT NULL,
    job_role TEXT NOT NULL,
    applied_date TEXT NOT NULL,            -- YYYY-MM-DD
    url TEXT NOT NULL DEFAULT '',
    status TEXT NOT NULL,
    notes TEXT NOT NULL DEFAULT '',
    last_updated TEXT NOT NULL             -- RFC 3339, microseconds, UTC
);

-- ============================================
-- STATUS HISTORY
-- ============================================

-- Append-only; rows are never updated and go away with their application.
CREATE TABLE IF NOT EXISTS status_history (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    application_id INTEGER NOT NULL,
    status TEXT NOT NULL,
    changed_at TEXT NOT NULL,              -- RFC 3339, microseconds, UTC
    FOREIGN KEY(application_id) REFERENCES job_applications(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_status_history_application ON status_history(application_id);
"#;

/// Creates missing tables and brings databases written by older releases up to date.
pub(super) fn apply(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(SCHEMA)?;
    ensure_notes_column(conn)?;
    fill_missing_timestamps(conn)?;
    backfill_initial_history(conn)?;
    normalize_timestamps(conn)?;
    Ok(())
}

// Timestamp columns that hold RFC 3339 text once migration has run.
const TIMESTAMP_COLUMNS: [(&str, &str); 2] = [
    ("job_applications", "last_updated"),
    ("status_history", "changed_at"),
];

// Early databases predate the notes field.
fn ensure_notes_column(conn: &Connection) -> Result<(), StoreError> {
    let mut stmt = conn.prepare("PRAGMA table_info(job_applications)")?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<Result<Vec<_>, _>>()?;

    if !columns.iter().any(|column| column == "notes") {
        tracing::info!("adding notes column to job_applications");
        conn.execute_batch("ALTER TABLE job_applications ADD COLUMN notes TEXT NOT NULL DEFAULT ''")?;
    }
    Ok(())
}

// Older tables declared these columns nullable.
fn fill_missing_timestamps(conn: &Connection) -> Result<(), StoreError> {
    for (table, column) in TIMESTAMP_COLUMNS {
        let filled = conn.execute(
            &format!("UPDATE {table} SET {column} = CURRENT_TIMESTAMP WHERE {column} IS NULL"),
            [],
        )?;
        if filled > 0 {
            tracing::info!(table, column, filled, "stamped rows missing a timestamp");
        }
    }
    Ok(())
}

// Applications recorded before status tracking existed get their current status
// as the first history entry.
fn backfill_initial_history(conn: &Connection) -> Result<(), StoreError> {
    let inserted = conn.execute(
        "INSERT INTO status_history (application_id, status, changed_at)
         SELECT a.id, a.status, a.last_updated
         FROM job_applications a
         WHERE NOT EXISTS (SELECT 1 FROM status_history h WHERE h.application_id = a.id)",
        [],
    )?;
    if inserted > 0 {
        tracing::info!(inserted, "backfilled initial status history");
    }
    Ok(())
}

// Rewrites SQLite's `YYYY-MM-DD HH:MM:SS` text so that every stored timestamp
// orders lexically in time order. Values that cannot be parsed are left for
// the read path to report.
fn normalize_timestamps(conn: &Connection) -> Result<(), StoreError> {
    for (table, column) in TIMESTAMP_COLUMNS {
        let legacy = {
            let mut stmt = conn.prepare(&format!(
                "SELECT id, {column} FROM {table}
                 WHERE typeof({column}) = 'text' AND {column} NOT GLOB '????-??-??T*Z'"
            ))?;
            let rows = stmt
                .query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)))?
                .collect::<Result<Vec<_>, _>>()?;
            rows
        };

        let mut rewritten = 0usize;
        for (id, raw) in legacy {
            match decode_timestamp(1, &raw) {
                Ok(at) => {
                    rewritten += conn.execute(
                        &format!("UPDATE {table} SET {column} = ?1 WHERE id = ?2"),
                        params![encode_timestamp(at), id],
                    )?;
                }
                Err(err) => {
                    tracing::warn!(
                        table,
                        column,
                        id,
                        value = %raw,
                        error = %err,
                        "unreadable timestamp left in place"
                    );
                }
            }
        }
        if rewritten > 0 {
            tracing::info!(table, column, rewritten, "normalized legacy timestamps");
        }
    }
    Ok(())
}
