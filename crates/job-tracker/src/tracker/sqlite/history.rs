use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};

use super::{decode_timestamp, encode_timestamp};
use crate::tracker::domain::{ApplicationId, StatusHistory, StatusHistoryEntry};
use crate::tracker::repository::StoreError;

pub(super) fn insert(
    conn: &Connection,
    application_id: ApplicationId,
    status: &str,
    at: DateTime<Utc>,
) -> Result<StatusHistoryEntry, StoreError> {
    conn.execute(
        "INSERT INTO status_history (application_id, status, changed_at) VALUES (?1, ?2, ?3)",
        params![application_id.0, status, encode_timestamp(at)],
    )?;

    Ok(StatusHistoryEntry {
        id: conn.last_insert_rowid(),
        application_id,
        status: status.to_string(),
        changed_at: at,
    })
}

pub(super) fn for_application(
    conn: &Connection,
    application_id: ApplicationId,
) -> Result<Vec<StatusHistoryEntry>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT id, application_id, status, changed_at
         FROM status_history
         WHERE application_id = ?1
         ORDER BY changed_at ASC, id ASC",
    )?;
    let entries = stmt
        .query_map(params![application_id.0], map_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(entries)
}

/// One pass over the history table, keeping only the requested applications.
pub(super) fn grouped(
    conn: &Connection,
    ids: &[ApplicationId],
) -> Result<BTreeMap<ApplicationId, StatusHistory>, StoreError> {
    let mut changes: BTreeMap<ApplicationId, Vec<_>> =
        ids.iter().map(|id| (*id, Vec::new())).collect();

    let mut stmt = conn.prepare(
        "SELECT id, application_id, status, changed_at
         FROM status_history
         ORDER BY application_id ASC, changed_at ASC, id ASC",
    )?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let entry = map_row(row)?;
        if let Some(bucket) = changes.get_mut(&entry.application_id) {
            bucket.push(entry.change());
        }
    }

    Ok(changes
        .into_iter()
        .map(|(id, changes)| (id, StatusHistory::new(changes)))
        .collect())
}

fn map_row(row: &Row<'_>) -> rusqlite::Result<StatusHistoryEntry> {
    let changed_at: String = row.get(3)?;
    Ok(StatusHistoryEntry {
        id: row.get(0)?,
        application_id: ApplicationId(row.get(1)?),
        status: row.get(2)?,
        changed_at: decode_timestamp(3, &changed_at)?,
    })
}
