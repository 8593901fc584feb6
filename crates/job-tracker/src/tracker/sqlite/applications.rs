use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{decode_date, decode_timestamp, encode_date, encode_timestamp};
use crate::tracker::domain::{ApplicationFields, ApplicationId, JobApplication};
use crate::tracker::repository::{StatusSummary, StoreError};
use crate::tracker::sort::SortSpec;

const COLUMNS: &str =
    "id, company_name, job_role, applied_date, url, status, notes, last_updated";

pub(super) fn insert(
    conn: &Connection,
    fields: &ApplicationFields,
    at: DateTime<Utc>,
) -> Result<JobApplication, StoreError> {
    conn.execute(
        "INSERT INTO job_applications
             (company_name, job_role, applied_date, url, status, notes, last_updated)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            fields.company_name,
            fields.job_role,
            encode_date(fields.applied_date),
            fields.url,
            fields.status,
            fields.notes,
            encode_timestamp(at),
        ],
    )?;

    Ok(JobApplication {
        id: ApplicationId(conn.last_insert_rowid()),
        company_name: fields.company_name.clone(),
        job_role: fields.job_role.clone(),
        applied_date: fields.applied_date,
        url: fields.url.clone(),
        status: fields.status.clone(),
        notes: fields.notes.clone(),
        last_updated: at,
    })
}

pub(super) fn fetch(
    conn: &Connection,
    id: ApplicationId,
) -> Result<Option<JobApplication>, StoreError> {
    let application = conn
        .query_row(
            &format!("SELECT {COLUMNS} FROM job_applications WHERE id = ?1"),
            params![id.0],
            map_row,
        )
        .optional()?;
    Ok(application)
}

pub(super) fn list(conn: &Connection, sort: SortSpec) -> Result<Vec<JobApplication>, StoreError> {
    // `order_by` only ever yields one of the fixed fragments in `SortSpec`.
    let sql = format!(
        "SELECT {COLUMNS} FROM job_applications ORDER BY {}",
        sort.order_by()
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], map_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub(super) fn current_status(
    conn: &Connection,
    id: ApplicationId,
) -> Result<Option<String>, StoreError> {
    let status = conn
        .query_row(
            "SELECT status FROM job_applications WHERE id = ?1",
            params![id.0],
            |row| row.get(0),
        )
        .optional()?;
    Ok(status)
}

pub(super) fn update(
    conn: &Connection,
    id: ApplicationId,
    fields: &ApplicationFields,
    at: DateTime<Utc>,
) -> Result<usize, StoreError> {
    let changed = conn.execute(
        "UPDATE job_applications
         SET company_name = ?1, job_role = ?2, applied_date = ?3,
             url = ?4, status = ?5, notes = ?6, last_updated = ?7
         WHERE id = ?8",
        params![
            fields.company_name,
            fields.job_role,
            encode_date(fields.applied_date),
            fields.url,
            fields.status,
            fields.notes,
            encode_timestamp(at),
            id.0,
        ],
    )?;
    Ok(changed)
}

/// History rows go with the application through `ON DELETE CASCADE`.
pub(super) fn delete(conn: &Connection, id: ApplicationId) -> Result<bool, StoreError> {
    let removed = conn.execute("DELETE FROM job_applications WHERE id = ?1", params![id.0])?;
    Ok(removed > 0)
}

/// Totals come from the same grouped read as the per-status counts so the two
/// always agree.
pub(super) fn summarize(conn: &Connection) -> Result<StatusSummary, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT status, COUNT(*) FROM job_applications GROUP BY status ORDER BY status",
    )?;
    let counts = stmt
        .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?
        .collect::<Result<Vec<_>, _>>()?;

    let mut summary = StatusSummary::default();
    for (status, count) in counts {
        let count = u64::try_from(count)
            .map_err(|_| StoreError::Corrupt(format!("negative count for status '{status}'")))?;
        summary.total += count;
        summary.by_status.insert(status, count);
    }
    Ok(summary)
}

fn map_row(row: &Row<'_>) -> rusqlite::Result<JobApplication> {
    let applied_date: String = row.get(3)?;
    let last_updated: String = row.get(7)?;

    Ok(JobApplication {
        id: ApplicationId(row.get(0)?),
        company_name: row.get(1)?,
        job_role: row.get(2)?,
        applied_date: decode_date(3, &applied_date)?,
        url: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
        status: row.get(5)?,
        notes: row.get::<_, Option<String>>(6)?.unwrap_or_default(),
        last_updated: decode_timestamp(7, &last_updated)?,
    })
}
