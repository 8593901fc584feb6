//! SQLite-backed application store and history recorder.
//!
//! Both components share one `Database` handle. Every operation borrows the
//! connection for the duration of a closure only, and writes that touch both
//! tables run inside a single transaction.

mod applications;
mod history;
mod schema;

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, Transaction};

use super::domain::{
    ApplicationFields, ApplicationId, JobApplication, StatusHistory, StatusHistoryEntry,
};
use super::repository::{
    ApplicationStore, HistoryRecorder, StatusSummary, StoreError, UpdateOutcome,
};
use super::sort::SortSpec;

const BUSY_TIMEOUT_MS: u32 = 5_000;

/// Owner of the single SQLite connection.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|err| StoreError::Unavailable(err.to_string()))?;
            }
        }

        let conn = Connection::open(path)?;
        let journal_mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        tracing::debug!(path = %path.display(), %journal_mode, "opened tracker database");
        Self::bootstrap(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::bootstrap(Connection::open_in_memory()?)
    }

    fn bootstrap(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(&format!(
            "PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = {BUSY_TIMEOUT_MS};"
        ))?;
        schema::apply(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Runs `f` with the connection held; the lock is released on every exit path.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Connection) -> Result<T, StoreError>,
    {
        let guard = self
            .conn
            .lock()
            .map_err(|_| StoreError::Unavailable("connection lock poisoned".to_string()))?;
        f(&guard)
    }

    /// Runs `f` inside a transaction that commits only if `f` succeeds.
    /// An error rolls the transaction back when it is dropped.
    pub fn with_transaction<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T, StoreError>,
    {
        let mut guard = self
            .conn
            .lock()
            .map_err(|_| StoreError::Unavailable("connection lock poisoned".to_string()))?;
        let tx = guard.transaction()?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }
}

/// Application store and history recorder over a shared `Database`.
#[derive(Clone)]
pub struct SqliteStore {
    db: Arc<Database>,
}

impl SqliteStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn open(path: &Path) -> Result<Self, StoreError> {
        Ok(Self::new(Arc::new(Database::open(path)?)))
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Ok(Self::new(Arc::new(Database::open_in_memory()?)))
    }

    pub fn database(&self) -> &Arc<Database> {
        &self.db
    }
}

impl ApplicationStore for SqliteStore {
    fn create(
        &self,
        fields: &ApplicationFields,
        at: DateTime<Utc>,
    ) -> Result<JobApplication, StoreError> {
        self.db.with_transaction(|tx| {
            let application = applications::insert(tx, fields, at)?;
            history::insert(tx, application.id, &application.status, at)?;
            Ok(application)
        })
    }

    fn fetch(&self, id: ApplicationId) -> Result<Option<JobApplication>, StoreError> {
        self.db.with_conn(|conn| applications::fetch(conn, id))
    }

    fn list(&self, sort: SortSpec) -> Result<Vec<JobApplication>, StoreError> {
        self.db.with_conn(|conn| applications::list(conn, sort))
    }

    fn update(
        &self,
        id: ApplicationId,
        fields: &ApplicationFields,
        at: DateTime<Utc>,
    ) -> Result<UpdateOutcome, StoreError> {
        self.db.with_transaction(|tx| {
            let Some(prior_status) = applications::current_status(tx, id)? else {
                return Ok(UpdateOutcome::Missing);
            };

            applications::update(tx, id, fields, at)?;

            let status_changed = prior_status != fields.status;
            if status_changed {
                history::insert(tx, id, &fields.status, at)?;
            }
            Ok(UpdateOutcome::Updated { status_changed })
        })
    }

    fn delete(&self, id: ApplicationId) -> Result<bool, StoreError> {
        self.db.with_conn(|conn| applications::delete(conn, id))
    }

    fn summarize(&self) -> Result<StatusSummary, StoreError> {
        self.db.with_conn(applications::summarize)
    }
}

impl HistoryRecorder for SqliteStore {
    fn record(
        &self,
        application_id: ApplicationId,
        status: &str,
        at: DateTime<Utc>,
    ) -> Result<StatusHistoryEntry, StoreError> {
        self.db
            .with_conn(|conn| history::insert(conn, application_id, status, at))
    }

    fn history_for(&self, application_id: ApplicationId) -> Result<StatusHistory, StoreError> {
        self.db.with_conn(|conn| {
            let entries = history::for_application(conn, application_id)?;
            Ok(entries.iter().map(StatusHistoryEntry::change).collect())
        })
    }

    fn histories_for(
        &self,
        ids: &[ApplicationId],
    ) -> Result<BTreeMap<ApplicationId, StatusHistory>, StoreError> {
        self.db.with_conn(|conn| history::grouped(conn, ids))
    }
}

pub(crate) fn encode_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Accepts RFC 3339 as written by this crate and `YYYY-MM-DD HH:MM:SS[.f]`
/// as written by SQLite's `CURRENT_TIMESTAMP`.
pub(crate) fn decode_timestamp(column: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f")
        .map(|naive| Utc.from_utc_datetime(&naive))
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(err)))
}

pub(crate) fn encode_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub(crate) fn decode_date(column: usize, raw: &str) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(err)))
}
