use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{
    ApplicationFields, ApplicationId, JobApplication, StatusHistory, StatusHistoryEntry,
};
use super::sort::SortSpec;

/// Durable CRUD for job applications.
///
/// Implementations must write the initial history entry together with the
/// application row, and the history entry for a status change together with
/// the update, so that neither can commit without the other.
pub trait ApplicationStore: Send + Sync {
    fn create(
        &self,
        fields: &ApplicationFields,
        at: DateTime<Utc>,
    ) -> Result<JobApplication, StoreError>;
    fn fetch(&self, id: ApplicationId) -> Result<Option<JobApplication>, StoreError>;
    fn list(&self, sort: SortSpec) -> Result<Vec<JobApplication>, StoreError>;
    fn update(
        &self,
        id: ApplicationId,
        fields: &ApplicationFields,
        at: DateTime<Utc>,
    ) -> Result<UpdateOutcome, StoreError>;
    /// Returns whether a row was removed.
    fn delete(&self, id: ApplicationId) -> Result<bool, StoreError>;
    fn summarize(&self) -> Result<StatusSummary, StoreError>;
}

/// Append-only audit log of status transitions.
pub trait HistoryRecorder: Send + Sync {
    fn record(
        &self,
        application_id: ApplicationId,
        status: &str,
        at: DateTime<Utc>,
    ) -> Result<StatusHistoryEntry, StoreError>;
    fn history_for(&self, application_id: ApplicationId) -> Result<StatusHistory, StoreError>;

    /// Histories for several applications. Ids without entries map to an empty history.
    fn histories_for(
        &self,
        ids: &[ApplicationId],
    ) -> Result<BTreeMap<ApplicationId, StatusHistory>, StoreError> {
        ids.iter()
            .map(|id| Ok((*id, self.history_for(*id)?)))
            .collect()
    }
}

/// Result of an update against the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    Updated { status_changed: bool },
    /// No row carried the id. Callers report this as success; see
    /// `ApplicationService::edit`.
    Missing,
}

/// Error enumeration for store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("constraint violated: {0}")]
    Constraint(String),
    #[error("stored value could not be decoded: {0}")]
    Corrupt(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(code, message)
                if code.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                StoreError::Constraint(message.unwrap_or_else(|| code.to_string()))
            }
            rusqlite::Error::FromSqlConversionFailure(_, _, source) => {
                StoreError::Corrupt(source.to_string())
            }
            invalid @ rusqlite::Error::InvalidColumnType(..) => {
                StoreError::Corrupt(invalid.to_string())
            }
            other => StoreError::Unavailable(other.to_string()),
        }
    }
}

/// Aggregate counts across all stored applications.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSummary {
    pub total: u64,
    pub by_status: BTreeMap<String, u64>,
}

impl StatusSummary {
    pub fn count_for(&self, status: &str) -> u64 {
        self.by_status.get(status).copied().unwrap_or(0)
    }
}
