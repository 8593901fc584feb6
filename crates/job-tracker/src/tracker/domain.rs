use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Statuses offered by the tracker's forms. The store accepts any non-empty status.
pub const KNOWN_STATUSES: [&str; 7] = [
    "Applied",
    "Interview 1",
    "Interview 2",
    "Interview 3",
    "Offer",
    "Denied without interview (visa related)",
    "Denied without interview (non-visa related)",
];

/// Identifier assigned by the store when an application is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplicationId(pub i64);

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Raw create/edit payload as received from a client. Nothing here is trusted yet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationDraft {
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub job_role: Option<String>,
    #[serde(default)]
    pub applied_date: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Field set that passed validation and can be written to the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplicationFields {
    pub company_name: String,
    pub job_role: String,
    pub applied_date: NaiveDate,
    pub url: String,
    pub status: String,
    pub notes: String,
}

/// A persisted job application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobApplication {
    pub id: ApplicationId,
    pub company_name: String,
    pub job_role: String,
    pub applied_date: NaiveDate,
    pub url: String,
    pub status: String,
    pub notes: String,
    pub last_updated: DateTime<Utc>,
}

/// One row of the status audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusHistoryEntry {
    pub id: i64,
    pub application_id: ApplicationId,
    pub status: String,
    pub changed_at: DateTime<Utc>,
}

impl StatusHistoryEntry {
    pub fn change(&self) -> StatusChange {
        StatusChange {
            status: self.status.clone(),
            changed_at: self.changed_at,
        }
    }
}

/// `(status, changed_at)` pair exposed to API consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    pub status: String,
    pub changed_at: DateTime<Utc>,
}

/// Ordered status history for a single application, oldest first.
///
/// The entries are loaded eagerly so the store handle is released before the
/// caller starts iterating; `iter` can be called any number of times.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct StatusHistory {
    changes: Vec<StatusChange>,
}

impl StatusHistory {
    pub fn new(changes: Vec<StatusChange>) -> Self {
        Self { changes }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, StatusChange> {
        self.changes.iter()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn first(&self) -> Option<&StatusChange> {
        self.changes.first()
    }

    pub fn latest(&self) -> Option<&StatusChange> {
        self.changes.last()
    }
}

impl<'a> IntoIterator for &'a StatusHistory {
    type Item = &'a StatusChange;
    type IntoIter = std::slice::Iter<'a, StatusChange>;

    fn into_iter(self) -> Self::IntoIter {
        self.changes.iter()
    }
}

impl IntoIterator for StatusHistory {
    type Item = StatusChange;
    type IntoIter = std::vec::IntoIter<StatusChange>;

    fn into_iter(self) -> Self::IntoIter {
        self.changes.into_iter()
    }
}

impl FromIterator<StatusChange> for StatusHistory {
    fn from_iter<I: IntoIterator<Item = StatusChange>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Listing row enriched with its audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplicationWithHistory {
    #[serde(flatten)]
    pub application: JobApplication,
    pub status_history: StatusHistory,
}
