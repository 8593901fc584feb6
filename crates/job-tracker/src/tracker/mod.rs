//! Job application records, their status audit trail, and the HTTP surface over them.

pub mod clock;
pub mod domain;
pub mod repository;
pub mod router;
pub mod service;
pub mod sort;
pub mod sqlite;
pub mod validation;

#[cfg(test)]
mod tests;

pub use clock::{Clock, SystemClock};
pub use domain::{
    ApplicationDraft, ApplicationFields, ApplicationId, ApplicationWithHistory, JobApplication,
    StatusChange, StatusHistory, StatusHistoryEntry, KNOWN_STATUSES,
};
pub use repository::{
    ApplicationStore, HistoryRecorder, StatusSummary, StoreError, UpdateOutcome,
};
pub use router::{tracker_router, ListingView};
pub use service::{ApplicationService, ApplicationServiceError};
pub use sort::{SortField, SortOrder, SortParams, SortSpec};
pub use sqlite::{Database, SqliteStore};
pub use validation::{ValidationError, REQUIRED_FIELDS};
