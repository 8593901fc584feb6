use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use axum::response::Response;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::Value;

use crate::tracker::clock::Clock;
use crate::tracker::domain::{
    ApplicationDraft, ApplicationFields, ApplicationId, JobApplication, StatusHistory,
    StatusHistoryEntry,
};
use crate::tracker::repository::{
    ApplicationStore, HistoryRecorder, StatusSummary, StoreError, UpdateOutcome,
};
use crate::tracker::service::ApplicationService;
use crate::tracker::sort::SortSpec;
use crate::tracker::sqlite::SqliteStore;

pub(super) fn draft(company: &str, role: &str, applied_date: &str, status: &str) -> ApplicationDraft {
    ApplicationDraft {
        company_name: Some(company.to_string()),
        job_role: Some(role.to_string()),
        applied_date: Some(applied_date.to_string()),
        url: None,
        status: Some(status.to_string()),
        notes: None,
    }
}

pub(super) fn acme_draft() -> ApplicationDraft {
    draft("Acme", "Engineer", "2024-01-15", "Applied")
}

pub(super) fn acme_with_status(status: &str) -> ApplicationDraft {
    draft("Acme", "Engineer", "2024-01-15", status)
}

/// Four applications whose applied dates are distinct and not in insertion order.
pub(super) fn four_drafts() -> Vec<ApplicationDraft> {
    vec![
        draft("Globex", "Analyst", "2024-03-02", "Applied"),
        draft("Initech", "Developer", "2024-01-20", "Interview 1"),
        draft("Umbrella", "Researcher", "2024-04-11", "Offer"),
        draft("Hooli", "SRE", "2024-02-07", "Applied"),
    ]
}

pub(super) fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap()
}

/// Clock that advances by one second on every reading.
#[derive(Default)]
pub(super) struct StepClock {
    ticks: AtomicI64,
}

impl Clock for StepClock {
    fn now(&self) -> DateTime<Utc> {
        let tick = self.ticks.fetch_add(1, Ordering::SeqCst);
        epoch() + Duration::seconds(tick)
    }
}

/// Clock that never moves, for same-instant ordering checks.
pub(super) struct FrozenClock;

impl Clock for FrozenClock {
    fn now(&self) -> DateTime<Utc> {
        epoch()
    }
}

pub(super) type TestService = ApplicationService<SqliteStore, StepClock>;

pub(super) fn build_service() -> Arc<TestService> {
    let store = SqliteStore::open_in_memory().expect("in-memory store");
    Arc::new(ApplicationService::with_clock(
        Arc::new(store),
        StepClock::default(),
    ))
}

pub(super) fn seed_four(service: &TestService) -> Vec<JobApplication> {
    four_drafts()
        .into_iter()
        .map(|draft| service.add(draft).expect("seed application"))
        .collect()
}

pub(super) fn companies(applications: &[JobApplication]) -> Vec<&str> {
    applications
        .iter()
        .map(|application| application.company_name.as_str())
        .collect()
}

pub(super) struct UnavailableStore;

fn offline() -> StoreError {
    StoreError::Unavailable("database offline".to_string())
}

impl ApplicationStore for UnavailableStore {
    fn create(
        &self,
        _fields: &ApplicationFields,
        _at: DateTime<Utc>,
    ) -> Result<JobApplication, StoreError> {
        Err(offline())
    }

    fn fetch(&self, _id: ApplicationId) -> Result<Option<JobApplication>, StoreError> {
        Err(offline())
    }

    fn list(&self, _sort: SortSpec) -> Result<Vec<JobApplication>, StoreError> {
        Err(offline())
    }

    fn update(
        &self,
        _id: ApplicationId,
        _fields: &ApplicationFields,
        _at: DateTime<Utc>,
    ) -> Result<UpdateOutcome, StoreError> {
        Err(offline())
    }

    fn delete(&self, _id: ApplicationId) -> Result<bool, StoreError> {
        Err(offline())
    }

    fn summarize(&self) -> Result<StatusSummary, StoreError> {
        Err(offline())
    }
}

impl HistoryRecorder for UnavailableStore {
    fn record(
        &self,
        _application_id: ApplicationId,
        _status: &str,
        _at: DateTime<Utc>,
    ) -> Result<StatusHistoryEntry, StoreError> {
        Err(offline())
    }

    fn history_for(&self, _application_id: ApplicationId) -> Result<StatusHistory, StoreError> {
        Err(offline())
    }
}

pub(super) fn unavailable_service() -> Arc<ApplicationService<UnavailableStore, StepClock>> {
    Arc::new(ApplicationService::with_clock(
        Arc::new(UnavailableStore),
        StepClock::default(),
    ))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
