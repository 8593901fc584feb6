use std::sync::Arc;

use tracing::{debug, info, warn};

use super::clock::{Clock, SystemClock};
use super::domain::{
    ApplicationDraft, ApplicationId, ApplicationWithHistory, JobApplication, StatusHistory,
};
use super::repository::{
    ApplicationStore, HistoryRecorder, StatusSummary, StoreError, UpdateOutcome,
};
use super::sort::SortSpec;
use super::validation::ValidationError;

/// Service composing validation, the store, and the history recorder.
pub struct ApplicationService<S, C = SystemClock> {
    store: Arc<S>,
    clock: C,
}

impl<S> ApplicationService<S, SystemClock>
where
    S: ApplicationStore + HistoryRecorder + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self::with_clock(store, SystemClock)
    }
}

impl<S, C> ApplicationService<S, C>
where
    S: ApplicationStore + HistoryRecorder + 'static,
    C: Clock,
{
    pub fn with_clock(store: Arc<S>, clock: C) -> Self {
        Self { store, clock }
    }

    /// Validate and persist a new application together with its first history entry.
    pub fn add(&self, draft: ApplicationDraft) -> Result<JobApplication, ApplicationServiceError> {
        let fields = draft.validate()?;
        let application = self
            .store
            .create(&fields, self.clock.now())
            .map_err(log_store_failure("create"))?;

        info!(
            application_id = %application.id,
            status = %application.status,
            "application recorded"
        );
        Ok(application)
    }

    pub fn get(&self, id: ApplicationId) -> Result<JobApplication, ApplicationServiceError> {
        self.store
            .fetch(id)
            .map_err(log_store_failure("fetch"))?
            .ok_or(ApplicationServiceError::NotFound(id))
    }

    pub fn list(&self, sort: SortSpec) -> Result<Vec<JobApplication>, ApplicationServiceError> {
        let applications = self.store.list(sort).map_err(log_store_failure("list"))?;
        debug!(
            count = applications.len(),
            sort = sort.field.as_str(),
            order = sort.order.as_str(),
            "listed applications"
        );
        Ok(applications)
    }

    /// Listing where every record carries its status history, oldest entry first.
    pub fn list_with_history(
        &self,
        sort: SortSpec,
    ) -> Result<Vec<ApplicationWithHistory>, ApplicationServiceError> {
        let applications = self.list(sort)?;
        let ids: Vec<ApplicationId> = applications.iter().map(|app| app.id).collect();
        let mut histories = self
            .store
            .histories_for(&ids)
            .map_err(log_store_failure("history"))?;

        Ok(applications
            .into_iter()
            .map(|application| {
                let status_history = histories.remove(&application.id).unwrap_or_default();
                ApplicationWithHistory {
                    application,
                    status_history,
                }
            })
            .collect())
    }

    /// Validate and apply an edit, appending history only when the status changes.
    ///
    /// Editing an id that does not exist succeeds without writing anything. This
    /// keeps the behavior clients of the tracker already rely on; revisit if a
    /// caller needs to distinguish the two cases.
    pub fn edit(
        &self,
        id: ApplicationId,
        draft: ApplicationDraft,
    ) -> Result<UpdateOutcome, ApplicationServiceError> {
        let fields = draft.validate()?;
        let outcome = self
            .store
            .update(id, &fields, self.clock.now())
            .map_err(log_store_failure("update"))?;

        match outcome {
            UpdateOutcome::Updated { status_changed } => info!(
                application_id = %id,
                status = %fields.status,
                status_changed,
                "application updated"
            ),
            UpdateOutcome::Missing => {
                debug!(application_id = %id, "edit targeted missing application")
            }
        }
        Ok(outcome)
    }

    /// Remove an application and its history. Removing a missing id is not an error.
    pub fn remove(&self, id: ApplicationId) -> Result<bool, ApplicationServiceError> {
        let removed = self
            .store
            .delete(id)
            .map_err(log_store_failure("delete"))?;
        info!(application_id = %id, removed, "application deleted");
        Ok(removed)
    }

    pub fn history(&self, id: ApplicationId) -> Result<StatusHistory, ApplicationServiceError> {
        // Distinguish "no such application" from an empty trail.
        self.get(id)?;
        Ok(self
            .store
            .history_for(id)
            .map_err(log_store_failure("history"))?)
    }

    pub fn summary(&self) -> Result<StatusSummary, ApplicationServiceError> {
        Ok(self
            .store
            .summarize()
            .map_err(log_store_failure("summary"))?)
    }
}

fn log_store_failure(operation: &'static str) -> impl Fn(StoreError) -> StoreError {
    move |err| {
        warn!(operation, error = %err, "store operation failed");
        err
    }
}

/// Error raised by the application service.
#[derive(Debug, thiserror::Error)]
pub enum ApplicationServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("application {0} not found")]
    NotFound(ApplicationId),
    #[error(transparent)]
    Store(#[from] StoreError),
}
