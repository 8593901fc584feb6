use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use serde_json::json;

use super::clock::Clock;
use super::domain::{ApplicationDraft, ApplicationId, ApplicationWithHistory, KNOWN_STATUSES};
use super::repository::{ApplicationStore, HistoryRecorder};
use super::service::{ApplicationService, ApplicationServiceError};
use super::sort::{SortField, SortOrder, SortParams};
use super::validation::{ValidationError, REQUIRED_FIELDS};

/// Router builder exposing the tracker's listing, CRUD, and statistics endpoints.
pub fn tracker_router<S, C>(service: Arc<ApplicationService<S, C>>) -> Router
where
    S: ApplicationStore + HistoryRecorder + 'static,
    C: Clock + 'static,
{
    Router::new()
        .route("/", get(index_handler::<S, C>))
        .route("/add", get(add_form_handler).post(add_handler::<S, C>))
        .route(
            "/edit/:application_id",
            get(edit_form_handler::<S, C>).post(edit_handler::<S, C>),
        )
        .route("/delete/:application_id", post(delete_handler::<S, C>))
        .route("/api/applications", get(list_handler::<S, C>))
        .route(
            "/api/applications/history",
            get(list_with_history_handler::<S, C>),
        )
        .route(
            "/api/applications/:application_id/history",
            get(history_handler::<S, C>),
        )
        .route("/api/summary", get(summary_handler::<S, C>))
        .with_state(service)
}

/// View model behind the main listing.
#[derive(Debug, Serialize)]
pub struct ListingView {
    pub applications: Vec<ApplicationWithHistory>,
    pub current_sort: SortField,
    pub current_order: SortOrder,
}

pub(crate) async fn index_handler<S, C>(
    State(service): State<Arc<ApplicationService<S, C>>>,
    Query(params): Query<Vec<(String, String)>>,
) -> Response
where
    S: ApplicationStore + HistoryRecorder + 'static,
    C: Clock + 'static,
{
    let sort = SortParams::from_pairs(&params).spec();
    match service.list_with_history(sort) {
        Ok(applications) => {
            let view = ListingView {
                applications,
                current_sort: sort.field,
                current_order: sort.order,
            };
            (StatusCode::OK, axum::Json(view)).into_response()
        }
        Err(other) => error_response(other),
    }
}

/// Form metadata: the fields a new application needs and the statuses offered.
pub(crate) async fn add_form_handler() -> Response {
    let payload = json!({
        "required_fields": REQUIRED_FIELDS,
        "statuses": KNOWN_STATUSES,
    });
    (StatusCode::OK, axum::Json(payload)).into_response()
}

pub(crate) async fn add_handler<S, C>(
    State(service): State<Arc<ApplicationService<S, C>>>,
    payload: Result<axum::Json<ApplicationDraft>, JsonRejection>,
) -> Response
where
    S: ApplicationStore + HistoryRecorder + 'static,
    C: Clock + 'static,
{
    let draft = match payload {
        Ok(axum::Json(draft)) => draft,
        Err(rejection) => return rejection_response(rejection),
    };
    match service.add(draft) {
        Ok(application) => {
            let payload = json!({
                "success": true,
                "message": "Job application added successfully",
                "id": application.id,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(other) => error_response(other),
    }
}

pub(crate) async fn edit_form_handler<S, C>(
    State(service): State<Arc<ApplicationService<S, C>>>,
    Path(application_id): Path<i64>,
) -> Response
where
    S: ApplicationStore + HistoryRecorder + 'static,
    C: Clock + 'static,
{
    match service.get(ApplicationId(application_id)) {
        Ok(application) => (StatusCode::OK, axum::Json(application)).into_response(),
        Err(ApplicationServiceError::NotFound(_)) => Redirect::to("/").into_response(),
        Err(other) => error_response(other),
    }
}

pub(crate) async fn edit_handler<S, C>(
    State(service): State<Arc<ApplicationService<S, C>>>,
    Path(application_id): Path<i64>,
    payload: Result<axum::Json<ApplicationDraft>, JsonRejection>,
) -> Response
where
    S: ApplicationStore + HistoryRecorder + 'static,
    C: Clock + 'static,
{
    let draft = match payload {
        Ok(axum::Json(draft)) => draft,
        Err(rejection) => return rejection_response(rejection),
    };
    match service.edit(ApplicationId(application_id), draft) {
        Ok(_) => {
            let payload = json!({
                "success": true,
                "message": "Job application updated successfully",
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(other) => error_response(other),
    }
}

pub(crate) async fn delete_handler<S, C>(
    State(service): State<Arc<ApplicationService<S, C>>>,
    Path(application_id): Path<i64>,
) -> Response
where
    S: ApplicationStore + HistoryRecorder + 'static,
    C: Clock + 'static,
{
    match service.remove(ApplicationId(application_id)) {
        Ok(_) => {
            let payload = json!({
                "success": true,
                "message": "Job application deleted successfully",
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(other) => error_response(other),
    }
}

pub(crate) async fn list_handler<S, C>(
    State(service): State<Arc<ApplicationService<S, C>>>,
    Query(params): Query<Vec<(String, String)>>,
) -> Response
where
    S: ApplicationStore + HistoryRecorder + 'static,
    C: Clock + 'static,
{
    match service.list(SortParams::from_pairs(&params).spec()) {
        Ok(applications) => (StatusCode::OK, axum::Json(applications)).into_response(),
        Err(other) => error_response(other),
    }
}

pub(crate) async fn list_with_history_handler<S, C>(
    State(service): State<Arc<ApplicationService<S, C>>>,
    Query(params): Query<Vec<(String, String)>>,
) -> Response
where
    S: ApplicationStore + HistoryRecorder + 'static,
    C: Clock + 'static,
{
    match service.list_with_history(SortParams::from_pairs(&params).spec()) {
        Ok(applications) => (StatusCode::OK, axum::Json(applications)).into_response(),
        Err(other) => error_response(other),
    }
}

pub(crate) async fn history_handler<S, C>(
    State(service): State<Arc<ApplicationService<S, C>>>,
    Path(application_id): Path<i64>,
) -> Response
where
    S: ApplicationStore + HistoryRecorder + 'static,
    C: Clock + 'static,
{
    let id = ApplicationId(application_id);
    match service.history(id) {
        Ok(status_history) => {
            let payload = json!({
                "application_id": id,
                "status_history": status_history,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(other) => error_response(other),
    }
}

pub(crate) async fn summary_handler<S, C>(
    State(service): State<Arc<ApplicationService<S, C>>>,
) -> Response
where
    S: ApplicationStore + HistoryRecorder + 'static,
    C: Clock + 'static,
{
    match service.summary() {
        Ok(summary) => (StatusCode::OK, axum::Json(summary)).into_response(),
        Err(other) => error_response(other),
    }
}

/// Bodies that never reach validation still get the tracker's error envelope.
fn rejection_response(rejection: JsonRejection) -> Response {
    let payload = json!({
        "success": false,
        "message": rejection.body_text(),
    });
    (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response()
}

fn error_response(error: ApplicationServiceError) -> Response {
    match error {
        ApplicationServiceError::Validation(error) => {
            let key = match error {
                ValidationError::MissingFields(_) => "missing_fields",
                ValidationError::InvalidDate { .. } => "invalid_fields",
            };
            let mut payload = json!({
                "success": false,
                "message": error.to_string(),
            });
            payload[key] = json!(error.fields());
            (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response()
        }
        ApplicationServiceError::NotFound(id) => {
            let payload = json!({
                "success": false,
                "message": format!("application {id} not found"),
            });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        ApplicationServiceError::Store(error) => {
            let payload = json!({
                "success": false,
                "message": error.to_string(),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}
