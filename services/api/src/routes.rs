use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json, Router};
use job_tracker::auth::{auth_router, protect, AuthState};
use job_tracker::tracker::{
    tracker_router, ApplicationService, ApplicationStore, Clock, HistoryRecorder,
};
use serde_json::json;
use std::sync::Arc;

/// Full HTTP surface: tracker and metrics behind the session gate, login and
/// health checks in front of it.
pub(crate) fn with_application_routes<S, C>(
    service: Arc<ApplicationService<S, C>>,
    auth: Arc<AuthState>,
    state: AppState,
) -> Router
where
    S: ApplicationStore + HistoryRecorder + 'static,
    C: Clock + 'static,
{
    let gated = tracker_router(service).route("/metrics", get(metrics_endpoint));
    let operational = Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint));

    protect(gated, Arc::clone(&auth))
        .merge(auth_router(auth))
        .merge(operational)
        .layer(Extension(state))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
