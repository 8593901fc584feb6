use super::common::*;
use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use crate::tracker::router::{
    add_handler, delete_handler, edit_form_handler, history_handler, index_handler,
    summary_handler,
};
use crate::tracker::{tracker_router, KNOWN_STATUSES};

fn json_post(uri: &str, payload: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(payload.to_string()))
        .expect("request")
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

#[tokio::test]
async fn add_handler_reports_every_missing_field() {
    let service = build_service();
    let response = add_handler::<_, StepClock>(
        State(service),
        Ok(axum::Json(crate::tracker::ApplicationDraft {
            job_role: Some("Engineer".to_string()),
            applied_date: Some("2024-01-15".to_string()),
            ..Default::default()
        })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json_body(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["missing_fields"], json!(["company_name", "status"]));
    assert_eq!(
        body["message"],
        "Missing required fields: company_name, status"
    );
}

#[tokio::test]
async fn add_handler_rejects_malformed_dates() {
    let service = build_service();
    let mut draft = acme_draft();
    draft.applied_date = Some("January 15".to_string());

    let response = add_handler::<_, StepClock>(State(service), Ok(axum::Json(draft))).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json_body(response).await;
    assert_eq!(body["invalid_fields"], json!(["applied_date"]));
}

#[tokio::test]
async fn add_handler_returns_internal_error_when_store_is_down() {
    let response =
        add_handler::<_, StepClock>(State(unavailable_service()), Ok(axum::Json(acme_draft())))
            .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = read_json_body(response).await;
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn edit_form_redirects_home_for_missing_application() {
    let response = edit_form_handler::<_, StepClock>(State(build_service()), Path(99)).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers().get(header::LOCATION).expect("location"),
        "/"
    );
}

#[tokio::test]
async fn delete_handler_succeeds_for_unknown_id() {
    let response = delete_handler::<_, StepClock>(State(build_service()), Path(1)).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn history_handler_returns_not_found_for_missing_application() {
    let response = history_handler::<_, StepClock>(State(build_service()), Path(7)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn index_handler_echoes_effective_sort() {
    let service = build_service();
    seed_four(&service);

    let response = index_handler::<_, StepClock>(
        State(service),
        Query(vec![
            (
                "sort".to_string(),
                "company_name; DROP TABLE job_applications".to_string(),
            ),
            ("order".to_string(), "asc".to_string()),
        ]),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["current_sort"], "applied_date");
    assert_eq!(body["current_order"], "asc");
    let applications = body["applications"].as_array().expect("applications");
    assert_eq!(applications.len(), 4);
    assert_eq!(applications[0]["company_name"], "Initech");
    assert_eq!(
        applications[0]["status_history"][0]["status"],
        "Interview 1"
    );
}

#[tokio::test]
async fn summary_handler_counts_by_status() {
    let service = build_service();
    seed_four(&service);

    let response = summary_handler::<_, StepClock>(State(service)).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["total"], 4);
    assert_eq!(body["by_status"]["Applied"], 2);
    assert_eq!(body["by_status"]["Offer"], 1);
}

#[tokio::test]
async fn router_walks_an_application_through_its_lifecycle() {
    let app = tracker_router(build_service());

    let created = app
        .clone()
        .oneshot(json_post(
            "/add",
            json!({
                "company_name": "Acme",
                "job_role": "Engineer",
                "applied_date": "2024-01-15",
                "url": "https://acme.example/jobs/1",
                "status": "Applied"
            }),
        ))
        .await
        .expect("add response");
    assert_eq!(created.status(), StatusCode::OK);
    let created = read_json_body(created).await;
    assert_eq!(created["success"], true);
    assert_eq!(created["message"], "Job application added successfully");
    let id = created["id"].as_i64().expect("id");

    let updated = app
        .clone()
        .oneshot(json_post(
            &format!("/edit/{id}"),
            json!({
                "company_name": "Acme",
                "job_role": "Engineer",
                "applied_date": "2024-01-15",
                "status": "Interview 1",
                "notes": "Panel on Friday"
            }),
        ))
        .await
        .expect("edit response");
    assert_eq!(updated.status(), StatusCode::OK);

    let record = app
        .clone()
        .oneshot(get(&format!("/edit/{id}")))
        .await
        .expect("edit form response");
    assert_eq!(record.status(), StatusCode::OK);
    let record = read_json_body(record).await;
    assert_eq!(record["status"], "Interview 1");
    assert_eq!(record["notes"], "Panel on Friday");
    assert_eq!(record["url"], "");

    let history = app
        .clone()
        .oneshot(get(&format!("/api/applications/{id}/history")))
        .await
        .expect("history response");
    assert_eq!(history.status(), StatusCode::OK);
    let history = read_json_body(history).await;
    assert_eq!(history["application_id"], id);
    let statuses: Vec<&str> = history["status_history"]
        .as_array()
        .expect("entries")
        .iter()
        .map(|entry| entry["status"].as_str().expect("status"))
        .collect();
    assert_eq!(statuses, vec!["Applied", "Interview 1"]);

    let deleted = app
        .clone()
        .oneshot(json_post(&format!("/delete/{id}"), json!({})))
        .await
        .expect("delete response");
    assert_eq!(deleted.status(), StatusCode::OK);

    let listing = app
        .oneshot(get("/api/applications"))
        .await
        .expect("list response");
    let listing = read_json_body(listing).await;
    assert_eq!(listing, json!([]));
}

#[tokio::test]
async fn router_listing_honours_sort_query() {
    let service = build_service();
    seed_four(&service);
    let app = tracker_router(service);

    let response = app
        .clone()
        .oneshot(get("/api/applications?sort=applied_date&order=asc"))
        .await
        .expect("response");
    let body = read_json_body(response).await;
    let names: Vec<&str> = body
        .as_array()
        .expect("array")
        .iter()
        .map(|application| application["company_name"].as_str().expect("name"))
        .collect();
    assert_eq!(names, vec!["Initech", "Hooli", "Globex", "Umbrella"]);

    let enriched = app
        .oneshot(get("/api/applications/history?sort=status&order=desc"))
        .await
        .expect("response");
    let enriched = read_json_body(enriched).await;
    let first = &enriched.as_array().expect("array")[0];
    assert_eq!(first["status"], "Offer");
    assert_eq!(first["status_history"].as_array().expect("history").len(), 1);
}

#[tokio::test]
async fn router_edit_of_missing_application_still_succeeds() {
    let app = tracker_router(build_service());

    let response = app
        .oneshot(json_post(
            "/edit/404",
            json!({
                "company_name": "Acme",
                "job_role": "Engineer",
                "applied_date": "2024-01-15",
                "status": "Applied"
            }),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["message"], "Job application updated successfully");
}

#[tokio::test]
async fn router_repeated_sort_parameters_use_the_first_value() {
    let service = build_service();
    seed_four(&service);
    let app = tracker_router(service);

    let listing = app
        .clone()
        .oneshot(get(
            "/api/applications?sort=company_name&sort=status&order=asc&order=desc",
        ))
        .await
        .expect("response");
    assert_eq!(listing.status(), StatusCode::OK);
    let listing = read_json_body(listing).await;
    let names: Vec<&str> = listing
        .as_array()
        .expect("array")
        .iter()
        .map(|application| application["company_name"].as_str().expect("name"))
        .collect();
    assert_eq!(names, vec!["Globex", "Hooli", "Initech", "Umbrella"]);

    let index = app
        .oneshot(get("/?sort=a&sort=b"))
        .await
        .expect("response");
    assert_eq!(index.status(), StatusCode::OK);
    let index = read_json_body(index).await;
    assert_eq!(index["current_sort"], "applied_date");
    assert_eq!(index["current_order"], "desc");
    assert_eq!(index["applications"][0]["company_name"], "Umbrella");
}

#[tokio::test]
async fn router_malformed_bodies_get_the_error_envelope() {
    let app = tracker_router(build_service());
    let wrong_type = json_post(
        "/add",
        json!({
            "company_name": "Acme",
            "job_role": "Engineer",
            "applied_date": "2024-01-15",
            "status": 5
        }),
    );
    let no_content_type = Request::builder()
        .method("POST")
        .uri("/add")
        .body(Body::from(acme_json().to_string()))
        .expect("request");
    let not_json = Request::builder()
        .method("POST")
        .uri("/edit/1")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("not json"))
        .expect("request");

    for request in [wrong_type, no_content_type, not_json] {
        let uri = request.uri().clone();
        let response = app.clone().oneshot(request).await.expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
        let body = read_json_body(response).await;
        assert_eq!(body["success"], false, "{uri}");
        assert!(
            !body["message"].as_str().expect("message").is_empty(),
            "{uri}"
        );
    }

    let listing = app
        .oneshot(get("/api/applications"))
        .await
        .expect("response");
    assert_eq!(read_json_body(listing).await, json!([]));
}

#[tokio::test]
async fn router_add_form_lists_fields_and_statuses() {
    let app = tracker_router(build_service());

    let response = app.oneshot(get("/add")).await.expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(
        body["required_fields"],
        json!(["company_name", "job_role", "applied_date", "status"])
    );
    let statuses = body["statuses"].as_array().expect("statuses");
    assert_eq!(statuses.len(), KNOWN_STATUSES.len());
    assert_eq!(statuses[0], "Applied");
    assert_eq!(statuses[4], "Offer");
}

fn acme_json() -> Value {
    json!({
        "company_name": "Acme",
        "job_role": "Engineer",
        "applied_date": "2024-01-15",
        "status": "Applied"
    })
}
