use std::sync::Arc;

use axum::{
    extract::{FromRequest, Request, State},
    http::{header, HeaderMap, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Form, Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use super::AuthState;

pub const SESSION_COOKIE: &str = "session";

/// Body accepted by `POST /login`, either as JSON or as a urlencoded form.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Login and logout routes. These stay reachable without a session.
pub fn auth_router(auth: Arc<AuthState>) -> Router {
    Router::new()
        .route("/login", get(login_form_handler).post(login_handler))
        .route("/logout", get(logout_handler).post(logout_handler))
        .with_state(auth)
}

/// Wraps `router` so that every route in it requires a live session.
pub fn protect(router: Router, auth: Arc<AuthState>) -> Router {
    router.layer(middleware::from_fn_with_state(auth, require_session))
}

/// Rejects requests without a valid session cookie.
///
/// Page navigations are sent to `/login`; API calls and form posts get a 401
/// so scripted clients see the failure instead of following a redirect.
pub async fn require_session(
    State(auth): State<Arc<AuthState>>,
    request: Request,
    next: Next,
) -> Response {
    let authorized =
        session_token(request.headers()).is_some_and(|token| auth.sessions.is_valid(token));
    if authorized {
        return next.run(request).await;
    }

    if request.method() == Method::GET && !request.uri().path().starts_with("/api/") {
        return Redirect::to("/login").into_response();
    }
    let payload = json!({
        "success": false,
        "message": "authentication required",
    });
    (StatusCode::UNAUTHORIZED, Json(payload)).into_response()
}

pub(crate) async fn login_form_handler() -> Response {
    let payload = json!({
        "message": "POST username and password to /login to start a session",
        "fields": ["username", "password"],
    });
    (StatusCode::OK, Json(payload)).into_response()
}

pub(crate) async fn login_handler(State(auth): State<Arc<AuthState>>, request: Request) -> Response {
    let login = match read_login(request).await {
        Ok(login) => login,
        Err(rejection) => return rejection,
    };

    if !auth.credentials.verify(&login.username, &login.password) {
        warn!(username = %login.username, "login rejected");
        let payload = json!({
            "success": false,
            "message": "Invalid username or password",
        });
        return (StatusCode::UNAUTHORIZED, Json(payload)).into_response();
    }

    let token = auth.sessions.issue();
    info!(username = %login.username, "session started");
    let cookie = format!(
        "{SESSION_COOKIE}={token}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
        auth.sessions.ttl().as_secs()
    );
    let payload = json!({
        "success": true,
        "message": "Logged in",
    });
    (StatusCode::OK, [(header::SET_COOKIE, cookie)], Json(payload)).into_response()
}

pub(crate) async fn logout_handler(
    State(auth): State<Arc<AuthState>>,
    headers: HeaderMap,
) -> Response {
    if let Some(token) = session_token(&headers) {
        auth.sessions.revoke(token);
    }
    let cookie = format!("{SESSION_COOKIE}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0");
    let payload = json!({
        "success": true,
        "message": "Logged out",
    });
    (StatusCode::OK, [(header::SET_COOKIE, cookie)], Json(payload)).into_response()
}

async fn read_login(request: Request) -> Result<LoginRequest, Response> {
    let is_json = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/json"));

    if is_json {
        Json::<LoginRequest>::from_request(request, &())
            .await
            .map(|Json(login)| login)
            .map_err(IntoResponse::into_response)
    } else {
        Form::<LoginRequest>::from_request(request, &())
            .await
            .map(|Form(login)| login)
            .map_err(IntoResponse::into_response)
    }
}

fn session_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value)
}
