//! Axum-based JSON gateway over the notebook core.
//!
//! Routes mirror the web flow one-for-one:
//! - `POST /api/register`, `POST /api/login`, `POST /api/logout`, `GET /api/me`
//! - `GET|POST /api/entries`
//! - `GET|PUT|DELETE /api/entries/{id}`
//!
//! The caller-context is the `Authorization: Bearer <handle>` header returned
//! by login. Core calls run on the blocking pool because password hashing
//! and SQLite I/O are synchronous.

use crate::auth::SessionContext;
use crate::entries::EntryId;
use crate::error::NotebookError;
use crate::notebook::Notebook;
use anyhow::{Context, Result};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;

/// Maximum request body size (64KB).
pub const MAX_BODY_SIZE: usize = 65_536;
/// Request timeout (30s).
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Shared state for all handlers.
#[derive(Clone)]
pub struct AppState {
    pub notebook: Arc<Notebook>,
}

type ApiResponse = (StatusCode, Json<serde_json::Value>);

/// Request body for register and login.
#[derive(Deserialize)]
struct CredentialsBody {
    username: String,
    password: String,
}

/// Request body for creating or editing an entry.
#[derive(Deserialize)]
struct EntryBody {
    title: String,
    content: String,
}

/// Build the router with body-size and timeout limits applied.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handle_health))
        .route("/api/register", post(handle_register))
        .route("/api/login", post(handle_login))
        .route("/api/logout", post(handle_logout))
        .route("/api/me", get(handle_me))
        .route(
            "/api/entries",
            get(handle_list_entries).post(handle_create_entry),
        )
        .route(
            "/api/entries/{id}",
            get(handle_get_entry)
                .put(handle_update_entry)
                .delete(handle_delete_entry),
        )
        .with_state(state)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_SIZE))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(REQUEST_TIMEOUT_SECS),
        ))
}

/// Bind `host:port` and serve until Ctrl-C.
pub async fn run_gateway(host: &str, port: u16, notebook: Arc<Notebook>) -> Result<()> {
    let listener = tokio::net::TcpListener::bind((host, port))
        .await
        .with_context(|| format!("Failed to bind {host}:{port}"))?;
    let addr = listener.local_addr()?;
    tracing::info!("Notekeeper gateway listening on http://{addr}");

    let app = router(AppState { notebook });
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

/// Extract bearer token from Authorization header.
fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

/// The caller-context for this request.
fn session_context(headers: &HeaderMap) -> SessionContext {
    extract_bearer_token(headers)
        .map(SessionContext::from_handle)
        .unwrap_or_default()
}

fn error_response(err: &NotebookError) -> ApiResponse {
    let status = match err {
        NotebookError::DuplicateUsername(_) => StatusCode::CONFLICT,
        NotebookError::InvalidCredentials | NotebookError::NotAuthenticated => {
            StatusCode::UNAUTHORIZED
        }
        NotebookError::NotFound => StatusCode::NOT_FOUND,
        NotebookError::Storage(_) | NotebookError::Pool(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if err.is_internal() {
        tracing::error!("Request failed: {err}");
        return (
            status,
            Json(serde_json::json!({"error": "Internal server error"})),
        );
    }
    (status, Json(serde_json::json!({"error": err.to_string()})))
}

fn bad_request(rejection: &JsonRejection) -> ApiResponse {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({"error": format!("Invalid request: {rejection}")})),
    )
}

/// Run a core call on the blocking pool and map its error to a response.
async fn call_notebook<T, F>(state: &AppState, f: F) -> std::result::Result<T, ApiResponse>
where
    F: FnOnce(&Notebook) -> crate::error::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let notebook = Arc::clone(&state.notebook);
    match tokio::task::spawn_blocking(move || f(&notebook)).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(error_response(&e)),
        Err(e) => {
            tracing::error!("Notebook task failed: {e}");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": "Internal server error"})),
            ))
        }
    }
}

// ── Handlers ────────────────────────────────────────────────────────

/// GET /health
async fn handle_health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// POST /api/register — create an account. The caller must log in afterwards.
async fn handle_register(
    State(state): State<AppState>,
    body: std::result::Result<Json<CredentialsBody>, JsonRejection>,
) -> ApiResponse {
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return bad_request(&e),
    };

    match call_notebook(&state, move |nb| nb.register(&body.username, &body.password)).await {
        Ok(user_id) => (
            StatusCode::CREATED,
            Json(serde_json::json!({"status": "registered", "user_id": user_id})),
        ),
        Err(resp) => resp,
    }
}

/// POST /api/login — verify credentials and issue a session handle.
async fn handle_login(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: std::result::Result<Json<CredentialsBody>, JsonRejection>,
) -> ApiResponse {
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return bad_request(&e),
    };
    let mut ctx = session_context(&headers);

    let result = call_notebook(&state, move |nb| {
        let handle = nb.login(&mut ctx, &body.username, &body.password)?;
        let user = nb.current_user(&ctx)?.ok_or(NotebookError::InvalidCredentials)?;
        Ok((handle, user))
    })
    .await;

    match result {
        Ok((handle, user)) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "status": "authenticated",
                "token": handle.as_str(),
                "user_id": user.id,
                "username": user.username,
            })),
        ),
        Err(resp) => resp,
    }
}

/// POST /api/logout — end the caller's session. Always succeeds.
async fn handle_logout(State(state): State<AppState>, headers: HeaderMap) -> ApiResponse {
    let mut ctx = session_context(&headers);
    state.notebook.logout(&mut ctx);
    (
        StatusCode::OK,
        Json(serde_json::json!({"status": "logged_out"})),
    )
}

/// GET /api/me — the user bound to the caller's session.
async fn handle_me(State(state): State<AppState>, headers: HeaderMap) -> ApiResponse {
    let ctx = session_context(&headers);
    let result = call_notebook(&state, move |nb| {
        nb.current_user(&ctx)?.ok_or(NotebookError::NotAuthenticated)
    })
    .await;

    match result {
        Ok(user) => (
            StatusCode::OK,
            Json(serde_json::json!({"user_id": user.id, "username": user.username})),
        ),
        Err(resp) => resp,
    }
}

/// GET /api/entries — the caller's entries, newest first.
async fn handle_list_entries(State(state): State<AppState>, headers: HeaderMap) -> ApiResponse {
    let ctx = session_context(&headers);
    match call_notebook(&state, move |nb| nb.list_entries(&ctx)).await {
        Ok(entries) => (
            StatusCode::OK,
            Json(serde_json::json!({"entries": entries})),
        ),
        Err(resp) => resp,
    }
}

/// POST /api/entries — create an entry owned by the caller.
async fn handle_create_entry(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: std::result::Result<Json<EntryBody>, JsonRejection>,
) -> ApiResponse {
    let ctx = session_context(&headers);
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return bad_request(&e),
    };

    match call_notebook(&state, move |nb| {
        nb.create_entry(&ctx, &body.title, &body.content)
    })
    .await
    {
        Ok(id) => (StatusCode::CREATED, Json(serde_json::json!({"id": id}))),
        Err(resp) => resp,
    }
}

/// GET /api/entries/{id}
async fn handle_get_entry(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> ApiResponse {
    let ctx = session_context(&headers);
    match call_notebook(&state, move |nb| nb.get_entry(&ctx, EntryId(id))).await {
        Ok(entry) => (StatusCode::OK, Json(serde_json::json!(entry))),
        Err(resp) => resp,
    }
}

/// PUT /api/entries/{id}
async fn handle_update_entry(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    body: std::result::Result<Json<EntryBody>, JsonRejection>,
) -> ApiResponse {
    let ctx = session_context(&headers);
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return bad_request(&e),
    };

    match call_notebook(&state, move |nb| {
        nb.update_entry(&ctx, EntryId(id), &body.title, &body.content)
    })
    .await
    {
        Ok(()) => (StatusCode::OK, Json(serde_json::json!({"status": "updated"}))),
        Err(resp) => resp,
    }
}

/// DELETE /api/entries/{id}
async fn handle_delete_entry(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> ApiResponse {
    let ctx = session_context(&headers);
    match call_notebook(&state, move |nb| nb.delete_entry(&ctx, EntryId(id))).await {
        Ok(()) => (StatusCode::OK, Json(serde_json::json!({"status": "deleted"}))),
        Err(resp) => resp,
    }
}
