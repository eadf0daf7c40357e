//! external-dns webhook HTTP surface
//!
//! ## Routes
//!
//! ```text
//! webhook server
//! ├── GET  /                 - negotiation, returns the domain filter
//! ├── GET  /records          - current remote state as endpoints
//! ├── POST /records          - apply a change set (204 on success)
//! └── POST /adjustendpoints  - endpoints returned unchanged
//!
//! health server
//! └── GET  /healthz          - liveness
//! ```
//!
//! Every webhook exchange uses the versioned external-dns media type.
//! GET requests must accept it and POST bodies must be declared with it.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::header::{ACCEPT, CONTENT_TYPE, VARY};
use axum::http::{HeaderMap, HeaderName, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use ddi_core::{Changes, Endpoint, Reconciler};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

/// Media type of every webhook request and response body
pub const MEDIA_TYPE: &str = "application/external.dns.webhook+json;version=1";

/// Build the webhook router
pub fn router(reconciler: Arc<Reconciler>) -> Router {
    Router::new()
        .route("/", get(negotiate))
        .route("/records", get(get_records).post(apply_changes))
        .route("/adjustendpoints", post(adjust_endpoints))
        .with_state(reconciler)
}

/// Build the health router
pub fn health_router() -> Router {
    Router::new().route("/healthz", get(healthz))
}

/// Serve `router` on `listener` until `shutdown` resolves
pub async fn serve(
    listener: TcpListener,
    router: Router,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let addr = listener.local_addr()?;
    info!("Listening on {}", addr);
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await?;
    info!("Server on {} stopped", addr);
    Ok(())
}

fn has_media_type(headers: &HeaderMap, name: HeaderName) -> bool {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains(MEDIA_TYPE))
}

fn require_accept(headers: &HeaderMap) -> Result<(), Response> {
    if has_media_type(headers, ACCEPT) {
        return Ok(());
    }
    Err((
        StatusCode::NOT_ACCEPTABLE,
        format!("client must provide an accept header of {}", MEDIA_TYPE),
    )
        .into_response())
}

fn require_content_type(headers: &HeaderMap) -> Result<(), Response> {
    if has_media_type(headers, CONTENT_TYPE) {
        return Ok(());
    }
    Err((
        StatusCode::UNSUPPORTED_MEDIA_TYPE,
        format!("client must provide a content type of {}", MEDIA_TYPE),
    )
        .into_response())
}

fn webhook_json<T: Serialize>(value: &T) -> Response {
    match serde_json::to_vec(value) {
        Ok(body) => (
            StatusCode::OK,
            [(CONTENT_TYPE, MEDIA_TYPE), (VARY, "Content-Type")],
            body,
        )
            .into_response(),
        Err(e) => {
            error!("Failed to encode response: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

async fn negotiate(State(reconciler): State<Arc<Reconciler>>, headers: HeaderMap) -> Response {
    if let Err(response) = require_accept(&headers) {
        return response;
    }
    webhook_json(reconciler.domain_filter())
}

async fn get_records(State(reconciler): State<Arc<Reconciler>>, headers: HeaderMap) -> Response {
    if let Err(response) = require_accept(&headers) {
        return response;
    }
    match reconciler.records().await {
        Ok(endpoints) => webhook_json(&endpoints),
        Err(e) => {
            error!("Failed to get records: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

async fn apply_changes(
    State(reconciler): State<Arc<Reconciler>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if let Err(response) = require_content_type(&headers) {
        return response;
    }
    let changes: Changes = match serde_json::from_slice(&body) {
        Ok(changes) => changes,
        Err(e) => {
            debug!("Rejected change set: {}", e);
            return (StatusCode::BAD_REQUEST, format!("invalid change set: {}", e)).into_response();
        }
    };
    match reconciler.apply_changes(&changes).await {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => {
            error!("Failed to apply changes: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

async fn adjust_endpoints(headers: HeaderMap, body: Bytes) -> Response {
    if let Err(response) = require_content_type(&headers) {
        return response;
    }
    if let Err(response) = require_accept(&headers) {
        return response;
    }
    match serde_json::from_slice::<Vec<Endpoint>>(&body) {
        Ok(endpoints) => webhook_json(&endpoints),
        Err(e) => (StatusCode::BAD_REQUEST, format!("invalid endpoints: {}", e)).into_response(),
    }
}

async fn healthz() -> &'static str {
    "ok"
}
