//! Simulated invoice backend.
//!
//! Serves the JSON routes the invoice front end talks to under `/api/`, and
//! the front-end HTML shell for every other path, from in-memory state.

pub mod backend;
pub mod config;

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header::HOST, HeaderMap, StatusCode, Uri},
    response::{Html, IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tower_http::trace::TraceLayer;

use crate::backend::{
    attachment_links, Attachment, Backend, ProcessError, Status, StoredEmail, Vendor,
    INVOICE_TYPES,
};
use crate::config::ServerConfig;

pub const FRONTEND_SHELL: &str = "<!DOCTYPE html>\n<html>\n  <head><title>Invoices</title></head>\n  <body><div id=\"app\"></div></body>\n</html>\n";

pub type Db = Arc<RwLock<Backend>>;

#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub page_size: usize,
}

#[derive(Serialize, Deserialize)]
pub struct EmailSummary {
    pub id: String,
    pub snippet: String,
    pub attachment_count: usize,
    pub from: Option<String>,
    pub date: Option<String>,
    pub message_data: Option<Value>,
    pub status: Option<Status>,
    pub vendor_name: Option<String>,
}

#[derive(Serialize, Deserialize)]
pub struct EmailPage {
    pub emails: Vec<EmailSummary>,
    #[serde(rename = "nextPageToken")]
    pub next_page_token: Option<String>,
}

#[derive(Deserialize)]
pub struct ListQuery {
    #[serde(rename = "pageToken")]
    pub page_token: Option<String>,
    #[serde(rename = "maxResults")]
    pub max_results: Option<usize>,
}

#[derive(Deserialize)]
pub struct ProcessRequest {
    pub email_id: Option<String>,
}

#[derive(Deserialize)]
pub struct VendorPatch {
    pub name: Option<String>,
    pub invoice_type: Option<String>,
}

/// Router over a freshly seeded mailbox.
pub fn app(config: &ServerConfig) -> Router {
    router(AppState {
        db: Arc::new(RwLock::new(Backend::seeded())),
        page_size: config.page_size,
    })
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/emails/", get(list_emails))
        .route("/api/emails/{id}/attachments/", get(email_attachments))
        .route("/api/process-email/", post(process_email))
        .route("/api/vendors/", get(list_vendors))
        .route("/api/vendors/{id}/", patch(update_vendor))
        .fallback(fallback)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run(listener: TcpListener, config: &ServerConfig) -> Result<(), std::io::Error> {
    axum::serve(listener, app(config)).await
}

fn error_response(status: StatusCode, field: &str, message: impl Into<String>) -> Response {
    let mut body = serde_json::Map::new();
    body.insert(field.to_string(), Value::String(message.into()));
    (status, Json(Value::Object(body))).into_response()
}

/// Origin used for attachment links, taken from the request's `Host`.
fn media_base(headers: &HeaderMap) -> String {
    headers
        .get(HOST)
        .and_then(|h| h.to_str().ok())
        .map(|host| format!("http://{host}"))
        .unwrap_or_else(|| "http://localhost".to_string())
}

fn summary(backend: &Backend, email: &StoredEmail) -> EmailSummary {
    let record = backend.record(&email.id);
    EmailSummary {
        id: email.id.clone(),
        snippet: email.snippet.clone(),
        attachment_count: email.attachments.len(),
        from: email.from.clone(),
        date: email.date.clone(),
        message_data: record.map(|r| r.data.clone()),
        status: record.map(|r| r.status),
        vendor_name: backend.vendor_name_for(email),
    }
}

async fn list_emails(State(state): State<AppState>, Query(query): Query<ListQuery>) -> Response {
    let max = query.max_results.unwrap_or(state.page_size);
    if max > state.page_size {
        return error_response(
            StatusCode::BAD_REQUEST,
            "error",
            format!("Too many records. Maximum allowed is {}.", state.page_size),
        );
    }
    if max == 0 {
        return error_response(StatusCode::BAD_REQUEST, "error", "maxResults must be positive.");
    }

    let backend = state.db.read().await;
    let total = backend.emails().len();
    let start = match query.page_token.as_deref() {
        None => 0,
        Some(token) => match token.parse::<usize>() {
            Ok(start) if start <= total => start,
            _ => {
                return error_response(
                    StatusCode::BAD_REQUEST,
                    "error",
                    format!("Invalid page token {token:?}."),
                );
            }
        },
    };
    let end = (start + max).min(total);

    let emails = backend.emails()[start..end]
        .iter()
        .map(|email| summary(&backend, email))
        .collect();
    let next_page_token = (end < total).then(|| end.to_string());

    Json(EmailPage {
        emails,
        next_page_token,
    })
    .into_response()
}

async fn process_email(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<ProcessRequest>,
) -> Response {
    let Some(email_id) = input.email_id else {
        return error_response(StatusCode::BAD_REQUEST, "message", "email_id is required");
    };

    let mut backend = state.db.write().await;
    match backend.process_email(&email_id, &media_base(&headers)) {
        Ok((invoice, vendor_name)) => {
            tracing::info!(%email_id, %vendor_name, "processed invoice email");
            Json(json!({
                "status": Status::Processed,
                "invoice": invoice,
                "vendor_name": vendor_name,
            }))
            .into_response()
        }
        Err(ProcessError::UnknownEmail(id)) => {
            error_response(StatusCode::NOT_FOUND, "message", format!("email {id} not found"))
        }
        Err(ProcessError::Unparseable(message)) => {
            tracing::warn!(%email_id, %message, "invoice extraction failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "status": Status::Error, "message": message })),
            )
                .into_response()
        }
    }
}

async fn email_attachments(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let backend = state.db.read().await;
    let Some(email) = backend.email(&id) else {
        // Mailbox lookups fail as server errors, without a `message` field.
        return error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "error",
            format!("email {id} not found in mailbox"),
        );
    };
    let attachments: Vec<Attachment> = attachment_links(email, &media_base(&headers));
    let message = format!("Found {} attachments", attachments.len());
    Json(json!({ "attachments": attachments, "message": message })).into_response()
}

async fn list_vendors(State(state): State<AppState>) -> Json<Vec<Vendor>> {
    Json(state.db.read().await.vendors().to_vec())
}

async fn update_vendor(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(input): Json<VendorPatch>,
) -> Response {
    if let Some(invoice_type) = &input.invoice_type {
        if !INVOICE_TYPES.contains(&invoice_type.as_str()) {
            return error_response(
                StatusCode::BAD_REQUEST,
                "message",
                format!("\"{invoice_type}\" is not a valid choice."),
            );
        }
    }
    let mut backend = state.db.write().await;
    match backend.update_vendor(id, input.name, input.invoice_type) {
        Some(vendor) => Json(vendor).into_response(),
        None => error_response(StatusCode::NOT_FOUND, "message", format!("vendor {id} not found")),
    }
}

/// Unknown `/api` paths get a JSON 404; everything else is the front end.
async fn fallback(uri: Uri) -> Response {
    let path = uri.path();
    if path == "/api" || path.starts_with("/api/") {
        return error_response(StatusCode::NOT_FOUND, "message", format!("no route for {path}"));
    }
    Html(FRONTEND_SHELL).into_response()
}
