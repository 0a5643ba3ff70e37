//! Asynchronous access layer for the invoice backend's JSON API.
//!
//! # Overview
//! Every request from the invoice front end goes through one chokepoint,
//! `ApiClient`, which normalizes request construction, response parsing and
//! error signaling:
//! - paths always carry exactly one leading `/`
//! - `Content-Type: application/json` is sent by default, caller headers win
//! - responses without a JSON content type are rejected before the status is
//!   looked at
//! - every failure is one `ApiError` with an `ApiErrorKind`, logged once via
//!   `tracing` and then returned
//!
//! # Design
//! - Building (`build_request`) and parsing (`parse_response`) are pure; only
//!   a `Transport` does I/O, so both halves are testable without a network.
//! - `ApiClient` owns no mutable state; concurrent calls are independent.
//! - No retry, caching or deduplication. Timeouts come from `ClientConfig`
//!   or `RequestOptions` and are enforced by the transport.
//! - `InvoiceApi` adds typed endpoints (`types`) on top of the untyped
//!   `serde_json::Value` envelope.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod invoices;
pub mod request;
pub mod transport;
pub mod types;

#[cfg(test)]
mod test_support;

pub use client::{ApiClient, NOT_JSON_MESSAGE};
pub use config::{load_client_config, ClientConfig, ConfigError};
pub use error::{ApiError, ApiErrorKind};
pub use http::{ApiRequest, HttpMethod, HttpResponse};
pub use invoices::InvoiceApi;
pub use request::{merge_headers, normalize_path, validate_headers, RequestOptions};
pub use transport::{ReqwestTransport, Transport};
pub use types::{
    Attachment, AttachmentList, EmailPage, EmailStatus, EmailSummary, InvoiceData, ProcessEmail,
    ProcessOutcome, Vendor, VendorUpdate,
};
