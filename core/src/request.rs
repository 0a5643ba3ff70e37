//! Request construction: path normalization, header merging and validation,
//! and per-call options.

use std::time::Duration;

use reqwest::header::{HeaderName, HeaderValue};

use crate::error::ApiError;
use crate::http::HttpMethod;

pub const CONTENT_TYPE: &str = "Content-Type";
pub const APPLICATION_JSON: &str = "application/json";

/// Per-call options for `ApiClient::request`.
///
/// `query` and `timeout` are passed through to the transport untouched; the
/// access layer itself never enforces a timeout.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub method: Option<HttpMethod>,
    pub body: Option<String>,
    pub headers: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
    pub timeout: Option<Duration>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_method(mut self, method: HttpMethod) -> Self {
        self.method = Some(method);
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Give `path` exactly one leading `/`.
///
/// Runs of leading separators collapse to one, so the result is stable under
/// repeated application. An empty path becomes `/`.
pub fn normalize_path(path: &str) -> String {
    format!("/{}", path.trim_start_matches('/'))
}

/// Overlay `caller` headers on `defaults`.
///
/// Names compare case-insensitively. A caller header replaces every default
/// with the same name; surviving defaults keep their order and come first.
pub fn merge_headers(
    defaults: &[(String, String)],
    caller: &[(String, String)],
) -> Vec<(String, String)> {
    let mut merged: Vec<(String, String)> = defaults
        .iter()
        .filter(|(name, _)| !caller.iter().any(|(c, _)| c.eq_ignore_ascii_case(name)))
        .cloned()
        .collect();

    for (name, value) in caller {
        // Later caller entries win over earlier ones with the same name.
        merged.retain(|(existing, _)| !existing.eq_ignore_ascii_case(name));
        merged.push((name.clone(), value.clone()));
    }
    merged
}

/// Reject header names and values that cannot go on the wire.
pub fn validate_headers(headers: &[(String, String)]) -> Result<(), ApiError> {
    for (name, value) in headers {
        HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| ApiError::invalid_request(format!("invalid header name {name:?}")))?;
        HeaderValue::from_str(value).map_err(|_| {
            ApiError::invalid_request(format!("invalid value for header {name:?}"))
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiErrorKind;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn missing_separator_is_prepended() {
        assert_eq!(normalize_path("api/emails/"), "/api/emails/");
        assert_eq!(normalize_path("invoices"), "/invoices");
    }

    #[test]
    fn normalized_path_is_unchanged() {
        for path in ["/", "/invoices", "/api/emails/abc/attachments/"] {
            assert_eq!(normalize_path(path), path);
            assert_eq!(normalize_path(&normalize_path(path)), path);
        }
    }

    #[test]
    fn repeated_separators_collapse() {
        assert_eq!(normalize_path("//api//emails"), "/api//emails");
        assert_eq!(normalize_path("///"), "/");
    }

    #[test]
    fn empty_path_becomes_root() {
        assert_eq!(normalize_path(""), "/");
    }

    #[test]
    fn caller_header_overrides_default() {
        let merged = merge_headers(
            &pairs(&[(CONTENT_TYPE, APPLICATION_JSON)]),
            &pairs(&[("content-type", "text/plain")]),
        );
        assert_eq!(merged, pairs(&[("content-type", "text/plain")]));
    }

    #[test]
    fn defaults_come_before_caller_headers() {
        let merged = merge_headers(
            &pairs(&[(CONTENT_TYPE, APPLICATION_JSON), ("X-Client", "ui")]),
            &pairs(&[("Authorization", "Token abc")]),
        );
        assert_eq!(
            merged,
            pairs(&[
                (CONTENT_TYPE, APPLICATION_JSON),
                ("X-Client", "ui"),
                ("Authorization", "Token abc"),
            ])
        );
    }

    #[test]
    fn last_caller_duplicate_wins() {
        let merged = merge_headers(&[], &pairs(&[("X-Trace", "1"), ("x-trace", "2")]));
        assert_eq!(merged, pairs(&[("x-trace", "2")]));
    }

    #[test]
    fn options_builder_collects_fields() {
        let opts = RequestOptions::new()
            .with_method(HttpMethod::Delete)
            .with_header("Accept", APPLICATION_JSON)
            .with_timeout(Duration::from_secs(5));
        assert_eq!(opts.method, Some(HttpMethod::Delete));
        assert_eq!(opts.headers.len(), 1);
        assert_eq!(opts.timeout, Some(Duration::from_secs(5)));
        assert!(opts.body.is_none());
    }

    #[test]
    fn valid_headers_pass() {
        let headers = pairs(&[(CONTENT_TYPE, APPLICATION_JSON), ("Authorization", "Token t")]);
        assert!(validate_headers(&headers).is_ok());
    }

    #[test]
    fn header_name_with_space_is_invalid_request() {
        let err = validate_headers(&pairs(&[("bad header", "x")])).unwrap_err();
        assert_eq!(err.kind(), ApiErrorKind::InvalidRequest);
        assert!(err.message().contains("bad header"));
    }

    #[test]
    fn header_value_with_newline_is_invalid_request() {
        let err = validate_headers(&pairs(&[("X-Note", "line\nbreak")])).unwrap_err();
        assert_eq!(err.kind(), ApiErrorKind::InvalidRequest);
        assert!(err.message().contains("X-Note"));
    }
}
