//! The invoice API access layer.
//!
//! # Design
//! `ApiClient` holds its configuration and a `Transport` and nothing else, so
//! concurrent calls share no mutable state and may complete in any order.
//! Each operation is split into a pure build step (`build_request`,
//! `build_json_request`), one transport round trip, and a pure parse step
//! (`parse_response`). Every failure is logged once and then returned.

use serde::Serialize;
use serde_json::Value;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{ApiRequest, HttpMethod, HttpResponse};
use crate::request::{
    merge_headers, normalize_path, validate_headers, RequestOptions, APPLICATION_JSON,
    CONTENT_TYPE,
};
use crate::transport::{ReqwestTransport, Transport};

pub const NOT_JSON_MESSAGE: &str = "Response was not JSON";

/// Asynchronous client for the invoice backend's JSON API.
#[derive(Debug, Clone)]
pub struct ApiClient<T = ReqwestTransport> {
    config: ClientConfig,
    transport: T,
}

impl ApiClient<ReqwestTransport> {
    /// Client over a `reqwest` transport honoring `config.timeout_secs`.
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ApiError::invalid_request(format!("failed to build HTTP client: {e}")))?;
        Ok(Self::with_transport(config, ReqwestTransport::new(client)))
    }
}

impl<T: Transport> ApiClient<T> {
    pub fn with_transport(mut config: ClientConfig, transport: T) -> Self {
        config.base_url = config.base_url.trim_end_matches('/').to_string();
        Self { config, transport }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Absolute URL for an API path.
    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, normalize_path(path))
    }

    /// Build the request `request` would send. Does no I/O.
    pub fn build_request(&self, path: &str, options: RequestOptions) -> ApiRequest {
        let mut defaults = vec![(CONTENT_TYPE.to_string(), APPLICATION_JSON.to_string())];
        defaults.extend(self.config.default_headers.iter().cloned());

        ApiRequest {
            method: options.method.unwrap_or(HttpMethod::Get),
            path: normalize_path(path),
            headers: merge_headers(&defaults, &options.headers),
            query: options.query,
            body: options.body,
            timeout: options.timeout,
        }
    }

    /// Build a request whose body is `body` serialized as JSON. `method`
    /// always wins over `options.method`, and the serialized body replaces
    /// `options.body`.
    pub fn build_json_request<B: Serialize + ?Sized>(
        &self,
        method: HttpMethod,
        path: &str,
        body: &B,
        options: RequestOptions,
    ) -> Result<ApiRequest, ApiError> {
        let body = serde_json::to_string(body).map_err(|e| {
            ApiError::serialization(format!("failed to serialize request body: {e}"))
        })?;
        Ok(self.build_request(
            path,
            RequestOptions {
                method: Some(method),
                body: Some(body),
                ..options
            },
        ))
    }

    /// Turn a raw response into the parsed JSON body or an `ApiError`.
    ///
    /// The content type is checked before the status, so a 2xx response
    /// without a JSON content type is still an error.
    pub fn parse_response(&self, response: HttpResponse) -> Result<Value, ApiError> {
        let is_json = response
            .content_type()
            .map(|ct| ct.to_ascii_lowercase().contains(APPLICATION_JSON))
            .unwrap_or(false);
        if !is_json {
            return Err(ApiError::non_json(NOT_JSON_MESSAGE, response.status, response.body));
        }

        if !response.is_success() {
            let message = error_message(&response.body)
                .unwrap_or_else(|| format!("HTTP error! status: {}", response.status));
            return Err(ApiError::http_status(message, response.status, response.body));
        }

        match serde_json::from_str(&response.body) {
            Ok(value) => Ok(value),
            Err(e) => Err(ApiError::non_json(
                format!("{NOT_JSON_MESSAGE}: {e}"),
                response.status,
                response.body,
            )),
        }
    }

    /// Issue one request and return the parsed JSON body.
    pub async fn request(&self, path: &str, options: RequestOptions) -> Result<Value, ApiError> {
        let request = self.build_request(path, options);
        self.send(request).await
    }

    /// POST `body` as JSON to `path`.
    pub async fn post_json<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        options: RequestOptions,
    ) -> Result<Value, ApiError> {
        self.send_json(HttpMethod::Post, path, body, options).await
    }

    /// PATCH `body` as JSON to `path`.
    pub async fn patch_json<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        options: RequestOptions,
    ) -> Result<Value, ApiError> {
        self.send_json(HttpMethod::Patch, path, body, options).await
    }

    async fn send_json<B: Serialize + ?Sized>(
        &self,
        method: HttpMethod,
        path: &str,
        body: &B,
        options: RequestOptions,
    ) -> Result<Value, ApiError> {
        match self.build_json_request(method, path, body, options) {
            Ok(request) => self.send(request).await,
            Err(err) => {
                self.log_failure(method, &normalize_path(path), &err);
                Err(err)
            }
        }
    }

    async fn send(&self, request: ApiRequest) -> Result<Value, ApiError> {
        let url = self.url_for(&request.path);
        let result = match validate_headers(&request.headers) {
            Ok(()) => match self.transport.execute(&url, &request).await {
                Ok(response) => self.parse_response(response),
                Err(err) => Err(err),
            },
            Err(err) => Err(err),
        };
        if let Err(err) = &result {
            self.log_failure(request.method, &request.path, err);
        }
        result
    }

    fn log_failure(&self, method: HttpMethod, path: &str, err: &ApiError) {
        if !self.config.log_failures {
            return;
        }
        tracing::error!(
            method = method.as_str(),
            path,
            kind = err.kind().as_str(),
            status = ?err.status(),
            error = err.message(),
            "API error"
        );
    }
}

/// Non-empty string `message` field of a JSON object body.
fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value
        .get("message")
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
}
