//! The I/O seam between `ApiClient` and the network.
//!
//! `Transport` executes one `ApiRequest` and hands back whatever the server
//! said as an `HttpResponse`. Status interpretation stays in the client, so a
//! transport only fails when no response was obtained at all.

use async_trait::async_trait;
use reqwest::{Client, Method};

use crate::error::ApiError;
use crate::http::{ApiRequest, HttpMethod, HttpResponse};

#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform exactly one round trip against `url`.
    async fn execute(&self, url: &str, request: &ApiRequest) -> Result<HttpResponse, ApiError>;
}

/// `Transport` backed by `reqwest`.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

fn method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Delete => Method::DELETE,
    }
}

fn transport_error(err: reqwest::Error) -> ApiError {
    if err.is_builder() {
        ApiError::invalid_request(format!("invalid request: {err}"))
    } else if err.is_timeout() {
        ApiError::network(format!("request timed out: {err}"))
    } else if err.is_connect() {
        ApiError::network(format!("cannot connect to backend: {err}"))
    } else {
        ApiError::network(err.to_string())
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, url: &str, request: &ApiRequest) -> Result<HttpResponse, ApiError> {
        let mut builder = self.client.request(method(request.method), url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        tracing::debug!(method = request.method.as_str(), %url, "sending request");

        let response = builder.send().await.map_err(transport_error)?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.text().await.map_err(transport_error)?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}
