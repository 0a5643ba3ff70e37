//! Typed endpoints of the invoice backend, layered on `ApiClient`.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::request::RequestOptions;
use crate::transport::{ReqwestTransport, Transport};
use crate::types::{AttachmentList, EmailPage, ProcessEmail, ProcessOutcome, Vendor, VendorUpdate};

pub const EMAILS_PATH: &str = "/api/emails/";
pub const PROCESS_EMAIL_PATH: &str = "/api/process-email/";
pub const VENDORS_PATH: &str = "/api/vendors/";

pub fn attachments_path(email_id: &str) -> String {
    format!("{EMAILS_PATH}{email_id}/attachments/")
}

pub fn vendor_path(id: u64) -> String {
    format!("{VENDORS_PATH}{id}/")
}

#[derive(Debug, Clone)]
pub struct InvoiceApi<T = ReqwestTransport> {
    client: ApiClient<T>,
}

impl<T: Transport> InvoiceApi<T> {
    pub fn new(client: ApiClient<T>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ApiClient<T> {
        &self.client
    }

    /// One page of invoice emails. `None` fetches the first page.
    pub async fn list_emails(&self, page_token: Option<&str>) -> Result<EmailPage, ApiError> {
        let mut options = RequestOptions::new();
        if let Some(token) = page_token {
            options = options.with_query("pageToken", token);
        }
        let value = self.client.request(EMAILS_PATH, options).await?;
        self.decode(EMAILS_PATH, value)
    }

    /// Extract invoice data from an email and record the sender as a vendor.
    pub async fn process_email(&self, email_id: &str) -> Result<ProcessOutcome, ApiError> {
        let body = ProcessEmail {
            email_id: email_id.to_string(),
        };
        let value = self
            .client
            .post_json(PROCESS_EMAIL_PATH, &body, RequestOptions::new())
            .await?;
        self.decode(PROCESS_EMAIL_PATH, value)
    }

    pub async fn email_attachments(&self, email_id: &str) -> Result<AttachmentList, ApiError> {
        let path = attachments_path(email_id);
        let value = self.client.request(&path, RequestOptions::new()).await?;
        self.decode(&path, value)
    }

    pub async fn list_vendors(&self) -> Result<Vec<Vendor>, ApiError> {
        let value = self.client.request(VENDORS_PATH, RequestOptions::new()).await?;
        self.decode(VENDORS_PATH, value)
    }

    pub async fn update_vendor(&self, id: u64, update: &VendorUpdate) -> Result<Vendor, ApiError> {
        let path = vendor_path(id);
        let value = self
            .client
            .patch_json(&path, update, RequestOptions::new())
            .await?;
        self.decode(&path, value)
    }

    fn decode<D: DeserializeOwned>(&self, path: &str, value: Value) -> Result<D, ApiError> {
        D::deserialize(&value).map_err(|e| {
            let err = ApiError::unexpected_shape(
                format!("unexpected response shape: {e}"),
                value.to_string(),
            );
            if self.client.config().log_failures {
                tracing::error!(
                    path,
                    kind = err.kind().as_str(),
                    error = err.message(),
                    "API error"
                );
            }
            err
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::config::ClientConfig;
    use crate::error::ApiErrorKind;
    use crate::http::{ApiRequest, HttpMethod, HttpResponse};
    use crate::test_support::capture_logs;
    use crate::types::EmailStatus;

    struct CannedTransport {
        body: String,
        sent: Mutex<Vec<ApiRequest>>,
    }

    #[async_trait]
    impl Transport for CannedTransport {
        async fn execute(
            &self,
            _url: &str,
            request: &ApiRequest,
        ) -> Result<HttpResponse, ApiError> {
            self.sent.lock().unwrap().push(request.clone());
            Ok(HttpResponse {
                status: 200,
                headers: vec![("content-type".to_string(), "application/json".to_string())],
                body: self.body.clone(),
            })
        }
    }

    fn api(body: Value) -> InvoiceApi<CannedTransport> {
        let transport = CannedTransport {
            body: body.to_string(),
            sent: Mutex::new(Vec::new()),
        };
        InvoiceApi::new(ApiClient::with_transport(ClientConfig::default(), transport))
    }

    fn sent(api: &InvoiceApi<CannedTransport>) -> Vec<ApiRequest> {
        api.client().transport().sent.lock().unwrap().clone()
    }

    #[test]
    fn paths_follow_backend_routes() {
        assert_eq!(attachments_path("18c2"), "/api/emails/18c2/attachments/");
        assert_eq!(vendor_path(4), "/api/vendors/4/");
    }

    #[tokio::test]
    async fn list_emails_passes_page_token_as_query() {
        let api = api(json!({"emails": [], "nextPageToken": null}));
        let page = api.list_emails(Some("2")).await.unwrap();
        assert!(page.emails.is_empty());
        assert!(page.next_page_token.is_none());

        let sent = sent(&api);
        assert_eq!(sent[0].path, EMAILS_PATH);
        assert_eq!(sent[0].query, vec![("pageToken".to_string(), "2".to_string())]);
    }

    #[tokio::test]
    async fn first_page_has_no_query() {
        let api = api(json!({"emails": [], "nextPageToken": "2"}));
        api.list_emails(None).await.unwrap();
        assert!(sent(&api)[0].query.is_empty());
    }

    #[tokio::test]
    async fn process_email_posts_email_id() {
        let api = api(json!({
            "status": "processed",
            "invoice": {"invoice_number": "INV-1", "date": "2024-01-02", "total_amount": "10.00"},
            "vendor_name": "Acme"
        }));
        let outcome = api.process_email("abc").await.unwrap();
        assert_eq!(outcome.status, EmailStatus::Processed);
        assert_eq!(outcome.invoice.invoice_number, "INV-1");
        assert!(outcome.invoice.attachments.is_empty());

        let sent = sent(&api);
        assert_eq!(sent[0].method, HttpMethod::Post);
        assert_eq!(sent[0].body.as_deref(), Some(r#"{"email_id":"abc"}"#));
    }

    #[tokio::test]
    async fn update_vendor_patches_only_given_fields() {
        let api = api(json!({"id": 3, "name": "Acme", "invoice_type": "pdf"}));
        let vendor = api
            .update_vendor(
                3,
                &VendorUpdate {
                    name: Some("Acme".to_string()),
                    invoice_type: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(vendor.id, 3);

        let sent = sent(&api);
        assert_eq!(sent[0].method, HttpMethod::Patch);
        assert_eq!(sent[0].path, "/api/vendors/3/");
        assert_eq!(sent[0].body.as_deref(), Some(r#"{"name":"Acme"}"#));
    }

    #[tokio::test]
    async fn wrong_shape_is_reported_with_raw_body() {
        let api = api(json!({"unexpected": true}));
        let err = api.list_vendors().await.unwrap_err();
        assert_eq!(err.kind(), ApiErrorKind::NonJsonResponse);
        assert_eq!(err.raw(), Some(r#"{"unexpected":true}"#));
    }

    #[tokio::test]
    async fn wrong_shape_is_logged_once() {
        let (logs, _guard) = capture_logs();
        let api = api(json!({"unexpected": true}));
        api.list_vendors().await.unwrap_err();

        let events = logs.events("API error");
        assert_eq!(events.len(), 1, "{}", logs.contents());
        assert!(events[0].contains("non_json_response"));
        assert!(events[0].contains(VENDORS_PATH));
    }
}
