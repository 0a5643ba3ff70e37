//! DTOs for the invoice backend.
//!
//! # Design
//! These mirror the mock server's schema but are defined independently, so
//! the integration tests catch schema drift between the two crates. Wire
//! names follow the backend (`nextPageToken`, `mimeType`).

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Processing state of an invoice email.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmailStatus {
    Pending,
    Processed,
    Error,
}

/// One invoice email as listed by `GET /api/emails/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailSummary {
    pub id: String,
    pub snippet: String,
    pub attachment_count: u32,
    pub from: Option<String>,
    pub date: Option<String>,
    /// Data extracted by a previous processing run, if any.
    pub message_data: Option<Value>,
    pub status: Option<EmailStatus>,
    pub vendor_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailPage {
    pub emails: Vec<EmailSummary>,
    #[serde(rename = "nextPageToken")]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub filename: String,
    #[serde(rename = "mimeType")]
    pub mime_type: String,
    pub size: u64,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentList {
    pub attachments: Vec<Attachment>,
    pub message: String,
}

/// Fields extracted from an invoice attachment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceData {
    pub invoice_number: String,
    pub date: String,
    pub total_amount: String,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

/// Request body for `POST /api/process-email/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessEmail {
    pub email_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessOutcome {
    pub status: EmailStatus,
    pub invoice: InvoiceData,
    pub vendor_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vendor {
    pub id: u64,
    pub name: String,
    pub invoice_type: String,
}

/// Partial vendor update. Omitted fields are left unchanged by the server.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VendorUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_type: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_page_uses_backend_field_names() {
        let page: EmailPage = serde_json::from_str(
            r#"{"emails":[{"id":"a1","snippet":"Invoice 42","attachment_count":1,
                "from":"Billing <billing@acme.com>","date":null,"message_data":null,
                "status":null,"vendor_name":null}],"nextPageToken":"2"}"#,
        )
        .unwrap();
        assert_eq!(page.next_page_token.as_deref(), Some("2"));
        assert_eq!(page.emails[0].from.as_deref(), Some("Billing <billing@acme.com>"));
        assert!(page.emails[0].status.is_none());
    }

    #[test]
    fn status_is_lowercase_on_the_wire() {
        assert_eq!(serde_json::to_string(&EmailStatus::Processed).unwrap(), r#""processed""#);
        let status: EmailStatus = serde_json::from_str(r#""error""#).unwrap();
        assert_eq!(status, EmailStatus::Error);
    }

    #[test]
    fn attachment_mime_type_is_camel_case() {
        let json = serde_json::to_value(Attachment {
            filename: "inv.pdf".to_string(),
            mime_type: "application/pdf".to_string(),
            size: 10,
            url: "http://localhost:8000/media/a1_inv.pdf".to_string(),
        })
        .unwrap();
        assert_eq!(json["mimeType"], "application/pdf");
        assert!(json.get("mime_type").is_none());
    }

    #[test]
    fn vendor_update_omits_unset_fields() {
        let json = serde_json::to_value(VendorUpdate {
            name: Some("Acme".to_string()),
            invoice_type: None,
        })
        .unwrap();
        assert_eq!(json["name"], "Acme");
        assert!(json.get("invoice_type").is_none());
    }
}
