//! In-memory state of the simulated invoice backend.
//!
//! Holds the invoice emails the backend would read from the mailbox, the
//! processing record per email, and the vendors learned from sender
//! addresses.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

pub const DEFAULT_INVOICE_TYPE: &str = "pdf";
pub const INVOICE_TYPES: &[&str] = &[DEFAULT_INVOICE_TYPE];
pub const UNKNOWN_VENDOR: &str = "Unknown";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Pending,
    Processed,
    Error,
}

#[derive(Clone, Debug)]
pub struct StoredAttachment {
    pub filename: String,
    pub mime_type: String,
    pub size: u64,
}

/// What the PDF parser would extract from the email's attachment.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExtractedInvoice {
    pub invoice_number: String,
    pub date: String,
    pub total_amount: String,
}

#[derive(Clone, Debug)]
pub struct StoredEmail {
    pub id: String,
    pub snippet: String,
    pub from: Option<String>,
    pub date: Option<String>,
    pub attachments: Vec<StoredAttachment>,
    /// `None` simulates an attachment the parser cannot read.
    pub invoice: Option<ExtractedInvoice>,
}

#[derive(Clone, Debug)]
pub struct ProcessedRecord {
    pub status: Status,
    pub data: Value,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Vendor {
    pub id: u64,
    pub name: String,
    pub invoice_type: String,
}

#[derive(Clone, Debug)]
pub struct VendorEmail {
    pub vendor_id: u64,
    pub email: String,
    pub is_primary: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Attachment {
    pub filename: String,
    #[serde(rename = "mimeType")]
    pub mime_type: String,
    pub size: u64,
    pub url: String,
}

/// Failure of `Backend::process_email`.
#[derive(Debug, PartialEq, Eq)]
pub enum ProcessError {
    UnknownEmail(String),
    Unparseable(String),
}

#[derive(Debug, Default)]
pub struct Backend {
    emails: Vec<StoredEmail>,
    processed: HashMap<String, ProcessedRecord>,
    vendors: Vec<Vendor>,
    vendor_emails: HashMap<String, VendorEmail>,
    next_vendor_id: u64,
}

impl Backend {
    pub fn new(emails: Vec<StoredEmail>) -> Self {
        Self {
            emails,
            next_vendor_id: 1,
            ..Default::default()
        }
    }

    /// A mailbox with a few invoice emails, one of which cannot be parsed.
    pub fn seeded() -> Self {
        Self::new(vec![
            seed_email(
                "Invoice INV-1001 from Acme",
                "Acme Billing <billing@acme.com>",
                "Mon, 6 Jan 2025 09:12:00 +0000",
                "INV-1001.pdf",
                Some(("INV-1001", "2025-01-06", "1250.00")),
            ),
            seed_email(
                "Your Northwind invoice",
                "invoices@northwind-traders.co.uk",
                "Tue, 7 Jan 2025 14:30:00 +0000",
                "northwind invoice (jan).pdf",
                Some(("NW-552", "2025-01-07", "89.90")),
            ),
            seed_email(
                "Scanned invoice attached",
                "Globex <accounts@globex.net>",
                "Wed, 8 Jan 2025 08:00:00 +0000",
                "scan.pdf",
                None,
            ),
        ])
    }

    pub fn emails(&self) -> &[StoredEmail] {
        &self.emails
    }

    pub fn email(&self, id: &str) -> Option<&StoredEmail> {
        self.emails.iter().find(|e| e.id == id)
    }

    pub fn record(&self, id: &str) -> Option<&ProcessedRecord> {
        self.processed.get(id)
    }

    pub fn vendors(&self) -> &[Vendor] {
        &self.vendors
    }

    pub fn vendor_email(&self, email: &str) -> Option<&VendorEmail> {
        self.vendor_emails.get(email)
    }

    /// Name of the vendor known for the email's sender, if any.
    pub fn vendor_name_for(&self, email: &StoredEmail) -> Option<String> {
        let sender = email.from.as_deref().and_then(sender_address)?;
        let link = self.vendor_emails.get(&sender)?;
        self.vendors
            .iter()
            .find(|v| v.id == link.vendor_id)
            .map(|v| v.name.clone())
    }

    /// Insert or update a vendor by name, returning its id.
    pub fn upsert_vendor(&mut self, name: &str) -> u64 {
        if let Some(vendor) = self.vendors.iter_mut().find(|v| v.name == name) {
            vendor.invoice_type = DEFAULT_INVOICE_TYPE.to_string();
            return vendor.id;
        }
        let id = self.next_vendor_id;
        self.next_vendor_id += 1;
        self.vendors.push(Vendor {
            id,
            name: name.to_string(),
            invoice_type: DEFAULT_INVOICE_TYPE.to_string(),
        });
        id
    }

    pub fn update_vendor(
        &mut self,
        id: u64,
        name: Option<String>,
        invoice_type: Option<String>,
    ) -> Option<Vendor> {
        let vendor = self.vendors.iter_mut().find(|v| v.id == id)?;
        if let Some(name) = name {
            vendor.name = name;
        }
        if let Some(invoice_type) = invoice_type {
            vendor.invoice_type = invoice_type;
        }
        Some(vendor.clone())
    }

    /// Run extraction for one email and record the outcome.
    ///
    /// The sender becomes a vendor before extraction runs, so a failed
    /// extraction still leaves the vendor behind.
    pub fn process_email(
        &mut self,
        id: &str,
        media_base: &str,
    ) -> Result<(Value, String), ProcessError> {
        let email = self
            .email(id)
            .cloned()
            .ok_or_else(|| ProcessError::UnknownEmail(id.to_string()))?;

        let mut vendor_name = UNKNOWN_VENDOR.to_string();
        if let Some(sender) = email.from.as_deref().and_then(sender_address) {
            if let Some(name) = vendor_name_from_address(&sender) {
                let vendor_id = self.upsert_vendor(&name);
                self.vendor_emails.insert(
                    sender.clone(),
                    VendorEmail {
                        vendor_id,
                        email: sender,
                        is_primary: true,
                    },
                );
                vendor_name = name;
            }
        }

        let attachments = attachment_links(&email, media_base);
        match &email.invoice {
            Some(extracted) => {
                let mut data = json!(extracted);
                data["attachments"] = json!(attachments);
                self.processed.insert(
                    email.id.clone(),
                    ProcessedRecord {
                        status: Status::Processed,
                        data: data.clone(),
                    },
                );
                Ok((data, vendor_name))
            }
            None => {
                let message = format!("could not extract invoice data from email {}", email.id);
                self.processed.insert(
                    email.id.clone(),
                    ProcessedRecord {
                        status: Status::Error,
                        data: json!({ "error": message }),
                    },
                );
                Err(ProcessError::Unparseable(message))
            }
        }
    }
}

fn seed_email(
    snippet: &str,
    from: &str,
    date: &str,
    filename: &str,
    invoice: Option<(&str, &str, &str)>,
) -> StoredEmail {
    StoredEmail {
        id: Uuid::new_v4().simple().to_string(),
        snippet: snippet.to_string(),
        from: Some(from.to_string()),
        date: Some(date.to_string()),
        attachments: vec![StoredAttachment {
            filename: filename.to_string(),
            mime_type: "application/pdf".to_string(),
            size: 48_213,
        }],
        invoice: invoice.map(|(number, date, total)| ExtractedInvoice {
            invoice_number: number.to_string(),
            date: date.to_string(),
            total_amount: total.to_string(),
        }),
    }
}

/// Public links for an email's attachments, as served under `/media/`.
pub fn attachment_links(email: &StoredEmail, media_base: &str) -> Vec<Attachment> {
    email
        .attachments
        .iter()
        .map(|a| Attachment {
            filename: a.filename.clone(),
            mime_type: a.mime_type.clone(),
            size: a.size,
            url: format!(
                "{}/media/{}_{}",
                media_base.trim_end_matches('/'),
                email.id,
                safe_filename(&a.filename)
            ),
        })
        .collect()
}

/// Replace everything outside `[A-Za-z0-9.-]` with `_`.
pub fn safe_filename(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Address part of a `From` header: the text inside `<...>`, or else the
/// first whitespace-separated token containing `@`.
pub fn sender_address(from: &str) -> Option<String> {
    if let Some(start) = from.find('<') {
        if let Some(len) = from[start + 1..].find('>') {
            let inner = &from[start + 1..start + 1 + len];
            if !inner.is_empty() {
                return Some(inner.to_string());
            }
        }
    }
    from.split_whitespace()
        .map(|token| token.trim_matches(|c| c == '<' || c == '>'))
        .find(|token| token.contains('@'))
        .map(str::to_string)
}

/// Vendor name from an address: the text between `@` and the last `.`,
/// title-cased. `billing@acme.com` gives `Acme`.
pub fn vendor_name_from_address(address: &str) -> Option<String> {
    let (_, domain) = address.split_once('@')?;
    let (name, tld) = domain.rsplit_once('.')?;
    if name.is_empty() || tld.is_empty() {
        return None;
    }
    Some(title_case(name))
}

/// Upper-case the first letter of every alphabetic run, lower-case the rest.
fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_word = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}
