use backoffice_core::{
    Document, DocumentEdit, DocumentSummary, FieldError, InvoiceStatus, Totals,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Body of `POST /api/{type}/send`. Client-computed totals are accepted for compatibility
/// and never trusted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendRequest {
    pub document: Document,
    #[serde(default)]
    pub totals: Option<Totals>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_id: Option<String>,
    pub document: Document,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareRequest {
    pub document: Document,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareResponse {
    pub id: Uuid,
    pub url: String,
    pub document: Document,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MailtoResponse {
    pub mailto: String,
    pub share_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewRequest {
    pub document: Document,
    #[serde(default)]
    pub edits: Vec<DocumentEdit>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewResponse {
    pub document: Document,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub totals: Option<Totals>,
    pub sendable: bool,
    pub errors: Vec<FieldError>,
    pub html: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDocumentQuery {
    pub client_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListDocumentsQuery {
    pub client_id: Option<Uuid>,
    pub status: Option<String>,
    pub limit: Option<i64>,
}

impl ListDocumentsQuery {
    pub fn status(&self) -> Result<Option<InvoiceStatus>, String> {
        match self.status.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => InvoiceStatus::parse(raw)
                .map(Some)
                .ok_or_else(|| format!("unknown status {raw:?}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListDocumentsResponse {
    pub items: Vec<DocumentSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldError>,
    /// The stored copy after a send that saved but failed to deliver. Retries should carry
    /// its id so they update instead of creating another row.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document: Option<Document>,
}
