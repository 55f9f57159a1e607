use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::DocumentKind;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum DocumentEventKind {
    Created,
    Updated,
    Sent,
}

impl DocumentEventKind {
    pub fn channel(&self) -> &'static str {
        match self {
            Self::Created => "documents.created",
            Self::Updated => "documents.updated",
            Self::Sent => "documents.sent",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentEvent {
    pub id: Uuid,
    pub document_id: Uuid,
    pub document_kind: DocumentKind,
    pub kind: DocumentEventKind,
    pub occurred_at: DateTime<Utc>,
    pub payload: serde_json::Value,
}

impl DocumentEvent {
    pub fn new(
        kind: DocumentEventKind,
        document_kind: DocumentKind,
        document_id: Uuid,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            document_id,
            document_kind,
            kind,
            occurred_at: Utc::now(),
            payload,
        }
    }
}
