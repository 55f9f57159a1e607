use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{
    Client, ClientInput, ClientStatus, Document, DocumentKind, DocumentSummary, InvoiceStatus,
};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: Uuid },
    #[error("document {id} is a {stored}, not a {requested}")]
    KindMismatch {
        id: Uuid,
        stored: &'static str,
        requested: &'static str,
    },
    #[error("storage backend error: {0}")]
    Backend(String),
    #[error("document serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    pub fn document_not_found(id: Uuid) -> Self {
        Self::NotFound {
            kind: "document",
            id,
        }
    }

    pub fn client_not_found(id: Uuid) -> Self {
        Self::NotFound { kind: "client", id }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Clone)]
pub struct DocumentFilter {
    pub kind: DocumentKind,
    pub client_id: Option<Uuid>,
    pub status: Option<InvoiceStatus>,
    pub limit: i64,
}

impl DocumentFilter {
    pub fn of_kind(kind: DocumentKind) -> Self {
        Self {
            kind,
            client_id: None,
            status: None,
            limit: 100,
        }
    }

    pub fn matches(&self, summary: &DocumentSummary) -> bool {
        summary.kind == self.kind
            && self.client_id.is_none_or(|id| summary.client_id == Some(id))
            && self.status.is_none_or(|status| summary.status == Some(status))
    }
}

/// Persistence gateway for documents. `create` assigns the identity and timestamps;
/// `update` replaces the stored document in place.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn create(&self, document: &Document) -> StoreResult<Document>;
    async fn update(&self, id: Uuid, document: &Document) -> StoreResult<Document>;
    async fn get(&self, kind: DocumentKind, id: Uuid) -> StoreResult<Document>;
    async fn list(&self, filter: &DocumentFilter) -> StoreResult<Vec<DocumentSummary>>;
    async fn count(&self, kind: DocumentKind) -> StoreResult<u64>;
}

#[derive(Debug, Clone, Default)]
pub struct ClientFilter {
    pub status: Option<ClientStatus>,
    pub limit: Option<i64>,
}

#[async_trait]
pub trait ClientStore: Send + Sync {
    async fn create(&self, input: &ClientInput) -> StoreResult<Client>;
    async fn update(&self, id: Uuid, input: &ClientInput) -> StoreResult<Client>;
    async fn get(&self, id: Uuid) -> StoreResult<Client>;
    async fn list(&self, filter: &ClientFilter) -> StoreResult<Vec<Client>>;
    async fn delete(&self, id: Uuid) -> StoreResult<()>;
}
