use std::collections::HashMap;

use async_trait::async_trait;
use backoffice_core::{
    Client, ClientFilter, ClientInput, ClientStore, Document, DocumentFilter, DocumentKind,
    DocumentMeta, DocumentStore, DocumentSummary, StoreError, StoreResult,
};
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

/// Document store backed by a process-local map. Used when no database is configured and
/// throughout the tests.
#[derive(Default)]
pub struct InMemoryDocumentStore {
    documents: RwLock<HashMap<Uuid, Document>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }
}

fn check_kind(id: Uuid, stored: &Document, requested: DocumentKind) -> StoreResult<()> {
    if stored.kind() == requested {
        return Ok(());
    }

    Err(StoreError::KindMismatch {
        id,
        stored: stored.kind().as_str(),
        requested: requested.as_str(),
    })
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn create(&self, document: &Document) -> StoreResult<Document> {
        let id = Uuid::new_v4();
        let now = Utc::now();

        let mut stored = document.clone();
        *stored.meta_mut() = DocumentMeta {
            id: Some(id),
            created_at: Some(now),
            updated_at: Some(now),
        };

        let mut documents = self.documents.write().await;
        documents.insert(id, stored.clone());

        Ok(stored)
    }

    async fn update(&self, id: Uuid, document: &Document) -> StoreResult<Document> {
        let mut documents = self.documents.write().await;
        let existing = documents
            .get(&id)
            .ok_or_else(|| StoreError::document_not_found(id))?;
        check_kind(id, existing, document.kind())?;

        if existing.content_eq(document) {
            debug!(%id, "update carries no changes; keeping stored revision");
            return Ok(existing.clone());
        }

        let mut stored = document.clone();
        *stored.meta_mut() = DocumentMeta {
            id: Some(id),
            created_at: existing.meta().created_at,
            updated_at: Some(Utc::now()),
        };
        documents.insert(id, stored.clone());

        Ok(stored)
    }

    async fn get(&self, kind: DocumentKind, id: Uuid) -> StoreResult<Document> {
        let documents = self.documents.read().await;
        let stored = documents
            .get(&id)
            .ok_or_else(|| StoreError::document_not_found(id))?;
        check_kind(id, stored, kind)?;
        Ok(stored.clone())
    }

    async fn list(&self, filter: &DocumentFilter) -> StoreResult<Vec<DocumentSummary>> {
        let documents = self.documents.read().await;
        let mut summaries: Vec<DocumentSummary> = documents
            .values()
            .filter_map(Document::summary)
            .filter(|summary| filter.matches(summary))
            .collect();

        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        summaries.truncate(usize::try_from(filter.limit).unwrap_or(0));
        Ok(summaries)
    }

    async fn count(&self, kind: DocumentKind) -> StoreResult<u64> {
        let documents = self.documents.read().await;
        Ok(documents.values().filter(|doc| doc.kind() == kind).count() as u64)
    }
}

#[derive(Default)]
pub struct InMemoryClientStore {
    clients: RwLock<HashMap<Uuid, Client>>,
}

impl InMemoryClientStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn client_from_input(id: Uuid, input: &ClientInput, created_at: chrono::DateTime<Utc>) -> Client {
    Client {
        id,
        name: input.name.trim().to_string(),
        company: input.company.trim().to_string(),
        email: input.email.trim().to_string(),
        phone: input.phone.trim().to_string(),
        address: input.address.trim().to_string(),
        status: input.status,
        notes: input.notes.clone(),
        created_at,
        updated_at: Utc::now(),
    }
}

#[async_trait]
impl ClientStore for InMemoryClientStore {
    async fn create(&self, input: &ClientInput) -> StoreResult<Client> {
        let client = client_from_input(Uuid::new_v4(), input, Utc::now());
        self.clients.write().await.insert(client.id, client.clone());
        Ok(client)
    }

    async fn update(&self, id: Uuid, input: &ClientInput) -> StoreResult<Client> {
        let mut clients = self.clients.write().await;
        let existing = clients
            .get(&id)
            .ok_or_else(|| StoreError::client_not_found(id))?;

        let client = client_from_input(id, input, existing.created_at);
        clients.insert(id, client.clone());
        Ok(client)
    }

    async fn get(&self, id: Uuid) -> StoreResult<Client> {
        let clients = self.clients.read().await;
        clients
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::client_not_found(id))
    }

    async fn list(&self, filter: &ClientFilter) -> StoreResult<Vec<Client>> {
        let clients = self.clients.read().await;
        let mut matching: Vec<Client> = clients
            .values()
            .filter(|client| filter.status.is_none_or(|status| client.status == status))
            .cloned()
            .collect();

        matching.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        let limit = filter.limit.unwrap_or(500).clamp(1, 500);
        matching.truncate(usize::try_from(limit).unwrap_or(500));
        Ok(matching)
    }

    async fn delete(&self, id: Uuid) -> StoreResult<()> {
        self.clients
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StoreError::client_not_found(id))
    }
}
