use async_trait::async_trait;
use backoffice_core::{
    Client, ClientFilter, ClientInput, ClientStatus, ClientStore, Document, DocumentFilter,
    DocumentKind, DocumentMeta, DocumentStore, DocumentSummary, StoreError, StoreResult,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::debug;
use uuid::Uuid;

fn backend_error(err: sqlx::Error) -> StoreError {
    StoreError::Backend(err.to_string())
}

fn stored_kind(raw: &str) -> &'static str {
    DocumentKind::parse(raw).map_or("unknown document", |kind| kind.as_str())
}

/// Columns denormalized out of the payload for listing and filtering. `total` is a cache
/// for ad-hoc queries only; reads always recompute it.
struct IndexColumns {
    label: String,
    client_label: String,
    client_id: Option<Uuid>,
    status: Option<&'static str>,
    total: Option<Decimal>,
    payload: Value,
}

impl IndexColumns {
    fn of(document: &Document) -> StoreResult<Self> {
        Ok(Self {
            label: document.display_label(),
            client_label: document.counterparty().display_label(),
            client_id: document.client_id(),
            status: match document {
                Document::Invoice(invoice) => Some(invoice.status.as_str()),
                Document::HostingProposal(_) => None,
            },
            total: document.totals().map(|totals| totals.total),
            payload: serde_json::to_value(document.without_identity())?,
        })
    }
}

fn decode_document(row: &PgRow) -> StoreResult<Document> {
    let payload: Value = row.try_get("payload").map_err(backend_error)?;
    let mut document: Document = serde_json::from_value(payload)?;
    *document.meta_mut() = DocumentMeta {
        id: Some(row.try_get("id").map_err(backend_error)?),
        created_at: Some(row.try_get("created_at").map_err(backend_error)?),
        updated_at: Some(row.try_get("updated_at").map_err(backend_error)?),
    };
    Ok(document)
}

#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn create(&self, document: &Document) -> StoreResult<Document> {
        let columns = IndexColumns::of(document)?;
        let id = Uuid::new_v4();
        let now = Utc::now();

        let row = sqlx::query(
            r#"
            INSERT INTO documents (
                id,
                kind,
                label,
                client_label,
                client_id,
                status,
                total,
                payload,
                created_at,
                updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)
            RETURNING id, payload, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(document.kind().as_str())
        .bind(&columns.label)
        .bind(&columns.client_label)
        .bind(columns.client_id)
        .bind(columns.status)
        .bind(columns.total)
        .bind(&columns.payload)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(backend_error)?;

        decode_document(&row)
    }

    async fn update(&self, id: Uuid, document: &Document) -> StoreResult<Document> {
        let columns = IndexColumns::of(document)?;
        let mut tx = self.pool.begin().await.map_err(backend_error)?;

        let existing = sqlx::query("SELECT kind FROM documents WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(backend_error)?
            .ok_or_else(|| StoreError::document_not_found(id))?;
        let kind: String = existing.try_get("kind").map_err(backend_error)?;
        if kind != document.kind().as_str() {
            return Err(StoreError::KindMismatch {
                id,
                stored: stored_kind(&kind),
                requested: document.kind().as_str(),
            });
        }

        // An unchanged payload keeps its updated_at, so repeated saves are no-ops.
        let row = sqlx::query(
            r#"
            UPDATE documents
            SET label = $2,
                client_label = $3,
                client_id = $4,
                status = $5,
                total = $6,
                updated_at = CASE WHEN payload = $7 THEN updated_at ELSE $8 END,
                payload = $7
            WHERE id = $1
            RETURNING id, payload, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&columns.label)
        .bind(&columns.client_label)
        .bind(columns.client_id)
        .bind(columns.status)
        .bind(columns.total)
        .bind(&columns.payload)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await
        .map_err(backend_error)?;

        tx.commit().await.map_err(backend_error)?;
        decode_document(&row)
    }

    async fn get(&self, kind: DocumentKind, id: Uuid) -> StoreResult<Document> {
        let row = sqlx::query(
            "SELECT id, kind, payload, created_at, updated_at FROM documents WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend_error)?
        .ok_or_else(|| StoreError::document_not_found(id))?;

        let stored: String = row.try_get("kind").map_err(backend_error)?;
        if stored != kind.as_str() {
            return Err(StoreError::KindMismatch {
                id,
                stored: stored_kind(&stored),
                requested: kind.as_str(),
            });
        }

        decode_document(&row)
    }

    async fn list(&self, filter: &DocumentFilter) -> StoreResult<Vec<DocumentSummary>> {
        let rows = sqlx::query(
            r#"
            SELECT id, payload, created_at, updated_at
            FROM documents
            WHERE kind = $1
              AND ($2::uuid IS NULL OR client_id = $2)
              AND ($3::text IS NULL OR status = $3)
            ORDER BY created_at DESC
            LIMIT $4
            "#,
        )
        .bind(filter.kind.as_str())
        .bind(filter.client_id)
        .bind(filter.status.map(|status| status.as_str()))
        .bind(filter.limit)
        .fetch_all(&self.pool)
        .await
        .map_err(backend_error)?;

        let mut items = Vec::with_capacity(rows.len());
        for row in rows {
            let document = decode_document(&row)?;
            if let Some(summary) = document.summary() {
                items.push(summary);
            }
        }
        debug!(kind = filter.kind.as_str(), count = items.len(), "listed documents");
        Ok(items)
    }

    async fn count(&self, kind: DocumentKind) -> StoreResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM documents WHERE kind = $1")
            .bind(kind.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(backend_error)?;
        Ok(u64::try_from(count).unwrap_or_default())
    }
}

fn decode_client(row: &PgRow) -> StoreResult<Client> {
    let status: String = row.try_get("status").map_err(backend_error)?;
    Ok(Client {
        id: row.try_get("id").map_err(backend_error)?,
        name: row.try_get("name").map_err(backend_error)?,
        company: row.try_get("company").map_err(backend_error)?,
        email: row.try_get("email").map_err(backend_error)?,
        phone: row.try_get("phone").map_err(backend_error)?,
        address: row.try_get("address").map_err(backend_error)?,
        status: ClientStatus::parse(&status).unwrap_or_default(),
        notes: row.try_get("notes").map_err(backend_error)?,
        created_at: row.try_get("created_at").map_err(backend_error)?,
        updated_at: row.try_get("updated_at").map_err(backend_error)?,
    })
}

const CLIENT_COLUMNS: &str =
    "id, name, company, email, phone, address, status, notes, created_at, updated_at";

#[derive(Clone)]
pub struct PgClientStore {
    pool: PgPool,
}

impl PgClientStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ClientStore for PgClientStore {
    async fn create(&self, input: &ClientInput) -> StoreResult<Client> {
        let now: DateTime<Utc> = Utc::now();
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO clients (id, name, company, email, phone, address, status, notes, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)
            RETURNING {CLIENT_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(input.name.trim())
        .bind(input.company.trim())
        .bind(input.email.trim())
        .bind(input.phone.trim())
        .bind(input.address.trim())
        .bind(input.status.as_str())
        .bind(&input.notes)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(backend_error)?;

        decode_client(&row)
    }

    async fn update(&self, id: Uuid, input: &ClientInput) -> StoreResult<Client> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE clients
            SET name = $2, company = $3, email = $4, phone = $5, address = $6,
                status = $7, notes = $8, updated_at = $9
            WHERE id = $1
            RETURNING {CLIENT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(input.name.trim())
        .bind(input.company.trim())
        .bind(input.email.trim())
        .bind(input.phone.trim())
        .bind(input.address.trim())
        .bind(input.status.as_str())
        .bind(&input.notes)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(backend_error)?
        .ok_or_else(|| StoreError::client_not_found(id))?;

        decode_client(&row)
    }

    async fn get(&self, id: Uuid) -> StoreResult<Client> {
        let row = sqlx::query(&format!("SELECT {CLIENT_COLUMNS} FROM clients WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend_error)?
            .ok_or_else(|| StoreError::client_not_found(id))?;

        decode_client(&row)
    }

    async fn list(&self, filter: &ClientFilter) -> StoreResult<Vec<Client>> {
        let limit = filter.limit.unwrap_or(500).clamp(1, 500);
        let rows = sqlx::query(&format!(
            r#"
            SELECT {CLIENT_COLUMNS}
            FROM clients
            WHERE ($1::text IS NULL OR status = $1)
            ORDER BY lower(name) ASC
            LIMIT $2
            "#
        ))
        .bind(filter.status.map(|status| status.as_str()))
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(backend_error)?;

        rows.iter().map(decode_client).collect()
    }

    async fn delete(&self, id: Uuid) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM clients WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(backend_error)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::client_not_found(id));
        }
        Ok(())
    }
}
