//! HTTP surface of the back office: the JSON API under `/api` and the public share pages.

pub mod clients;
pub mod documents;
pub mod error;
pub mod pages;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use backoffice_core::{
    ClientStore, Document, DocumentEvent, DocumentEventKind, DocumentKind, DocumentStore,
    SettingsProvider,
};
use backoffice_delivery::{DeliveryService, Mailer};
use backoffice_platform::RedisBus;
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::error::{ApiResult, not_found};

#[derive(Clone)]
pub struct AppState {
    pub documents: Arc<dyn DocumentStore>,
    pub clients: Arc<dyn ClientStore>,
    pub delivery: DeliveryService,
    pub settings: Arc<dyn SettingsProvider>,
    pub redis: Option<RedisBus>,
}

impl AppState {
    pub fn new(
        documents: Arc<dyn DocumentStore>,
        clients: Arc<dyn ClientStore>,
        mailer: Arc<dyn Mailer>,
        settings: Arc<dyn SettingsProvider>,
        public_origin: impl Into<String>,
        redis: Option<RedisBus>,
    ) -> Self {
        Self {
            delivery: DeliveryService::new(documents.clone(), mailer, public_origin),
            documents,
            clients,
            settings,
            redis,
        }
    }

    /// Best-effort event publication; the request has already succeeded.
    pub(crate) async fn publish(&self, kind: DocumentEventKind, document: &Document) {
        let (Some(redis), Some(id)) = (&self.redis, document.id()) else {
            return;
        };

        let event = DocumentEvent::new(
            kind,
            document.kind(),
            id,
            json!({ "label": document.display_label() }),
        );
        if let Err(err) = redis.publish_event(&event).await {
            warn!(channel = kind.channel(), %id, "failed to publish document event: {err}");
        }
    }
}

pub(crate) fn kind_from_api_slug(slug: &str) -> ApiResult<DocumentKind> {
    [DocumentKind::Invoice, DocumentKind::HostingProposal]
        .into_iter()
        .find(|kind| kind.api_slug() == slug)
        .ok_or_else(|| not_found(format!("unknown document type {slug:?}")))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route(
            "/api/clients",
            get(clients::list_clients).post(clients::create_client),
        )
        .route(
            "/api/clients/{client_id}",
            get(clients::get_client)
                .put(clients::update_client)
                .delete(clients::delete_client),
        )
        .route(
            "/api/{doc_type}",
            get(documents::list_documents).post(documents::create_document),
        )
        .route("/api/{doc_type}/new", get(documents::new_document))
        .route("/api/{doc_type}/preview", post(documents::preview_document))
        .route("/api/{doc_type}/send", post(documents::send_document))
        .route("/api/{doc_type}/share", post(documents::share_document))
        .route(
            "/api/{doc_type}/{document_id}",
            get(documents::get_document).put(documents::update_document),
        )
        .route(
            "/api/{doc_type}/{document_id}/print",
            get(documents::print_document),
        )
        .route(
            "/api/{doc_type}/{document_id}/mailto",
            get(documents::mailto_document),
        )
        .route("/invoice/{document_id}", get(pages::invoice_page))
        .route("/hosting-options/{document_id}", get(pages::hosting_options_page))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}
