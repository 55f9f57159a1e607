use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use backoffice_core::{DocumentKind, StoreError};
use backoffice_render::{render_not_found, render_share_page};
use tracing::error;
use uuid::Uuid;

use crate::AppState;

pub async fn invoice_page(
    State(state): State<AppState>,
    Path(document_id): Path<String>,
) -> Response {
    share_page(&state, DocumentKind::Invoice, &document_id).await
}

pub async fn hosting_options_page(
    State(state): State<AppState>,
    Path(document_id): Path<String>,
) -> Response {
    share_page(&state, DocumentKind::HostingProposal, &document_id).await
}

fn not_found_page(kind: DocumentKind) -> Response {
    match render_not_found(kind) {
        Ok(html) => (StatusCode::NOT_FOUND, Html(html)).into_response(),
        Err(err) => {
            error!("failed to render not-found page: {err}");
            (StatusCode::NOT_FOUND, "not found").into_response()
        }
    }
}

/// Read-only view of the latest saved revision. Unknown or malformed ids get the
/// "link may have expired" page.
async fn share_page(state: &AppState, kind: DocumentKind, raw_id: &str) -> Response {
    let Ok(id) = Uuid::parse_str(raw_id) else {
        return not_found_page(kind);
    };

    let document = match state.documents.get(kind, id).await {
        Ok(document) => document,
        Err(StoreError::NotFound { .. } | StoreError::KindMismatch { .. }) => {
            return not_found_page(kind);
        }
        Err(err) => {
            error!(%id, "failed to load shared document: {err}");
            return (StatusCode::INTERNAL_SERVER_ERROR, "something went wrong").into_response();
        }
    };

    match render_share_page(&document) {
        Ok(html) => Html(html).into_response(),
        Err(err) => {
            error!(%id, "failed to render shared document: {err}");
            (StatusCode::INTERNAL_SERVER_ERROR, "something went wrong").into_response()
        }
    }
}
