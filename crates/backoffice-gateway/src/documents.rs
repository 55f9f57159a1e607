use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Html,
};
use backoffice_core::{
    Document, DocumentEventKind, DocumentFilter, DocumentKind, FieldError, apply_edit,
    is_sendable, validate_for_save,
};
use backoffice_delivery::{DocumentSession, mailto_draft};
use backoffice_platform::{
    ListDocumentsQuery, ListDocumentsResponse, MailtoResponse, NewDocumentQuery, PreviewRequest,
    PreviewResponse, SendRequest, SendResponse, ShareRequest, ShareResponse,
};
use backoffice_render::{RenderTarget, render};
use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    AppState,
    error::{ApiError, ApiResult, internal_error, invalid_request, not_found},
    kind_from_api_slug,
};

fn expect_kind(document: &Document, kind: DocumentKind) -> ApiResult<()> {
    if document.kind() == kind {
        Ok(())
    } else {
        Err(invalid_request(format!(
            "expected a {} document, got a {}",
            kind.as_str(),
            document.kind().as_str()
        )))
    }
}

pub async fn list_documents(
    State(state): State<AppState>,
    Path(doc_type): Path<String>,
    Query(query): Query<ListDocumentsQuery>,
) -> ApiResult<Json<ListDocumentsResponse>> {
    let kind = kind_from_api_slug(&doc_type)?;
    let status = query.status().map_err(invalid_request)?;
    let filter = DocumentFilter {
        kind,
        client_id: query.client_id,
        status,
        limit: query.limit.unwrap_or(100).clamp(1, 500),
    };

    let items = state.documents.list(&filter).await?;
    Ok(Json(ListDocumentsResponse { items }))
}

pub async fn create_document(
    State(state): State<AppState>,
    Path(doc_type): Path<String>,
    Json(document): Json<Document>,
) -> ApiResult<(StatusCode, Json<Document>)> {
    let kind = kind_from_api_slug(&doc_type)?;
    expect_kind(&document, kind)?;
    validate_for_save(&document)?;

    let created = state.documents.create(&document.without_identity()).await?;
    info!(kind = kind.as_str(), id = ?created.id(), "document created");
    state.publish(DocumentEventKind::Created, &created).await;

    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn get_document(
    State(state): State<AppState>,
    Path((doc_type, document_id)): Path<(String, Uuid)>,
) -> ApiResult<Json<Document>> {
    let kind = kind_from_api_slug(&doc_type)?;
    let document = state.documents.get(kind, document_id).await?;
    Ok(Json(document))
}

pub async fn update_document(
    State(state): State<AppState>,
    Path((doc_type, document_id)): Path<(String, Uuid)>,
    Json(document): Json<Document>,
) -> ApiResult<Json<Document>> {
    let kind = kind_from_api_slug(&doc_type)?;
    expect_kind(&document, kind)?;
    validate_for_save(&document)?;

    let previous = state.documents.get(kind, document_id).await?;
    let updated = state.documents.update(document_id, &document).await?;
    if !previous.content_eq(&updated) {
        state.publish(DocumentEventKind::Updated, &updated).await;
    }

    Ok(Json(updated))
}

/// A fresh, unsaved draft seeded from the configured defaults and optionally a client.
pub async fn new_document(
    State(state): State<AppState>,
    Path(doc_type): Path<String>,
    Query(query): Query<NewDocumentQuery>,
) -> ApiResult<Json<Document>> {
    let kind = kind_from_api_slug(&doc_type)?;
    let client = match query.client_id {
        Some(client_id) => Some(state.clients.get(client_id).await?),
        None => None,
    };

    let defaults = state.settings.document_defaults();
    let today = Utc::now().date_naive();
    let document = match kind {
        DocumentKind::Invoice => {
            let sequence = state.documents.count(DocumentKind::Invoice).await? + 1;
            Document::from(defaults.draft_invoice(today, sequence, client.as_ref()))
        }
        DocumentKind::HostingProposal => {
            Document::from(defaults.draft_proposal(today, client.as_ref()))
        }
    };

    Ok(Json(document))
}

/// Applies editor events to an unsaved working copy and returns it with derived values and
/// the rendered edit view. Rejected edits are reported and skipped.
pub async fn preview_document(
    Path(doc_type): Path<String>,
    Json(request): Json<PreviewRequest>,
) -> ApiResult<Json<PreviewResponse>> {
    let kind = kind_from_api_slug(&doc_type)?;
    let mut document = request.document;
    expect_kind(&document, kind)?;

    let mut errors: Vec<FieldError> = Vec::new();
    for edit in &request.edits {
        if let Err(rejected) = apply_edit(&mut document, edit) {
            errors.extend(rejected.errors);
        }
    }
    if let Err(problems) = validate_for_save(&document) {
        errors.extend(problems.errors);
    }

    let html = render(&document, RenderTarget::Edit)?;
    Ok(Json(PreviewResponse {
        totals: document.totals(),
        sendable: is_sendable(&document),
        errors,
        html,
        document,
    }))
}

pub async fn send_document(
    State(state): State<AppState>,
    Path(doc_type): Path<String>,
    Json(request): Json<SendRequest>,
) -> ApiResult<Json<SendResponse>> {
    let kind = kind_from_api_slug(&doc_type)?;
    expect_kind(&request.document, kind)?;

    if let (Some(claimed), Some(actual)) = (request.totals, request.document.totals()) {
        if claimed != actual {
            debug!(?claimed, ?actual, "ignoring stale client totals");
        }
    }

    let session = DocumentSession::new(state.delivery.clone(), request.document);
    let outcome = match session.send().await {
        Ok(outcome) => outcome,
        Err(err) => {
            let working = session.document().await;
            let err = ApiError::from(err);
            return Err(match working.id() {
                Some(_) => err.with_document(working),
                None => err,
            });
        }
    };
    state.publish(DocumentEventKind::Sent, &outcome.document).await;

    Ok(Json(SendResponse {
        success: true,
        message: format!(
            "{} sent to {}",
            outcome.document.display_label(),
            outcome.recipient
        ),
        email_id: outcome.email_id,
        document: outcome.document,
    }))
}

pub async fn share_document(
    State(state): State<AppState>,
    Path(doc_type): Path<String>,
    Json(request): Json<ShareRequest>,
) -> ApiResult<Json<ShareResponse>> {
    let kind = kind_from_api_slug(&doc_type)?;
    expect_kind(&request.document, kind)?;

    let is_new = request.document.id().is_none();
    let session = DocumentSession::new(state.delivery.clone(), request.document);
    let document = session.save().await?;
    let url = session.share_link().await?;
    let id = document
        .id()
        .ok_or_else(|| internal_error("saved document has no id"))?;

    if is_new {
        state.publish(DocumentEventKind::Created, &document).await;
    }

    Ok(Json(ShareResponse { id, url, document }))
}

pub async fn print_document(
    State(state): State<AppState>,
    Path((doc_type, document_id)): Path<(String, Uuid)>,
) -> ApiResult<Html<String>> {
    let kind = kind_from_api_slug(&doc_type)?;
    let document = state.documents.get(kind, document_id).await?;
    Ok(Html(render(&document, RenderTarget::Print)?))
}

pub async fn mailto_document(
    State(state): State<AppState>,
    Path((doc_type, document_id)): Path<(String, Uuid)>,
) -> ApiResult<Json<MailtoResponse>> {
    let kind = kind_from_api_slug(&doc_type)?;
    if kind != DocumentKind::HostingProposal {
        return Err(not_found("mailto drafts are only available for hosting options"));
    }

    let document = state.documents.get(kind, document_id).await?;
    let Document::HostingProposal(proposal) = &document else {
        return Err(not_found("hosting options not found"));
    };

    let share_url = state.delivery.share_url(kind, document_id);
    Ok(Json(MailtoResponse {
        mailto: mailto_draft(proposal, &share_url),
        share_url,
    }))
}
