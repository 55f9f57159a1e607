use std::sync::Arc;

use async_trait::async_trait;
use backoffice_core::{Document, DocumentEdit, StoreError, Totals, ValidationErrors, apply_edit};
use backoffice_render::{RenderTarget, render};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::error;
use uuid::Uuid;

use crate::error::{PopupBlocked, SessionError};
use crate::service::{DeliveryService, SendOutcome, send_recipient};

/// Where a print-ready document is opened for PDF capture.
#[async_trait]
pub trait PrintSurface: Send + Sync {
    async fn open(&self, title: &str, html: &str) -> Result<(), PopupBlocked>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum SessionStatus {
    Editing,
    Saved { at: DateTime<Utc> },
    SaveFailed { message: String },
    Sent { email_id: Option<String> },
    SendFailed { message: String },
    PrintBlocked,
}

struct SessionState {
    document: Document,
    status: SessionStatus,
}

/// One editor's exclusive working copy of a document.
///
/// Every persisting operation runs under the session lock, so a share link requested while
/// a first save is still in flight observes the id that save produced instead of creating
/// a second row.
pub struct DocumentSession {
    delivery: DeliveryService,
    print_surface: Option<Arc<dyn PrintSurface>>,
    state: Mutex<SessionState>,
}

impl DocumentSession {
    pub fn new(delivery: DeliveryService, document: Document) -> Self {
        Self {
            delivery,
            print_surface: None,
            state: Mutex::new(SessionState {
                document,
                status: SessionStatus::Editing,
            }),
        }
    }

    pub fn with_print_surface(mut self, surface: Arc<dyn PrintSurface>) -> Self {
        self.print_surface = Some(surface);
        self
    }

    pub async fn document(&self) -> Document {
        self.state.lock().await.document.clone()
    }

    pub async fn status(&self) -> SessionStatus {
        self.state.lock().await.status.clone()
    }

    /// Applies one field edit and returns the re-derived totals (invoices only).
    pub async fn apply(&self, edit: &DocumentEdit) -> Result<Option<Totals>, ValidationErrors> {
        let mut state = self.state.lock().await;
        apply_edit(&mut state.document, edit)?;
        state.status = SessionStatus::Editing;
        Ok(state.document.totals())
    }

    pub async fn save(&self) -> Result<Document, SessionError> {
        let mut state = self.state.lock().await;
        self.save_locked(&mut state).await
    }

    async fn save_locked(&self, state: &mut SessionState) -> Result<Document, SessionError> {
        match self.delivery.persist(&state.document).await {
            Ok(saved) => {
                state.document = saved.clone();
                state.status = SessionStatus::Saved {
                    at: saved.meta().updated_at.unwrap_or_else(Utc::now),
                };
                Ok(saved)
            }
            Err(err) => {
                error!(error = %err, "document save failed");
                state.status = SessionStatus::SaveFailed {
                    message: err.to_string(),
                };
                Err(err)
            }
        }
    }

    /// Saves only if the document has never been persisted.
    pub async fn ensure_saved(&self) -> Result<Uuid, SessionError> {
        let mut state = self.state.lock().await;
        if let Some(id) = state.document.id() {
            return Ok(id);
        }

        let saved = self.save_locked(&mut state).await?;
        saved.id().ok_or_else(|| {
            StoreError::Backend("store returned a document without an id".to_string()).into()
        })
    }

    pub async fn share_link(&self) -> Result<String, SessionError> {
        let id = self.ensure_saved().await?;
        let kind = self.state.lock().await.document.kind();
        Ok(self.delivery.share_url(kind, id))
    }

    /// Checks the recipient, saves under the session lock so the working copy holds its id
    /// before any email goes out, then delivers. A failed delivery leaves the saved id in
    /// place, so a retry updates the same row.
    pub async fn send(&self) -> Result<SendOutcome, SessionError> {
        let mut state = self.state.lock().await;
        let recipient = match send_recipient(&state.document) {
            Ok(recipient) => recipient,
            Err(errors) => {
                state.status = SessionStatus::SendFailed {
                    message: errors.summary(),
                };
                return Err(errors.into());
            }
        };

        let saved = self.save_locked(&mut state).await?;
        match self.delivery.send_saved(saved, recipient).await {
            Ok(outcome) => {
                state.document = outcome.document.clone();
                state.status = SessionStatus::Sent {
                    email_id: outcome.email_id.clone(),
                };
                Ok(outcome)
            }
            Err(err) => {
                error!(error = %err, "document send failed");
                state.status = SessionStatus::SendFailed {
                    message: err.to_string(),
                };
                Err(err)
            }
        }
    }

    /// Renders the print document and hands it to the print surface, if one is attached.
    pub async fn print(&self) -> Result<String, SessionError> {
        let mut state = self.state.lock().await;
        let html = render(&state.document, RenderTarget::Print)?;

        if let Some(surface) = &self.print_surface {
            let title = state.document.display_label();
            if let Err(blocked) = surface.open(&title, &html).await {
                state.status = SessionStatus::PrintBlocked;
                return Err(blocked.into());
            }
        }

        Ok(html)
    }
}
