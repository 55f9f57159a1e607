use std::sync::Arc;

use backoffice_core::{
    Document, DocumentKind, DocumentStore, InvoiceStatus, ValidationErrors, looks_like_email,
    validate_for_save, validate_for_send,
};
use backoffice_render::{RenderTarget, email_subject, render};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::SessionError;
use crate::mailer::{Mailer, OutgoingEmail};

/// `{origin}/{invoice|hosting-options}/{id}`.
pub fn share_url(origin: &str, kind: DocumentKind, id: Uuid) -> String {
    format!("{}/{}/{id}", origin.trim_end_matches('/'), kind.share_slug())
}

/// Sendability plus a usable recipient address. Returns the trimmed address.
pub fn send_recipient(document: &Document) -> Result<String, ValidationErrors> {
    validate_for_send(document)?;

    let recipient = document.counterparty().email.trim().to_string();
    if looks_like_email(&recipient) {
        return Ok(recipient);
    }

    let field = match document.kind() {
        DocumentKind::Invoice => "billTo.email",
        DocumentKind::HostingProposal => "preparedFor.email",
    };
    Err(ValidationErrors::single(
        field,
        "a client email is required to send by email",
    ))
}

/// Status bookkeeping after a successful send. Paid invoices stay paid.
pub fn mark_sent(document: &Document, at: DateTime<Utc>) -> Document {
    let mut marked = document.clone();
    if let Document::Invoice(invoice) = &mut marked {
        if invoice.status != InvoiceStatus::Paid {
            invoice.status = InvoiceStatus::Sent;
        }
        invoice.sent_at = Some(at);
    }
    marked
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendOutcome {
    pub email_id: Option<String>,
    pub recipient: String,
    pub document: Document,
}

/// Persistence and outbound delivery shared by the HTTP handlers and editor sessions.
#[derive(Clone)]
pub struct DeliveryService {
    store: Arc<dyn DocumentStore>,
    mailer: Arc<dyn Mailer>,
    origin: String,
}

impl DeliveryService {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        mailer: Arc<dyn Mailer>,
        origin: impl Into<String>,
    ) -> Self {
        Self {
            store,
            mailer,
            origin: origin.into(),
        }
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn share_url(&self, kind: DocumentKind, id: Uuid) -> String {
        share_url(&self.origin, kind, id)
    }

    /// Creates the document on first save and updates it afterwards.
    pub async fn persist(&self, document: &Document) -> Result<Document, SessionError> {
        validate_for_save(document)?;

        let saved = match document.id() {
            Some(id) => self.store.update(id, document).await?,
            None => self.store.create(document).await?,
        };
        Ok(saved)
    }

    /// Emails an already persisted document to its counterparty. `recipient` comes from
    /// [`send_recipient`], checked before the document was saved.
    pub async fn send_saved(
        &self,
        saved: Document,
        recipient: String,
    ) -> Result<SendOutcome, SessionError> {
        let subject = email_subject(&saved);
        let html = render(&saved, RenderTarget::Email)?;
        let issuer_email = saved.issuer().email.trim().to_string();

        let sent = self
            .mailer
            .send(&OutgoingEmail {
                to: recipient.clone(),
                reply_to: looks_like_email(&issuer_email).then(|| issuer_email.clone()),
                subject: subject.clone(),
                html: html.clone(),
            })
            .await?;
        info!(
            kind = saved.kind().as_str(),
            id = ?saved.id(),
            email_id = ?sent.id,
            "document sent"
        );

        if looks_like_email(&issuer_email) && !issuer_email.eq_ignore_ascii_case(&recipient) {
            let copy = OutgoingEmail {
                to: issuer_email,
                reply_to: None,
                subject: format!("Sent: {subject}"),
                html,
            };
            if let Err(err) = self.mailer.send(&copy).await {
                warn!(error = %err, "confirmation copy failed");
            }
        }

        let document = self.record_sent(saved).await;

        Ok(SendOutcome {
            email_id: sent.id,
            recipient,
            document,
        })
    }

    async fn record_sent(&self, saved: Document) -> Document {
        let Some(id) = saved.id() else {
            return saved;
        };
        if saved.kind() != DocumentKind::Invoice {
            return saved;
        }

        let marked = mark_sent(&saved, Utc::now());
        match self.store.update(id, &marked).await {
            Ok(updated) => updated,
            Err(err) => {
                warn!(%id, error = %err, "failed to record sent status");
                saved
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mailer::DisabledMailer;
    use backoffice_core::{Counterparty, Invoice, LineItem};
    use backoffice_store::InMemoryDocumentStore;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;

    #[test]
    fn share_urls_use_public_slugs() {
        let id = Uuid::nil();
        assert_eq!(
            share_url("https://studio.test/", DocumentKind::HostingProposal, id),
            format!("https://studio.test/hosting-options/{id}")
        );
        assert_eq!(
            share_url("https://studio.test", DocumentKind::Invoice, id),
            format!("https://studio.test/invoice/{id}")
        );
    }

    #[test]
    fn paid_invoices_stay_paid() {
        let now = Utc::now();
        let paid = Document::from(Invoice {
            status: InvoiceStatus::Paid,
            ..Invoice::default()
        });
        match mark_sent(&paid, now) {
            Document::Invoice(invoice) => {
                assert_eq!(invoice.status, InvoiceStatus::Paid);
                assert_eq!(invoice.sent_at, Some(now));
            }
            other => panic!("unexpected document {other:?}"),
        }
    }

    #[tokio::test]
    async fn persist_creates_then_updates() {
        let store = Arc::new(InMemoryDocumentStore::new());
        let service = DeliveryService::new(
            store.clone(),
            Arc::new(DisabledMailer),
            "http://localhost:8080",
        );

        let created = service.persist(&Document::from(Invoice::default())).await.unwrap();
        let updated = service.persist(&created).await.unwrap();

        assert_eq!(created.id(), updated.id());
        assert_eq!(store.len().await, 1);
    }

    fn sendable_invoice() -> Document {
        Document::from(Invoice {
            bill_to: Counterparty {
                email: " dana@reyesbakery.test ".to_string(),
                ..Counterparty::default()
            },
            line_items: vec![LineItem {
                rate: Decimal::from(75),
                ..LineItem::blank()
            }],
            ..Invoice::default()
        })
    }

    #[test]
    fn recipient_must_be_an_address() {
        assert_eq!(
            send_recipient(&sendable_invoice()).unwrap(),
            "dana@reyesbakery.test"
        );

        let proposal = Document::from(backoffice_core::HostingProposal::default());
        let errors = send_recipient(&proposal).unwrap_err();
        assert_eq!(errors.errors[0].field, "preparedFor.email");
    }

    #[tokio::test]
    async fn unconfigured_mailer_fails_the_send() {
        let store = Arc::new(InMemoryDocumentStore::new());
        let service = DeliveryService::new(
            store.clone(),
            Arc::new(DisabledMailer),
            "http://localhost:8080",
        );

        let document = sendable_invoice();
        let recipient = send_recipient(&document).unwrap();
        let saved = service.persist(&document).await.unwrap();

        let err = service.send_saved(saved, recipient).await.unwrap_err();
        assert!(matches!(err, SessionError::Delivery(crate::DeliveryError::NotConfigured)));
        assert_eq!(store.len().await, 1);
    }
}
