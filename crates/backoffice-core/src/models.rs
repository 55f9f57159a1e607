use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::payments::PaymentMethods;
use crate::totals::{Totals, compute_totals};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum DocumentKind {
    Invoice,
    HostingProposal,
}

impl DocumentKind {
    /// Path segment used by public share links.
    pub fn share_slug(&self) -> &'static str {
        match self {
            Self::Invoice => "invoice",
            Self::HostingProposal => "hosting-options",
        }
    }

    /// Path segment used by the JSON API.
    pub fn api_slug(&self) -> &'static str {
        match self {
            Self::Invoice => "invoices",
            Self::HostingProposal => "hosting-options",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Invoice => "Invoice",
            Self::HostingProposal => "Hosting Options",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Invoice => "invoice",
            Self::HostingProposal => "hosting_proposal",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "invoice" => Some(Self::Invoice),
            "hosting_proposal" => Some(Self::HostingProposal),
            _ => None,
        }
    }
}

/// Identity assigned by the persistence gateway. Values sent by clients are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct Issuer {
    pub name: String,
    pub address: String,
    pub email: String,
    pub phone: String,
    pub website: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct Counterparty {
    pub name: String,
    pub company: String,
    pub address: String,
    pub email: String,
    pub phone: String,
}

impl Counterparty {
    pub fn display_label(&self) -> String {
        let company = self.company.trim();
        if company.is_empty() {
            self.name.trim().to_string()
        } else {
            company.to_string()
        }
    }
}

impl From<&Client> for Counterparty {
    fn from(client: &Client) -> Self {
        Self {
            name: client.name.clone(),
            company: client.company.clone(),
            address: client.address.clone(),
            email: client.email.clone(),
            phone: client.phone.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub quantity: Decimal,
    #[serde(default)]
    pub rate: Decimal,
}

impl LineItem {
    pub fn blank() -> Self {
        Self {
            id: Uuid::new_v4(),
            description: String::new(),
            quantity: Decimal::ONE,
            rate: Decimal::ZERO,
        }
    }

    pub fn amount(&self) -> Decimal {
        self.quantity * self.rate
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum InvoiceStatus {
    #[default]
    Draft,
    Sent,
    Paid,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Sent => "sent",
            Self::Paid => "paid",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "draft" => Some(Self::Draft),
            "sent" => Some(Self::Sent),
            "paid" => Some(Self::Paid),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct Invoice {
    #[serde(flatten)]
    pub meta: DocumentMeta,
    pub invoice_number: String,
    pub issue_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub status: InvoiceStatus,
    pub sent_at: Option<DateTime<Utc>>,
    pub client_id: Option<Uuid>,
    pub issuer: Issuer,
    pub bill_to: Counterparty,
    pub line_items: Vec<LineItem>,
    pub tax_rate: Decimal,
    pub payment_methods: PaymentMethods,
    pub notes: String,
    pub terms: String,
}

impl Invoice {
    /// Always derived from the current line items; there is no stored total to trust.
    pub fn totals(&self) -> Totals {
        compute_totals(&self.line_items, self.tax_rate)
    }

    pub fn display_label(&self) -> String {
        let number = self.invoice_number.trim();
        if number.is_empty() {
            "Untitled invoice".to_string()
        } else {
            format!("Invoice {number}")
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct ProviderRecord {
    pub name: String,
    pub plan: String,
    pub url: String,
    pub monthly_cost: Option<Decimal>,
    pub notes: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HostingOption {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub recommended: bool,
    #[serde(default)]
    pub bullets: Vec<String>,
    #[serde(default)]
    pub providers: Vec<ProviderRecord>,
}

impl HostingOption {
    pub fn labelled(index: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            label: option_label(index),
            title: String::new(),
            summary: String::new(),
            recommended: false,
            bullets: Vec::new(),
            providers: Vec::new(),
        }
    }
}

/// "Option A", "Option B", ... falling back to numbers past Z.
pub fn option_label(index: usize) -> String {
    match u8::try_from(index) {
        Ok(offset) if offset < 26 => format!("Option {}", char::from(b'A' + offset)),
        _ => format!("Option {}", index + 1),
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct HostingProposal {
    #[serde(flatten)]
    pub meta: DocumentMeta,
    pub title: String,
    pub proposal_date: NaiveDate,
    pub client_id: Option<Uuid>,
    pub prepared_by: Issuer,
    pub prepared_for: Counterparty,
    pub intro: String,
    pub options: Vec<HostingOption>,
    pub closing_notes: String,
}

impl HostingProposal {
    pub fn display_label(&self) -> String {
        let title = self.title.trim();
        if title.is_empty() {
            "Hosting options".to_string()
        } else {
            title.to_string()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Document {
    Invoice(Invoice),
    HostingProposal(HostingProposal),
}

impl Document {
    pub fn kind(&self) -> DocumentKind {
        match self {
            Self::Invoice(_) => DocumentKind::Invoice,
            Self::HostingProposal(_) => DocumentKind::HostingProposal,
        }
    }

    pub fn meta(&self) -> &DocumentMeta {
        match self {
            Self::Invoice(invoice) => &invoice.meta,
            Self::HostingProposal(proposal) => &proposal.meta,
        }
    }

    pub fn meta_mut(&mut self) -> &mut DocumentMeta {
        match self {
            Self::Invoice(invoice) => &mut invoice.meta,
            Self::HostingProposal(proposal) => &mut proposal.meta,
        }
    }

    pub fn id(&self) -> Option<Uuid> {
        self.meta().id
    }

    pub fn client_id(&self) -> Option<Uuid> {
        match self {
            Self::Invoice(invoice) => invoice.client_id,
            Self::HostingProposal(proposal) => proposal.client_id,
        }
    }

    pub fn counterparty(&self) -> &Counterparty {
        match self {
            Self::Invoice(invoice) => &invoice.bill_to,
            Self::HostingProposal(proposal) => &proposal.prepared_for,
        }
    }

    pub fn issuer(&self) -> &Issuer {
        match self {
            Self::Invoice(invoice) => &invoice.issuer,
            Self::HostingProposal(proposal) => &proposal.prepared_by,
        }
    }

    pub fn display_label(&self) -> String {
        match self {
            Self::Invoice(invoice) => invoice.display_label(),
            Self::HostingProposal(proposal) => proposal.display_label(),
        }
    }

    pub fn totals(&self) -> Option<Totals> {
        match self {
            Self::Invoice(invoice) => Some(invoice.totals()),
            Self::HostingProposal(_) => None,
        }
    }

    /// Copy with the gateway-owned identity cleared.
    pub fn without_identity(&self) -> Self {
        let mut copy = self.clone();
        *copy.meta_mut() = DocumentMeta::default();
        copy
    }

    /// Equality over user-editable fields only.
    pub fn content_eq(&self, other: &Document) -> bool {
        self.without_identity() == other.without_identity()
    }

    pub fn summary(&self) -> Option<DocumentSummary> {
        let meta = self.meta();
        Some(DocumentSummary {
            id: meta.id?,
            kind: self.kind(),
            label: self.display_label(),
            client_label: self.counterparty().display_label(),
            client_id: self.client_id(),
            total: self.totals().map(|totals| totals.total),
            status: match self {
                Self::Invoice(invoice) => Some(invoice.status),
                Self::HostingProposal(_) => None,
            },
            created_at: meta.created_at?,
            updated_at: meta.updated_at?,
        })
    }
}

impl From<Invoice> for Document {
    fn from(invoice: Invoice) -> Self {
        Self::Invoice(invoice)
    }
}

impl From<HostingProposal> for Document {
    fn from(proposal: HostingProposal) -> Self {
        Self::HostingProposal(proposal)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSummary {
    pub id: Uuid,
    pub kind: DocumentKind,
    pub label: String,
    pub client_label: String,
    pub client_id: Option<Uuid>,
    pub total: Option<Decimal>,
    pub status: Option<InvoiceStatus>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ClientStatus {
    #[default]
    Active,
    Prospect,
    Inactive,
}

impl ClientStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Prospect => "prospect",
            Self::Inactive => "inactive",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "active" => Some(Self::Active),
            "prospect" => Some(Self::Prospect),
            "inactive" => Some(Self::Inactive),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: Uuid,
    pub name: String,
    pub company: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub status: ClientStatus,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create/update payload for a client record.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct ClientInput {
    pub name: String,
    pub company: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub status: ClientStatus,
    pub notes: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn option_labels_run_through_the_alphabet() {
        assert_eq!(option_label(0), "Option A");
        assert_eq!(option_label(25), "Option Z");
        assert_eq!(option_label(26), "Option 27");
    }

    #[test]
    fn counterparty_label_prefers_company() {
        let mut party = Counterparty {
            name: "Dana Reyes".to_string(),
            ..Counterparty::default()
        };
        assert_eq!(party.display_label(), "Dana Reyes");

        party.company = "Reyes Bakery".to_string();
        assert_eq!(party.display_label(), "Reyes Bakery");
    }

    #[test]
    fn summary_requires_persisted_identity() {
        let invoice = Invoice {
            invoice_number: "INV-0001".to_string(),
            line_items: vec![LineItem {
                id: Uuid::new_v4(),
                description: "Design".to_string(),
                quantity: Decimal::from(2),
                rate: Decimal::from(75),
            }],
            ..Invoice::default()
        };
        let mut document = Document::from(invoice);
        assert!(document.summary().is_none());

        let now = Utc::now();
        *document.meta_mut() = DocumentMeta {
            id: Some(Uuid::new_v4()),
            created_at: Some(now),
            updated_at: Some(now),
        };
        let summary = document.summary().unwrap();
        assert_eq!(summary.label, "Invoice INV-0001");
        assert_eq!(summary.total, Some(Decimal::from(150)));
    }

    #[test]
    fn content_equality_ignores_identity() {
        let draft = Document::from(HostingProposal {
            title: "Hosting for Reyes Bakery".to_string(),
            ..HostingProposal::default()
        });
        let mut saved = draft.clone();
        saved.meta_mut().id = Some(Uuid::new_v4());

        assert!(draft.content_eq(&saved));
        assert_ne!(draft, saved);
    }

    #[test]
    fn document_json_is_tagged_by_type() {
        let document = Document::from(Invoice::default());
        let value = serde_json::to_value(&document).unwrap();
        assert_eq!(value["type"], "invoice");
        assert!(value.get("id").is_none());
    }
}
