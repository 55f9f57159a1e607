//! Display-ready projections of a document. Every string a template prints is computed
//! here, once, so the three targets cannot disagree about formatting or inclusion.

use backoffice_core::{
    Counterparty, Document, HostingOption, HostingProposal, Invoice, Issuer, LineItem,
    PaymentOption, ProviderRecord, format_usd, payment_options,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::sections::{Section, is_included, sections};

const UNTITLED_ITEM: &str = "Untitled item";

pub(crate) fn display_date(date: NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}

fn input_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn plain_number(value: Decimal) -> String {
    value.normalize().to_string()
}

fn lines_of(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Only plain web addresses become links; anything else renders as text.
fn web_link(raw: &str) -> Option<String> {
    let url = raw.trim();
    let scheme = url.split_once("://").map(|(scheme, _)| scheme.to_ascii_lowercase());
    matches!(scheme.as_deref(), Some("http" | "https")).then(|| url.to_string())
}

fn optional_text(document: &Document, section: Section, text: &str) -> Option<Vec<String>> {
    is_included(document, section).then(|| lines_of(text))
}

pub(crate) struct PartyView {
    pub name: String,
    pub company: String,
    pub address: String,
    pub address_lines: Vec<String>,
    pub email: String,
    pub phone: String,
    pub website: String,
}

impl PartyView {
    fn issuer(issuer: &Issuer) -> Self {
        Self {
            name: issuer.name.trim().to_string(),
            company: String::new(),
            address: issuer.address.clone(),
            address_lines: lines_of(&issuer.address),
            email: issuer.email.trim().to_string(),
            phone: issuer.phone.trim().to_string(),
            website: issuer.website.trim().to_string(),
        }
    }

    fn counterparty(party: &Counterparty) -> Self {
        Self {
            name: party.name.trim().to_string(),
            company: party.company.trim().to_string(),
            address: party.address.clone(),
            address_lines: lines_of(&party.address),
            email: party.email.trim().to_string(),
            phone: party.phone.trim().to_string(),
            website: String::new(),
        }
    }

    /// Heading for the party block; blank parties still render, with a placeholder.
    pub fn heading(&self) -> &str {
        if !self.company.is_empty() {
            &self.company
        } else if !self.name.is_empty() {
            &self.name
        } else {
            "Not specified"
        }
    }
}

pub(crate) struct LineView {
    pub index: usize,
    pub description: String,
    pub description_input: String,
    pub placeholder: bool,
    pub quantity: String,
    pub rate: String,
    pub rate_input: String,
    pub amount: String,
}

impl LineView {
    fn new(index: usize, item: &LineItem) -> Self {
        let description = item.description.trim();
        Self {
            index,
            description: if description.is_empty() {
                UNTITLED_ITEM.to_string()
            } else {
                description.to_string()
            },
            description_input: item.description.clone(),
            placeholder: description.is_empty(),
            quantity: plain_number(item.quantity),
            rate: format_usd(item.rate),
            rate_input: plain_number(item.rate),
            amount: format_usd(item.amount()),
        }
    }
}

pub(crate) struct PaymentView {
    pub key: &'static str,
    pub label: &'static str,
    pub link: Option<String>,
    pub call_to_action: Option<String>,
    pub details: Vec<String>,
}

impl From<PaymentOption> for PaymentView {
    fn from(option: PaymentOption) -> Self {
        Self {
            key: option.method.key(),
            label: option.label,
            link: option.link,
            call_to_action: option.call_to_action,
            details: option.details,
        }
    }
}

pub(crate) struct InvoiceView {
    pub number: String,
    pub status: &'static str,
    pub issue_date: String,
    pub issue_date_input: String,
    pub due_date: Option<String>,
    pub due_date_input: String,
    pub issuer: PartyView,
    pub bill_to: PartyView,
    pub lines: Vec<LineView>,
    pub tax_rate: String,
    pub subtotal: String,
    pub tax: String,
    pub total: String,
    pub payments: Option<Vec<PaymentView>>,
    pub notes: Option<Vec<String>>,
    pub notes_input: String,
    pub terms: Option<Vec<String>>,
    pub terms_input: String,
}

impl InvoiceView {
    fn new(document: &Document, invoice: &Invoice) -> Self {
        let totals = invoice.totals();
        let payments = is_included(document, Section::Payment).then(|| {
            payment_options(invoice, totals.total)
                .into_iter()
                .map(PaymentView::from)
                .collect()
        });

        Self {
            number: invoice.invoice_number.trim().to_string(),
            status: invoice.status.as_str(),
            issue_date: display_date(invoice.issue_date),
            issue_date_input: input_date(invoice.issue_date),
            due_date: invoice.due_date.map(display_date),
            due_date_input: invoice.due_date.map(input_date).unwrap_or_default(),
            issuer: PartyView::issuer(&invoice.issuer),
            bill_to: PartyView::counterparty(&invoice.bill_to),
            lines: invoice
                .line_items
                .iter()
                .enumerate()
                .map(|(index, item)| LineView::new(index, item))
                .collect(),
            tax_rate: plain_number(invoice.tax_rate),
            subtotal: format_usd(totals.subtotal),
            tax: format_usd(totals.tax),
            total: format_usd(totals.total),
            payments,
            notes: optional_text(document, Section::Notes, &invoice.notes),
            notes_input: invoice.notes.clone(),
            terms: optional_text(document, Section::Terms, &invoice.terms),
            terms_input: invoice.terms.clone(),
        }
    }
}

pub(crate) struct ProviderView {
    pub index: usize,
    pub name: String,
    pub plan: String,
    pub url: String,
    pub link: Option<String>,
    pub monthly_cost: Option<String>,
    pub monthly_cost_input: String,
    pub notes: String,
}

impl ProviderView {
    fn new(index: usize, provider: &ProviderRecord) -> Self {
        Self {
            index,
            name: provider.name.trim().to_string(),
            plan: provider.plan.trim().to_string(),
            url: provider.url.trim().to_string(),
            link: web_link(&provider.url),
            monthly_cost: provider
                .monthly_cost
                .map(|cost| format!("{}/mo", format_usd(cost))),
            monthly_cost_input: provider.monthly_cost.map(plain_number).unwrap_or_default(),
            notes: provider.notes.trim().to_string(),
        }
    }
}

pub(crate) struct OptionView {
    pub index: usize,
    pub label: String,
    pub title: String,
    pub summary: String,
    pub recommended: bool,
    pub bullets: Vec<String>,
    pub providers: Vec<ProviderView>,
}

impl OptionView {
    fn new(index: usize, option: &HostingOption) -> Self {
        Self {
            index,
            label: option.label.trim().to_string(),
            title: option.title.trim().to_string(),
            summary: option.summary.trim().to_string(),
            recommended: option.recommended,
            bullets: option.bullets.clone(),
            providers: option
                .providers
                .iter()
                .enumerate()
                .map(|(index, provider)| ProviderView::new(index, provider))
                .collect(),
        }
    }
}

pub(crate) struct ProposalView {
    pub title: String,
    pub title_input: String,
    pub date: String,
    pub date_input: String,
    pub prepared_by: PartyView,
    pub prepared_for: PartyView,
    pub intro: Option<Vec<String>>,
    pub intro_input: String,
    pub options: Option<Vec<OptionView>>,
    pub closing_notes: Option<Vec<String>>,
    pub closing_notes_input: String,
}

impl ProposalView {
    fn new(document: &Document, proposal: &HostingProposal) -> Self {
        Self {
            title: proposal.display_label(),
            title_input: proposal.title.clone(),
            date: display_date(proposal.proposal_date),
            date_input: input_date(proposal.proposal_date),
            prepared_by: PartyView::issuer(&proposal.prepared_by),
            prepared_for: PartyView::counterparty(&proposal.prepared_for),
            intro: optional_text(document, Section::Intro, &proposal.intro),
            intro_input: proposal.intro.clone(),
            options: is_included(document, Section::Options).then(|| {
                proposal
                    .options
                    .iter()
                    .enumerate()
                    .map(|(index, option)| OptionView::new(index, option))
                    .collect()
            }),
            closing_notes: optional_text(document, Section::ClosingNotes, &proposal.closing_notes),
            closing_notes_input: proposal.closing_notes.clone(),
        }
    }
}

/// Everything a template needs to draw one document.
pub(crate) struct DocumentView {
    pub kind: &'static str,
    pub kind_label: &'static str,
    pub title: String,
    pub sections: Vec<&'static str>,
    pub invoice: Option<InvoiceView>,
    pub proposal: Option<ProposalView>,
}

impl DocumentView {
    pub fn new(document: &Document) -> Self {
        let (invoice, proposal) = match document {
            Document::Invoice(invoice) => (Some(InvoiceView::new(document, invoice)), None),
            Document::HostingProposal(proposal) => {
                (None, Some(ProposalView::new(document, proposal)))
            }
        };

        Self {
            kind: document.kind().share_slug(),
            kind_label: document.kind().label(),
            title: document.display_label(),
            sections: sections(document).iter().map(Section::marker).collect(),
            invoice,
            proposal,
        }
    }
}
