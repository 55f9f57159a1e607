use backoffice_core::{Document, HostingProposal, Invoice, payment_options};
use serde::Serialize;

/// A block of a rendered document. Every target emits a `data-section` marker for each
/// section it includes, and every target asks [`is_included`] before doing so.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Section {
    Header,
    Parties,
    LineItems,
    Totals,
    Payment,
    Notes,
    Terms,
    Intro,
    Options,
    ClosingNotes,
}

impl Section {
    pub fn marker(&self) -> &'static str {
        match self {
            Self::Header => "header",
            Self::Parties => "parties",
            Self::LineItems => "line-items",
            Self::Totals => "totals",
            Self::Payment => "payment",
            Self::Notes => "notes",
            Self::Terms => "terms",
            Self::Intro => "intro",
            Self::Options => "options",
            Self::ClosingNotes => "closing-notes",
        }
    }
}

const INVOICE_SECTIONS: [Section; 7] = [
    Section::Header,
    Section::Parties,
    Section::LineItems,
    Section::Totals,
    Section::Payment,
    Section::Notes,
    Section::Terms,
];

const PROPOSAL_SECTIONS: [Section; 5] = [
    Section::Header,
    Section::Parties,
    Section::Intro,
    Section::Options,
    Section::ClosingNotes,
];

fn has_text(value: &str) -> bool {
    !value.trim().is_empty()
}

fn invoice_includes(invoice: &Invoice, section: Section) -> bool {
    match section {
        Section::Header | Section::Parties | Section::LineItems | Section::Totals => true,
        Section::Payment => !payment_options(invoice, invoice.totals().total).is_empty(),
        Section::Notes => has_text(&invoice.notes),
        Section::Terms => has_text(&invoice.terms),
        Section::Intro | Section::Options | Section::ClosingNotes => false,
    }
}

fn proposal_includes(proposal: &HostingProposal, section: Section) -> bool {
    match section {
        Section::Header | Section::Parties => true,
        Section::Intro => has_text(&proposal.intro),
        Section::Options => !proposal.options.is_empty(),
        Section::ClosingNotes => has_text(&proposal.closing_notes),
        _ => false,
    }
}

pub fn is_included(document: &Document, section: Section) -> bool {
    match document {
        Document::Invoice(invoice) => invoice_includes(invoice, section),
        Document::HostingProposal(proposal) => proposal_includes(proposal, section),
    }
}

/// Sections a document renders, in display order.
pub fn sections(document: &Document) -> Vec<Section> {
    let candidates: &[Section] = match document {
        Document::Invoice(_) => &INVOICE_SECTIONS,
        Document::HostingProposal(_) => &PROPOSAL_SECTIONS,
    };

    candidates
        .iter()
        .copied()
        .filter(|section| is_included(document, *section))
        .collect()
}
