use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{Document, HostingProposal, Invoice};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Field-scoped problems, shown next to the offending inputs.
#[derive(Debug, Clone, Serialize, PartialEq, Eq, thiserror::Error)]
#[error("{}", summarize(.errors))]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

fn summarize(errors: &[FieldError]) -> String {
    match errors {
        [] => "validation failed".to_string(),
        [only] => format!("{}: {}", only.field, only.message),
        [first, rest @ ..] => format!(
            "{}: {} (and {} more)",
            first.field,
            first.message,
            rest.len()
        ),
    }
}

impl ValidationErrors {
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            errors: vec![FieldError::new(field, message)],
        }
    }

    pub fn summary(&self) -> String {
        summarize(&self.errors)
    }

    fn from_list(errors: Vec<FieldError>) -> Result<(), Self> {
        if errors.is_empty() {
            Ok(())
        } else {
            Err(Self { errors })
        }
    }
}

/// Loose shape check: one `@`, something before it, a dotted domain after it.
pub fn looks_like_email(value: &str) -> bool {
    let value = value.trim();
    if value.chars().any(char::is_whitespace) {
        return false;
    }

    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain
                    .split_once('.')
                    .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
        }
        None => false,
    }
}

pub fn is_sendable(document: &Document) -> bool {
    validate_for_send(document).is_ok()
}

pub fn validate_for_send(document: &Document) -> Result<(), ValidationErrors> {
    match document {
        Document::Invoice(invoice) => validate_invoice_for_send(invoice),
        Document::HostingProposal(_) => Ok(()),
    }
}

fn validate_invoice_for_send(invoice: &Invoice) -> Result<(), ValidationErrors> {
    let mut errors = Vec::new();

    let email = invoice.bill_to.email.trim();
    if email.is_empty() {
        errors.push(FieldError::new("billTo.email", "client email is required"));
    } else if !looks_like_email(email) {
        errors.push(FieldError::new(
            "billTo.email",
            "client email is not a valid address",
        ));
    }

    let has_billable_line = invoice
        .line_items
        .iter()
        .any(|item| !item.rate.is_zero() || !item.quantity.is_zero());
    if !has_billable_line {
        errors.push(FieldError::new(
            "lineItems",
            "add at least one line item with a quantity or rate",
        ));
    }

    ValidationErrors::from_list(errors)
}

/// Range checks applied before a document is stored.
pub fn validate_for_save(document: &Document) -> Result<(), ValidationErrors> {
    match document {
        Document::Invoice(invoice) => validate_invoice_ranges(invoice),
        Document::HostingProposal(proposal) => validate_proposal_ranges(proposal),
    }
}

fn validate_invoice_ranges(invoice: &Invoice) -> Result<(), ValidationErrors> {
    let mut errors = Vec::new();

    if let Some(message) = tax_rate_problem(invoice.tax_rate) {
        errors.push(FieldError::new("taxRate", message));
    }

    for (index, item) in invoice.line_items.iter().enumerate() {
        if item.quantity.is_sign_negative() && !item.quantity.is_zero() {
            errors.push(FieldError::new(
                format!("lineItems.{index}.quantity"),
                "quantity cannot be negative",
            ));
        }
        if item.rate.is_sign_negative() && !item.rate.is_zero() {
            errors.push(FieldError::new(
                format!("lineItems.{index}.rate"),
                "rate cannot be negative",
            ));
        }
    }

    if let Some(due) = invoice.due_date {
        if due < invoice.issue_date {
            errors.push(FieldError::new(
                "dueDate",
                "due date cannot be before the issue date",
            ));
        }
    }

    ValidationErrors::from_list(errors)
}

fn validate_proposal_ranges(proposal: &HostingProposal) -> Result<(), ValidationErrors> {
    let mut errors = Vec::new();

    for (option_index, option) in proposal.options.iter().enumerate() {
        for (provider_index, provider) in option.providers.iter().enumerate() {
            if provider
                .monthly_cost
                .is_some_and(|cost| cost.is_sign_negative() && !cost.is_zero())
            {
                errors.push(FieldError::new(
                    format!("options.{option_index}.providers.{provider_index}.monthlyCost"),
                    "monthly cost cannot be negative",
                ));
            }
        }
    }

    ValidationErrors::from_list(errors)
}

pub(crate) fn tax_rate_problem(rate: Decimal) -> Option<&'static str> {
    if rate < Decimal::ZERO || rate > Decimal::ONE_HUNDRED {
        Some("tax rate must be between 0 and 100")
    } else {
        None
    }
}
