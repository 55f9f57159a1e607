//! Field-level mutation events produced by the interactive editor.
//!
//! Inputs are addressed by dotted paths (`billTo.email`, `lineItems.0.rate`,
//! `options.1.providers.0.monthlyCost`). The same paths name the inputs in the rendered
//! edit view and the fields in validation errors.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{
    Counterparty, Document, HostingOption, HostingProposal, Invoice, Issuer, LineItem,
    ProviderRecord, option_label,
};
use crate::payments::{PaymentHandle, PaymentMethodKind};
use crate::validation::{ValidationErrors, tax_rate_problem};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum DocumentEdit {
    Set { field: String, value: String },
    AddLineItem,
    RemoveLineItem { index: usize },
    AddOption,
    RemoveOption { index: usize },
    AddBullet { option: usize },
    RemoveBullet { option: usize, index: usize },
    AddProvider { option: usize },
    RemoveProvider { option: usize, index: usize },
}

type EditResult = Result<(), ValidationErrors>;

/// Applies one edit. On error the document is left exactly as it was.
pub fn apply_edit(document: &mut Document, edit: &DocumentEdit) -> EditResult {
    match document {
        Document::Invoice(invoice) => apply_invoice_edit(invoice, edit),
        Document::HostingProposal(proposal) => apply_proposal_edit(proposal, edit),
    }
}

fn apply_invoice_edit(invoice: &mut Invoice, edit: &DocumentEdit) -> EditResult {
    match edit {
        DocumentEdit::Set { field, value } => set_invoice_field(invoice, field, value),
        DocumentEdit::AddLineItem => {
            invoice.line_items.push(LineItem::blank());
            Ok(())
        }
        DocumentEdit::RemoveLineItem { index } => {
            check_index("lineItems", *index, invoice.line_items.len())?;
            invoice.line_items.remove(*index);
            Ok(())
        }
        other => Err(unsupported(other, "invoice")),
    }
}

fn set_invoice_field(invoice: &mut Invoice, field: &str, value: &str) -> EditResult {
    let segments: Vec<&str> = field.split('.').collect();

    match segments.as_slice() {
        ["invoiceNumber"] => invoice.invoice_number = value.to_string(),
        ["issueDate"] => {
            invoice.issue_date = parse_date(field, value)?
                .ok_or_else(|| ValidationErrors::single(field, "issue date is required"))?;
        }
        ["dueDate"] => invoice.due_date = parse_date(field, value)?,
        ["taxRate"] => {
            let rate = parse_amount(field, value)?;
            if let Some(message) = tax_rate_problem(rate) {
                return Err(ValidationErrors::single(field, message));
            }
            invoice.tax_rate = rate;
        }
        ["notes"] => invoice.notes = value.to_string(),
        ["terms"] => invoice.terms = value.to_string(),
        ["issuer", name] => set_issuer_field(&mut invoice.issuer, field, name, value)?,
        ["billTo", name] => set_counterparty_field(&mut invoice.bill_to, field, name, value)?,
        ["lineItems", index, name] => {
            let index = parse_index(field, index, invoice.line_items.len())?;
            let item = &mut invoice.line_items[index];
            match *name {
                "description" => item.description = value.to_string(),
                "quantity" => item.quantity = parse_non_negative(field, value, "quantity")?,
                "rate" => item.rate = parse_non_negative(field, value, "rate")?,
                _ => return Err(unknown_field(field)),
            }
        }
        ["paymentMethods", method, name] => {
            let kind = PaymentMethodKind::from_key(method).ok_or_else(|| unknown_field(field))?;
            set_payment_field(invoice, kind, field, name, value)?;
        }
        _ => return Err(unknown_field(field)),
    }

    Ok(())
}

fn set_payment_field(
    invoice: &mut Invoice,
    kind: PaymentMethodKind,
    field: &str,
    name: &str,
    value: &str,
) -> EditResult {
    let methods = &mut invoice.payment_methods;

    if name == "enabled" {
        methods.set_enabled(kind, parse_bool(field, value)?);
        return Ok(());
    }

    match (kind, name) {
        (PaymentMethodKind::Check, "payableTo") => methods.check.payable_to = value.to_string(),
        (PaymentMethodKind::Check, "mailingAddress") => {
            methods.check.mailing_address = value.to_string()
        }
        (PaymentMethodKind::Bank, "bankName") => methods.bank.bank_name = value.to_string(),
        (PaymentMethodKind::Bank, "accountName") => methods.bank.account_name = value.to_string(),
        (PaymentMethodKind::Bank, "routingNumber") => {
            methods.bank.routing_number = value.to_string()
        }
        (PaymentMethodKind::Bank, "accountNumber") => {
            methods.bank.account_number = value.to_string()
        }
        (linked, "handle") => {
            let method = methods
                .linked_mut(linked)
                .ok_or_else(|| unknown_field(field))?;
            method.handle = PaymentHandle::parse(linked, value);
        }
        _ => return Err(unknown_field(field)),
    }

    Ok(())
}

fn apply_proposal_edit(proposal: &mut HostingProposal, edit: &DocumentEdit) -> EditResult {
    match edit {
        DocumentEdit::Set { field, value } => set_proposal_field(proposal, field, value),
        DocumentEdit::AddOption => {
            let index = proposal.options.len();
            proposal.options.push(HostingOption::labelled(index));
            Ok(())
        }
        DocumentEdit::RemoveOption { index } => {
            check_index("options", *index, proposal.options.len())?;
            proposal.options.remove(*index);
            relabel_defaults(&mut proposal.options);
            Ok(())
        }
        DocumentEdit::AddBullet { option } => {
            let option = option_mut(proposal, *option)?;
            option.bullets.push(String::new());
            Ok(())
        }
        DocumentEdit::RemoveBullet { option, index } => {
            let at = *option;
            let option = option_mut(proposal, at)?;
            check_index(&format!("options.{at}.bullets"), *index, option.bullets.len())?;
            option.bullets.remove(*index);
            Ok(())
        }
        DocumentEdit::AddProvider { option } => {
            let option = option_mut(proposal, *option)?;
            option.providers.push(ProviderRecord::default());
            Ok(())
        }
        DocumentEdit::RemoveProvider { option, index } => {
            let at = *option;
            let option = option_mut(proposal, at)?;
            check_index(&format!("options.{at}.providers"), *index, option.providers.len())?;
            option.providers.remove(*index);
            Ok(())
        }
        other => Err(unsupported(other, "hosting proposal")),
    }
}

/// Options still carrying an automatic "Option X" label are renumbered after a removal.
fn relabel_defaults(options: &mut [HostingOption]) {
    for (index, option) in options.iter_mut().enumerate() {
        if option.label.starts_with("Option ") {
            option.label = option_label(index);
        }
    }
}

fn set_proposal_field(proposal: &mut HostingProposal, field: &str, value: &str) -> EditResult {
    let segments: Vec<&str> = field.split('.').collect();

    match segments.as_slice() {
        ["title"] => proposal.title = value.to_string(),
        ["proposalDate"] => {
            proposal.proposal_date = parse_date(field, value)?
                .ok_or_else(|| ValidationErrors::single(field, "proposal date is required"))?;
        }
        ["intro"] => proposal.intro = value.to_string(),
        ["closingNotes"] => proposal.closing_notes = value.to_string(),
        ["preparedBy", name] => set_issuer_field(&mut proposal.prepared_by, field, name, value)?,
        ["preparedFor", name] => {
            set_counterparty_field(&mut proposal.prepared_for, field, name, value)?
        }
        ["options", index, rest @ ..] => {
            let len = proposal.options.len();
            let option = &mut proposal.options[parse_index(field, index, len)?];
            set_option_field(option, field, rest, value)?;
        }
        _ => return Err(unknown_field(field)),
    }

    Ok(())
}

fn set_option_field(
    option: &mut HostingOption,
    field: &str,
    segments: &[&str],
    value: &str,
) -> EditResult {
    match segments {
        ["label"] => option.label = value.to_string(),
        ["title"] => option.title = value.to_string(),
        ["summary"] => option.summary = value.to_string(),
        ["recommended"] => option.recommended = parse_bool(field, value)?,
        ["bullets", index] => {
            let index = parse_index(field, index, option.bullets.len())?;
            option.bullets[index] = value.to_string();
        }
        ["providers", index, name] => {
            let index = parse_index(field, index, option.providers.len())?;
            let provider = &mut option.providers[index];
            match *name {
                "name" => provider.name = value.to_string(),
                "plan" => provider.plan = value.to_string(),
                "url" => provider.url = value.to_string(),
                "notes" => provider.notes = value.to_string(),
                "monthlyCost" => {
                    provider.monthly_cost = if value.trim().is_empty() {
                        None
                    } else {
                        Some(parse_non_negative(field, value, "monthly cost")?)
                    };
                }
                _ => return Err(unknown_field(field)),
            }
        }
        _ => return Err(unknown_field(field)),
    }

    Ok(())
}

fn set_issuer_field(issuer: &mut Issuer, field: &str, name: &str, value: &str) -> EditResult {
    let target = match name {
        "name" => &mut issuer.name,
        "address" => &mut issuer.address,
        "email" => &mut issuer.email,
        "phone" => &mut issuer.phone,
        "website" => &mut issuer.website,
        _ => return Err(unknown_field(field)),
    };
    *target = value.to_string();
    Ok(())
}

fn set_counterparty_field(
    party: &mut Counterparty,
    field: &str,
    name: &str,
    value: &str,
) -> EditResult {
    let target = match name {
        "name" => &mut party.name,
        "company" => &mut party.company,
        "address" => &mut party.address,
        "email" => &mut party.email,
        "phone" => &mut party.phone,
        _ => return Err(unknown_field(field)),
    };
    *target = value.to_string();
    Ok(())
}

fn option_mut(
    proposal: &mut HostingProposal,
    index: usize,
) -> Result<&mut HostingOption, ValidationErrors> {
    check_index("options", index, proposal.options.len())?;
    Ok(&mut proposal.options[index])
}

fn check_index(field: &str, index: usize, len: usize) -> EditResult {
    if index < len {
        Ok(())
    } else {
        Err(ValidationErrors::single(
            field,
            format!("no entry at position {index}"),
        ))
    }
}

fn parse_index(field: &str, raw: &str, len: usize) -> Result<usize, ValidationErrors> {
    let index: usize = raw.parse().map_err(|_| unknown_field(field))?;
    if index < len {
        Ok(index)
    } else {
        Err(ValidationErrors::single(
            field,
            format!("no entry at position {index}"),
        ))
    }
}

/// Blank numeric inputs read as zero so a cleared field never blocks editing.
fn parse_amount(field: &str, value: &str) -> Result<Decimal, ValidationErrors> {
    let trimmed = value.trim().trim_start_matches('$').replace(',', "");
    if trimmed.is_empty() {
        return Ok(Decimal::ZERO);
    }

    trimmed
        .parse::<Decimal>()
        .map_err(|_| ValidationErrors::single(field, "enter a number"))
}

fn parse_non_negative(field: &str, value: &str, what: &str) -> Result<Decimal, ValidationErrors> {
    let amount = parse_amount(field, value)?;
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(ValidationErrors::single(
            field,
            format!("{what} cannot be negative"),
        ));
    }
    Ok(amount)
}

fn parse_date(field: &str, value: &str) -> Result<Option<NaiveDate>, ValidationErrors> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| ValidationErrors::single(field, "use YYYY-MM-DD"))
}

fn parse_bool(field: &str, value: &str) -> Result<bool, ValidationErrors> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "on" | "1" | "yes" => Ok(true),
        "false" | "off" | "0" | "no" | "" => Ok(false),
        _ => Err(ValidationErrors::single(field, "expected true or false")),
    }
}

fn unknown_field(field: &str) -> ValidationErrors {
    ValidationErrors::single(field, "unknown field")
}

fn unsupported(edit: &DocumentEdit, kind: &str) -> ValidationErrors {
    ValidationErrors::single("op", format!("{edit:?} does not apply to a {kind}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn set(field: &str, value: &str) -> DocumentEdit {
        DocumentEdit::Set {
            field: field.to_string(),
            value: value.to_string(),
        }
    }

    fn invoice_document() -> Document {
        Document::from(Invoice {
            line_items: vec![LineItem::blank()],
            ..Invoice::default()
        })
    }

    #[test]
    fn line_item_edits_flow_into_totals() {
        let mut document = invoice_document();
        apply_edit(&mut document, &set("lineItems.0.quantity", "2")).unwrap();
        apply_edit(&mut document, &set("lineItems.0.rate", "$75.00")).unwrap();
        apply_edit(&mut document, &set("taxRate", "10")).unwrap();

        let totals = document.totals().unwrap();
        assert_eq!(totals.total, Decimal::from(165));
    }

    #[test]
    fn rejected_edit_leaves_document_untouched() {
        let mut document = invoice_document();
        let before = document.clone();

        let errors = apply_edit(&mut document, &set("lineItems.0.rate", "-4")).unwrap_err();
        assert_eq!(errors.errors[0].field, "lineItems.0.rate");

        assert!(apply_edit(&mut document, &set("taxRate", "120")).is_err());
        assert!(apply_edit(&mut document, &set("lineItems.3.rate", "1")).is_err());
        assert!(apply_edit(&mut document, &set("nonsense", "1")).is_err());
        assert_eq!(document, before);
    }

    #[test]
    fn payment_handles_are_classified_on_entry() {
        let mut document = invoice_document();
        apply_edit(&mut document, &set("paymentMethods.venmo.handle", "@studio")).unwrap();
        apply_edit(&mut document, &set("paymentMethods.venmo.enabled", "on")).unwrap();
        apply_edit(&mut document, &set("paymentMethods.paypal.handle", "pay@studio.test")).unwrap();

        let Document::Invoice(invoice) = &document else {
            panic!("expected invoice");
        };
        assert!(invoice.payment_methods.venmo.enabled);
        assert_eq!(
            invoice.payment_methods.venmo.handle,
            PaymentHandle::Handle("studio".to_string())
        );
        assert_eq!(
            invoice.payment_methods.paypal.handle,
            PaymentHandle::Email("pay@studio.test".to_string())
        );
    }

    #[test]
    fn clearing_due_date_removes_it() {
        let mut document = invoice_document();
        apply_edit(&mut document, &set("dueDate", "2026-11-01")).unwrap();
        apply_edit(&mut document, &set("dueDate", "")).unwrap();

        let Document::Invoice(invoice) = &document else {
            panic!("expected invoice");
        };
        assert_eq!(invoice.due_date, None);
    }

    #[test]
    fn proposal_options_are_built_up_and_relabelled() {
        let mut document = Document::from(HostingProposal::default());
        apply_edit(&mut document, &DocumentEdit::AddOption).unwrap();
        apply_edit(&mut document, &DocumentEdit::AddOption).unwrap();
        apply_edit(&mut document, &DocumentEdit::AddBullet { option: 1 }).unwrap();
        apply_edit(&mut document, &set("options.1.bullets.0", "Daily backups")).unwrap();
        apply_edit(&mut document, &DocumentEdit::AddProvider { option: 1 }).unwrap();
        apply_edit(&mut document, &set("options.1.providers.0.monthlyCost", "12.50")).unwrap();
        apply_edit(&mut document, &DocumentEdit::RemoveOption { index: 0 }).unwrap();

        let Document::HostingProposal(proposal) = &document else {
            panic!("expected proposal");
        };
        assert_eq!(proposal.options.len(), 1);
        assert_eq!(proposal.options[0].label, "Option A");
        assert_eq!(proposal.options[0].bullets, vec!["Daily backups".to_string()]);
        assert_eq!(
            proposal.options[0].providers[0].monthly_cost,
            Some(Decimal::new(1250, 2))
        );
    }

    #[test]
    fn invoice_ops_do_not_apply_to_proposals() {
        let mut document = Document::from(HostingProposal::default());
        assert!(apply_edit(&mut document, &DocumentEdit::AddLineItem).is_err());
    }
}
