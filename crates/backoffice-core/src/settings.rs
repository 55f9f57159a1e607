use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{
    Client, Counterparty, HostingOption, HostingProposal, Invoice, Issuer, LineItem,
};
use crate::payments::PaymentMethods;

/// Issuer details and starting values for new documents. Loaded from settings, never
/// compiled in.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct DocumentDefaults {
    pub issuer: Issuer,
    pub payment_methods: PaymentMethods,
    pub tax_rate: Decimal,
    pub payment_terms_days: i64,
    pub invoice_number_prefix: String,
    pub notes: String,
    pub terms: String,
    pub proposal_intro: String,
    pub proposal_closing_notes: String,
}

impl Default for DocumentDefaults {
    fn default() -> Self {
        Self {
            issuer: Issuer::default(),
            payment_methods: PaymentMethods::default(),
            tax_rate: Decimal::ZERO,
            payment_terms_days: 30,
            invoice_number_prefix: "INV-".to_string(),
            notes: String::new(),
            terms: String::new(),
            proposal_intro: String::new(),
            proposal_closing_notes: String::new(),
        }
    }
}

impl DocumentDefaults {
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).context("document defaults are not valid JSON")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read document defaults from {}", path.display()))?;
        Self::from_json(&raw)
    }

    pub fn invoice_number(&self, sequence: u64) -> String {
        format!("{}{:04}", self.invoice_number_prefix, sequence)
    }

    pub fn draft_invoice(
        &self,
        today: NaiveDate,
        sequence: u64,
        client: Option<&Client>,
    ) -> Invoice {
        let due_date = (self.payment_terms_days > 0)
            .then(|| today + Duration::days(self.payment_terms_days));

        Invoice {
            invoice_number: self.invoice_number(sequence),
            issue_date: today,
            due_date,
            client_id: client.map(|client| client.id),
            issuer: self.issuer.clone(),
            bill_to: client.map(Counterparty::from).unwrap_or_default(),
            line_items: vec![LineItem::blank()],
            tax_rate: self.tax_rate,
            payment_methods: self.payment_methods.clone(),
            notes: self.notes.clone(),
            terms: self.terms.clone(),
            ..Invoice::default()
        }
    }

    pub fn draft_proposal(&self, today: NaiveDate, client: Option<&Client>) -> HostingProposal {
        let prepared_for = client.map(Counterparty::from).unwrap_or_default();
        let title = match prepared_for.display_label() {
            label if label.is_empty() => "Hosting options".to_string(),
            label => format!("Hosting options for {label}"),
        };

        HostingProposal {
            title,
            proposal_date: today,
            client_id: client.map(|client| client.id),
            prepared_by: self.issuer.clone(),
            prepared_for,
            intro: self.proposal_intro.clone(),
            options: vec![HostingOption::labelled(0)],
            closing_notes: self.proposal_closing_notes.clone(),
            ..HostingProposal::default()
        }
    }
}

/// Source of the defaults injected at document creation.
pub trait SettingsProvider: Send + Sync {
    fn document_defaults(&self) -> DocumentDefaults;
}

impl SettingsProvider for DocumentDefaults {
    fn document_defaults(&self) -> DocumentDefaults {
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ClientStatus;
    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use uuid::Uuid;

    fn client() -> Client {
        let now = Utc::now();
        Client {
            id: Uuid::new_v4(),
            name: "Dana Reyes".to_string(),
            company: "Reyes Bakery".to_string(),
            email: "dana@reyesbakery.test".to_string(),
            phone: String::new(),
            address: "12 Main St".to_string(),
            status: ClientStatus::Active,
            notes: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn defaults_parse_from_partial_json() {
        let defaults = DocumentDefaults::from_json(
            r#"{
                "issuer": {"name": "North Studio", "email": "hello@north.test"},
                "taxRate": "8.25",
                "paymentMethods": {"venmo": {"enabled": true, "handle": {"kind": "handle", "value": "north"}}}
            }"#,
        )
        .unwrap();

        assert_eq!(defaults.issuer.name, "North Studio");
        assert_eq!(defaults.tax_rate, Decimal::new(825, 2));
        assert!(defaults.payment_methods.venmo.enabled);
        assert_eq!(defaults.payment_terms_days, 30);
    }

    #[test]
    fn draft_invoice_copies_client_fields() {
        let defaults = DocumentDefaults::default();
        let today = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let client = client();

        let invoice = defaults.draft_invoice(today, 7, Some(&client));

        assert_eq!(invoice.invoice_number, "INV-0007");
        assert_eq!(invoice.due_date, NaiveDate::from_ymd_opt(2026, 3, 31));
        assert_eq!(invoice.client_id, Some(client.id));
        assert_eq!(invoice.bill_to.company, "Reyes Bakery");
        assert_eq!(invoice.line_items.len(), 1);
        assert!(invoice.meta.id.is_none());
    }

    #[test]
    fn draft_proposal_titles_after_client() {
        let defaults = DocumentDefaults::default();
        let today = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();

        let proposal = defaults.draft_proposal(today, Some(&client()));
        assert_eq!(proposal.title, "Hosting options for Reyes Bakery");
        assert_eq!(proposal.options[0].label, "Option A");

        let anonymous = defaults.draft_proposal(today, None);
        assert_eq!(anonymous.title, "Hosting options");
    }
}
