use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::Invoice;
use crate::totals::fixed_2;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum PaymentMethodKind {
    PayPal,
    Venmo,
    CashApp,
    Check,
    Bank,
}

impl PaymentMethodKind {
    pub const ALL: [PaymentMethodKind; 5] = [
        Self::PayPal,
        Self::Venmo,
        Self::CashApp,
        Self::Check,
        Self::Bank,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::PayPal => "PayPal",
            Self::Venmo => "Venmo",
            Self::CashApp => "Cash App",
            Self::Check => "Check",
            Self::Bank => "Bank Transfer (ACH)",
        }
    }

    /// Field-path segment used by form edits (`paymentMethods.<key>.<field>`).
    pub fn key(&self) -> &'static str {
        match self {
            Self::PayPal => "paypal",
            Self::Venmo => "venmo",
            Self::CashApp => "cashApp",
            Self::Check => "check",
            Self::Bank => "bank",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.key() == key)
    }

    /// Sigil users habitually type in front of the handle.
    fn sigil(&self) -> Option<char> {
        match self {
            Self::Venmo => Some('@'),
            Self::CashApp => Some('$'),
            _ => None,
        }
    }
}

/// A payment handle classified when it is entered, not when it is rendered.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum PaymentHandle {
    Email(String),
    Handle(String),
}

impl Default for PaymentHandle {
    fn default() -> Self {
        Self::Handle(String::new())
    }
}

impl PaymentHandle {
    pub fn parse(method: PaymentMethodKind, raw: &str) -> Self {
        let mut value = raw.trim();
        if let Some(sigil) = method.sigil() {
            value = value.strip_prefix(sigil).unwrap_or(value).trim();
        }

        if value.contains('@') {
            Self::Email(value.to_string())
        } else {
            Self::Handle(value.to_string())
        }
    }

    pub fn raw(&self) -> &str {
        match self {
            Self::Email(value) | Self::Handle(value) => value,
        }
    }

    /// Account name a payment provider understands. Emails contribute their local part,
    /// which is a guess at the username rather than a verified mapping.
    pub fn account(&self) -> Option<&str> {
        let account = match self {
            Self::Email(value) => value.split('@').next().unwrap_or_default(),
            Self::Handle(value) => value.as_str(),
        }
        .trim();

        (!account.is_empty()).then_some(account)
    }

    pub fn is_empty(&self) -> bool {
        self.account().is_none()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct LinkedMethod {
    pub enabled: bool,
    pub handle: PaymentHandle,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct CheckMethod {
    pub enabled: bool,
    pub payable_to: String,
    pub mailing_address: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct BankMethod {
    pub enabled: bool,
    pub bank_name: String,
    pub account_name: String,
    pub routing_number: String,
    pub account_number: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct PaymentMethods {
    pub paypal: LinkedMethod,
    pub venmo: LinkedMethod,
    pub cash_app: LinkedMethod,
    pub check: CheckMethod,
    pub bank: BankMethod,
}

impl PaymentMethods {
    pub fn linked(&self, kind: PaymentMethodKind) -> Option<&LinkedMethod> {
        match kind {
            PaymentMethodKind::PayPal => Some(&self.paypal),
            PaymentMethodKind::Venmo => Some(&self.venmo),
            PaymentMethodKind::CashApp => Some(&self.cash_app),
            PaymentMethodKind::Check | PaymentMethodKind::Bank => None,
        }
    }

    pub fn linked_mut(&mut self, kind: PaymentMethodKind) -> Option<&mut LinkedMethod> {
        match kind {
            PaymentMethodKind::PayPal => Some(&mut self.paypal),
            PaymentMethodKind::Venmo => Some(&mut self.venmo),
            PaymentMethodKind::CashApp => Some(&mut self.cash_app),
            PaymentMethodKind::Check | PaymentMethodKind::Bank => None,
        }
    }

    pub fn is_enabled(&self, kind: PaymentMethodKind) -> bool {
        match kind {
            PaymentMethodKind::Check => self.check.enabled,
            PaymentMethodKind::Bank => self.bank.enabled,
            linked => self.linked(linked).is_some_and(|method| method.enabled),
        }
    }

    pub fn set_enabled(&mut self, kind: PaymentMethodKind, enabled: bool) {
        match kind {
            PaymentMethodKind::Check => self.check.enabled = enabled,
            PaymentMethodKind::Bank => self.bank.enabled = enabled,
            linked => {
                if let Some(method) = self.linked_mut(linked) {
                    method.enabled = enabled;
                }
            }
        }
    }
}

/// Deep link into a payment provider, or `None` when the method has no link form or the
/// handle is empty.
pub fn build_payment_link(
    method: PaymentMethodKind,
    handle: &PaymentHandle,
    amount: Decimal,
    invoice_number: &str,
) -> Option<String> {
    let account = handle.account()?;
    let account = urlencoding::encode(account);

    match method {
        PaymentMethodKind::PayPal => Some(format!("https://paypal.me/{account}")),
        PaymentMethodKind::Venmo => {
            let note = payment_note(invoice_number);
            Some(format!(
                "https://venmo.com/{account}?txn=pay&amount={}&note={}",
                fixed_2(amount),
                urlencoding::encode(&note)
            ))
        }
        PaymentMethodKind::CashApp => {
            Some(format!("https://cash.app/${account}/{}", fixed_2(amount)))
        }
        PaymentMethodKind::Check | PaymentMethodKind::Bank => None,
    }
}

fn payment_note(invoice_number: &str) -> String {
    let number = invoice_number.trim();
    if number.is_empty() {
        "Invoice payment".to_string()
    } else {
        format!("Invoice {number}")
    }
}

/// Last four digits behind a mask. Never returns the full number.
pub fn mask_account_number(raw: &str) -> Option<String> {
    let digits: Vec<char> = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }

    let tail: String = digits[digits.len().saturating_sub(4)..].iter().collect();
    Some(format!("••••{tail}"))
}

/// One payment method as every renderer shows it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentOption {
    pub method: PaymentMethodKind,
    pub label: &'static str,
    pub link: Option<String>,
    pub call_to_action: Option<String>,
    pub details: Vec<String>,
}

/// The payment methods that appear on an invoice, in display order. This is the single
/// inclusion rule every rendering target consumes.
pub fn payment_options(invoice: &Invoice, amount: Decimal) -> Vec<PaymentOption> {
    let methods = &invoice.payment_methods;
    let mut options = Vec::new();

    for kind in PaymentMethodKind::ALL {
        if !methods.is_enabled(kind) {
            continue;
        }

        let option = match kind {
            PaymentMethodKind::Check => check_option(&methods.check),
            PaymentMethodKind::Bank => bank_option(&methods.bank),
            linked => methods
                .linked(linked)
                .and_then(|method| linked_option(linked, method, amount, &invoice.invoice_number)),
        };

        if let Some(option) = option {
            options.push(option);
        }
    }

    options
}

fn linked_option(
    kind: PaymentMethodKind,
    method: &LinkedMethod,
    amount: Decimal,
    invoice_number: &str,
) -> Option<PaymentOption> {
    let link = build_payment_link(kind, &method.handle, amount, invoice_number)?;
    let account = method.handle.account()?;
    let shown = match kind {
        PaymentMethodKind::Venmo => format!("@{account}"),
        PaymentMethodKind::CashApp => format!("${account}"),
        _ => method.handle.raw().to_string(),
    };

    Some(PaymentOption {
        method: kind,
        label: kind.label(),
        link: Some(link),
        call_to_action: Some(format!("Pay with {}", kind.label())),
        details: vec![shown],
    })
}

fn check_option(method: &CheckMethod) -> Option<PaymentOption> {
    let payable_to = method.payable_to.trim();
    if payable_to.is_empty() {
        return None;
    }

    let mut details = vec![format!("Payable to: {payable_to}")];
    let address = method.mailing_address.trim();
    if !address.is_empty() {
        details.push(format!("Mail to: {address}"));
    }

    Some(PaymentOption {
        method: PaymentMethodKind::Check,
        label: PaymentMethodKind::Check.label(),
        link: None,
        call_to_action: None,
        details,
    })
}

fn bank_option(method: &BankMethod) -> Option<PaymentOption> {
    let masked = mask_account_number(&method.account_number)?;

    let mut details = Vec::new();
    if !method.bank_name.trim().is_empty() {
        details.push(format!("Institution: {}", method.bank_name.trim()));
    }
    if !method.account_name.trim().is_empty() {
        details.push(format!("Account name: {}", method.account_name.trim()));
    }
    if !method.routing_number.trim().is_empty() {
        details.push(format!("Routing: {}", method.routing_number.trim()));
    }
    details.push(format!("Account: {masked}"));

    Some(PaymentOption {
        method: PaymentMethodKind::Bank,
        label: PaymentMethodKind::Bank.label(),
        link: None,
        call_to_action: None,
        details,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn amount(value: &str) -> Decimal {
        value.parse().unwrap()
    }

    #[test]
    fn venmo_email_uses_local_part_and_fixed_amount() {
        let handle = PaymentHandle::parse(PaymentMethodKind::Venmo, "user@example.com");
        let link =
            build_payment_link(PaymentMethodKind::Venmo, &handle, amount("42.5"), "INV-1").unwrap();

        assert!(link.contains("venmo.com/user"));
        assert!(link.contains("amount=42.50"));
        assert!(link.contains("note=Invoice%20INV-1"));
    }

    #[rstest]
    #[case(PaymentMethodKind::PayPal)]
    #[case(PaymentMethodKind::Venmo)]
    #[case(PaymentMethodKind::CashApp)]
    fn empty_handle_produces_no_link(#[case] method: PaymentMethodKind) {
        let handle = PaymentHandle::parse(method, "");
        assert_eq!(
            build_payment_link(method, &handle, amount("10"), "INV-1"),
            None
        );
    }

    #[rstest]
    #[case(PaymentMethodKind::PayPal, "studio@example.com", "https://paypal.me/studio")]
    #[case(PaymentMethodKind::PayPal, "studiohandle", "https://paypal.me/studiohandle")]
    #[case(PaymentMethodKind::CashApp, "$studio", "https://cash.app/$studio/19.99")]
    #[case(PaymentMethodKind::CashApp, "studio@example.com", "https://cash.app/$studio/19.99")]
    #[case(
        PaymentMethodKind::Venmo,
        "@studio",
        "https://venmo.com/studio?txn=pay&amount=19.99&note=Invoice%20INV-7"
    )]
    fn provider_links(
        #[case] method: PaymentMethodKind,
        #[case] raw: &str,
        #[case] expected: &str,
    ) {
        let handle = PaymentHandle::parse(method, raw);
        assert_eq!(
            build_payment_link(method, &handle, amount("19.99"), "INV-7").as_deref(),
            Some(expected)
        );
    }

    #[test]
    fn check_and_bank_never_link() {
        let handle = PaymentHandle::parse(PaymentMethodKind::Check, "anything");
        assert_eq!(
            build_payment_link(PaymentMethodKind::Check, &handle, amount("1"), "INV-1"),
            None
        );
        assert_eq!(
            build_payment_link(PaymentMethodKind::Bank, &handle, amount("1"), "INV-1"),
            None
        );
    }

    #[test]
    fn handles_are_classified_at_input() {
        assert_eq!(
            PaymentHandle::parse(PaymentMethodKind::Venmo, " @studio "),
            PaymentHandle::Handle("studio".to_string())
        );
        assert_eq!(
            PaymentHandle::parse(PaymentMethodKind::CashApp, "$tag"),
            PaymentHandle::Handle("tag".to_string())
        );
        assert_eq!(
            PaymentHandle::parse(PaymentMethodKind::PayPal, "me@example.com"),
            PaymentHandle::Email("me@example.com".to_string())
        );
    }

    #[test]
    fn account_numbers_are_masked_to_last_four() {
        assert_eq!(
            mask_account_number("000123456789").as_deref(),
            Some("••••6789")
        );
        assert_eq!(mask_account_number("12").as_deref(), Some("••••12"));
        assert_eq!(mask_account_number("  "), None);
    }

    #[test]
    fn disabled_and_empty_methods_are_left_out() {
        let mut invoice = Invoice::default();
        invoice.payment_methods.venmo = LinkedMethod {
            enabled: false,
            handle: PaymentHandle::parse(PaymentMethodKind::Venmo, "@studio"),
        };
        invoice.payment_methods.paypal = LinkedMethod {
            enabled: true,
            handle: PaymentHandle::default(),
        };
        invoice.payment_methods.cash_app = LinkedMethod {
            enabled: true,
            handle: PaymentHandle::parse(PaymentMethodKind::CashApp, "$studio"),
        };
        invoice.payment_methods.bank = BankMethod {
            enabled: true,
            bank_name: "First Local".to_string(),
            account_number: "9876543210".to_string(),
            ..BankMethod::default()
        };

        let options = payment_options(&invoice, amount("50"));
        let kinds: Vec<_> = options.iter().map(|option| option.method).collect();
        assert_eq!(
            kinds,
            vec![PaymentMethodKind::CashApp, PaymentMethodKind::Bank]
        );

        let bank = &options[1];
        assert!(bank.details.iter().all(|line| !line.contains("9876543210")));
        assert!(bank.details.contains(&"Account: ••••3210".to_string()));
    }
}
