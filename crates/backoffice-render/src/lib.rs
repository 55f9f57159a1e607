//! HTML renderings of commercial documents: the interactive edit view, the standalone
//! print document and the transactional email body, plus the public share pages.

pub mod sections;
mod view;

use askama::Template;
use backoffice_core::{Document, DocumentKind, Invoice, PaymentMethodKind};
use serde::Serialize;

pub use sections::{Section, is_included, sections};
use view::DocumentView;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RenderTarget {
    Edit,
    Print,
    Email,
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("template rendering failed: {0}")]
    Template(#[from] askama::Error),
}

pub type RenderResult<T> = Result<T, RenderError>;

#[derive(Template)]
#[template(path = "edit.html")]
struct EditTemplate<'a> {
    doc: &'a DocumentView,
}

#[derive(Template)]
#[template(path = "print.html")]
struct PrintTemplate<'a> {
    doc: &'a DocumentView,
    auto_print: bool,
}

#[derive(Template)]
#[template(path = "email.html")]
struct EmailTemplate<'a> {
    doc: &'a DocumentView,
}

#[derive(Template)]
#[template(path = "not_found.html")]
struct NotFoundTemplate {
    kind_label: &'static str,
}

#[derive(Template)]
#[template(path = "payment_settings.html")]
struct PaymentSettingsTemplate {
    methods: Vec<MethodSettings>,
}

struct SettingField {
    path: String,
    label: &'static str,
    value: String,
}

struct MethodSettings {
    key: &'static str,
    label: &'static str,
    enabled: bool,
    fields: Vec<SettingField>,
}

/// Renders `document` for one target. Section inclusion comes from [`sections`], so every
/// target shows the same blocks and the same payment methods.
pub fn render(document: &Document, target: RenderTarget) -> RenderResult<String> {
    let doc = DocumentView::new(document);
    let html = match target {
        RenderTarget::Edit => EditTemplate { doc: &doc }.render()?,
        RenderTarget::Print => PrintTemplate {
            doc: &doc,
            auto_print: true,
        }
        .render()?,
        RenderTarget::Email => EmailTemplate { doc: &doc }.render()?,
    };

    Ok(html)
}

/// Read-only page served at a share link. Same layout as the print document, without
/// triggering the print dialog.
pub fn render_share_page(document: &Document) -> RenderResult<String> {
    let doc = DocumentView::new(document);
    Ok(PrintTemplate {
        doc: &doc,
        auto_print: false,
    }
    .render()?)
}

pub fn render_not_found(kind: DocumentKind) -> RenderResult<String> {
    Ok(NotFoundTemplate {
        kind_label: kind.label(),
    }
    .render()?)
}

pub fn email_subject(document: &Document) -> String {
    let sender = document.issuer().name.trim();
    match (document, sender.is_empty()) {
        (Document::Invoice(invoice), true) => invoice.display_label(),
        (Document::Invoice(invoice), false) => {
            format!("{} from {sender}", invoice.display_label())
        }
        (Document::HostingProposal(proposal), _) => proposal.display_label(),
    }
}

fn setting(path: String, label: &'static str, value: &str) -> SettingField {
    SettingField {
        path,
        label,
        value: value.to_string(),
    }
}

/// The payment-method settings panel shown beside the edit view. Unlike the document
/// renderings it lists every method, including disabled ones, so they can be toggled.
pub fn render_payment_settings(invoice: &Invoice) -> RenderResult<String> {
    let stored = &invoice.payment_methods;
    let methods = PaymentMethodKind::ALL
        .into_iter()
        .map(|kind| {
            let prefix = format!("paymentMethods.{}", kind.key());
            let fields = match kind {
                PaymentMethodKind::Check => vec![
                    setting(format!("{prefix}.payableTo"), "Payable to", &stored.check.payable_to),
                    setting(
                        format!("{prefix}.mailingAddress"),
                        "Mailing address",
                        &stored.check.mailing_address,
                    ),
                ],
                PaymentMethodKind::Bank => vec![
                    setting(format!("{prefix}.bankName"), "Institution", &stored.bank.bank_name),
                    setting(
                        format!("{prefix}.accountName"),
                        "Account name",
                        &stored.bank.account_name,
                    ),
                    setting(
                        format!("{prefix}.routingNumber"),
                        "Routing number",
                        &stored.bank.routing_number,
                    ),
                    setting(
                        format!("{prefix}.accountNumber"),
                        "Account number",
                        &stored.bank.account_number,
                    ),
                ],
                linked => vec![setting(
                    format!("{prefix}.handle"),
                    "Handle or email",
                    stored
                        .linked(linked)
                        .map(|method| method.handle.raw())
                        .unwrap_or_default(),
                )],
            };

            MethodSettings {
                key: kind.key(),
                label: kind.label(),
                enabled: stored.is_enabled(kind),
                fields,
            }
        })
        .collect();

    Ok(PaymentSettingsTemplate { methods }.render()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use backoffice_core::{
        Counterparty, HostingOption, HostingProposal, LineItem, PaymentHandle, ProviderRecord,
    };
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    const TARGETS: [RenderTarget; 3] =
        [RenderTarget::Edit, RenderTarget::Print, RenderTarget::Email];

    fn markers<'a>(html: &'a str, attribute: &str) -> Vec<&'a str> {
        let needle = format!("{attribute}=\"");
        html.match_indices(&needle)
            .filter_map(|(start, _)| {
                let rest = &html[start + needle.len()..];
                rest.find('"').map(|end| &rest[..end])
            })
            .collect()
    }

    fn invoice() -> Invoice {
        let mut invoice = Invoice {
            invoice_number: "INV-0042".to_string(),
            bill_to: Counterparty {
                name: "Dana Reyes".to_string(),
                company: "Reyes Bakery".to_string(),
                email: "dana@reyesbakery.test".to_string(),
                ..Counterparty::default()
            },
            line_items: vec![LineItem {
                id: Uuid::new_v4(),
                description: "Design retainer".to_string(),
                quantity: Decimal::from(2),
                rate: Decimal::from(75),
            }],
            tax_rate: Decimal::TEN,
            notes: "Thank you for your business.".to_string(),
            ..Invoice::default()
        };
        invoice.issuer.name = "North Studio".to_string();
        invoice.payment_methods.venmo.enabled = true;
        invoice.payment_methods.venmo.handle =
            PaymentHandle::parse(PaymentMethodKind::Venmo, "user@example.com");
        invoice.payment_methods.paypal.enabled = false;
        invoice.payment_methods.paypal.handle =
            PaymentHandle::parse(PaymentMethodKind::PayPal, "northstudio");
        invoice.payment_methods.check.enabled = false;
        invoice.payment_methods.check.payable_to = "North Studio LLC".to_string();
        invoice
    }

    fn proposal() -> HostingProposal {
        let mut option = HostingOption::labelled(0);
        option.title = "Managed WordPress".to_string();
        option.recommended = true;
        option.bullets = vec!["Daily backups".to_string()];
        option.providers = vec![ProviderRecord {
            name: "Kinsta".to_string(),
            plan: "Starter".to_string(),
            monthly_cost: Some(Decimal::from(35)),
            ..ProviderRecord::default()
        }];

        HostingProposal {
            title: "Hosting options for Reyes Bakery".to_string(),
            intro: "Here are the options we discussed.".to_string(),
            options: vec![option],
            ..HostingProposal::default()
        }
    }

    #[test]
    fn every_target_renders_the_same_sections() {
        for document in [Document::from(invoice()), Document::from(proposal())] {
            let expected: Vec<&str> = sections(&document).iter().map(Section::marker).collect();
            for target in TARGETS {
                let html = render(&document, target).unwrap();
                assert_eq!(markers(&html, "data-section"), expected, "{target:?}");
            }
        }
    }

    #[test]
    fn optional_invoice_sections_follow_content() {
        let document = Document::from(invoice());
        let included = sections(&document);
        assert!(included.contains(&Section::Notes));
        assert!(!included.contains(&Section::Terms));
        assert!(included.contains(&Section::Payment));
    }

    #[test]
    fn disabled_methods_never_render() {
        let document = Document::from(invoice());
        for target in TARGETS {
            let html = render(&document, target).unwrap();
            assert_eq!(markers(&html, "data-payment"), vec!["venmo"], "{target:?}");
            assert!(!html.contains("PayPal"), "{target:?}");
            assert!(!html.contains("paypal.me"), "{target:?}");
            assert!(!html.contains("Payable to"), "{target:?}");
            assert!(!html.contains("North Studio LLC"), "{target:?}");
        }
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("@")]
    fn empty_handles_drop_the_payment_section(#[case] handle: &str) {
        let mut invoice = invoice();
        invoice.payment_methods.venmo.handle =
            PaymentHandle::parse(PaymentMethodKind::Venmo, handle);
        let document = Document::from(invoice);

        assert!(!is_included(&document, Section::Payment));
        for target in TARGETS {
            let html = render(&document, target).unwrap();
            assert!(!html.contains("Venmo"), "{target:?}");
            assert!(!html.contains("data-section=\"payment\""), "{target:?}");
        }
    }

    #[test]
    fn totals_are_formatted_identically() {
        let document = Document::from(invoice());
        for target in TARGETS {
            let html = render(&document, target).unwrap();
            for amount in ["$150.00", "$15.00", "$165.00"] {
                assert!(html.contains(amount), "{target:?} missing {amount}");
            }
        }
    }

    #[test]
    fn user_text_is_escaped() {
        let mut invoice = invoice();
        invoice.line_items[0].description = "<script>alert(1)</script>".to_string();
        let document = Document::from(invoice);

        for target in TARGETS {
            let html = render(&document, target).unwrap();
            assert!(!html.contains("<script>alert"), "{target:?}");
        }
    }

    #[test]
    fn blank_fields_render_placeholders() {
        let mut invoice = Invoice {
            line_items: vec![LineItem::blank()],
            ..Invoice::default()
        };
        invoice.bill_to = Counterparty::default();
        let html = render(&Document::from(invoice), RenderTarget::Print).unwrap();

        assert!(html.contains("Untitled item"));
        assert!(html.contains("Not specified"));
    }

    #[test]
    fn print_document_is_standalone() {
        let html = render(&Document::from(proposal()), RenderTarget::Print).unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<style>"));
        assert!(html.contains("window.print()"));

        let shared = render_share_page(&Document::from(proposal())).unwrap();
        assert!(!shared.contains("window.print()"));
        assert!(shared.contains("$35.00"));
    }

    #[test]
    fn email_body_uses_inline_styles_only() {
        let html = render(&Document::from(invoice()), RenderTarget::Email).unwrap();
        assert!(!html.contains("<style"));
        assert!(html.contains("Pay with Venmo"));
    }

    #[test]
    fn edit_view_names_inputs_by_field_path() {
        let html = render(&Document::from(invoice()), RenderTarget::Edit).unwrap();
        let fields = markers(&html, "data-field");
        assert!(fields.contains(&"billTo.email"));
        assert!(fields.contains(&"lineItems.0.rate"));
        assert!(fields.contains(&"taxRate"));
    }

    #[test]
    fn payment_settings_list_every_method() {
        let html = render_payment_settings(&invoice()).unwrap();
        assert_eq!(
            markers(&html, "data-method"),
            vec!["paypal", "venmo", "cashApp", "check", "bank"]
        );
        assert!(html.contains("North Studio LLC"));
    }

    #[test]
    fn not_found_page_mentions_expiry() {
        let html = render_not_found(DocumentKind::Invoice).unwrap();
        assert!(html.contains("Invoice not found"));
        assert!(html.contains("may have expired"));
    }

    #[test]
    fn subjects_name_the_sender() {
        assert_eq!(
            email_subject(&Document::from(invoice())),
            "Invoice INV-0042 from North Studio"
        );
        assert_eq!(
            email_subject(&Document::from(proposal())),
            "Hosting options for Reyes Bakery"
        );
    }

    #[test]
    fn provider_links_are_web_addresses_only() {
        let mut unsafe_link = proposal();
        unsafe_link.options[0].providers[0].url = "javascript:alert(1)".to_string();
        let mut web = proposal();
        web.options[0].providers[0].url = " https://kinsta.test/plans ".to_string();

        for target in [RenderTarget::Print, RenderTarget::Email] {
            let html = render(&Document::from(unsafe_link.clone()), target).unwrap();
            assert!(!html.contains("href=\"javascript:"), "{target:?}");
            assert!(html.contains("Kinsta"));

            let html = render(&Document::from(web.clone()), target).unwrap();
            assert!(html.contains("href=\"https:"), "{target:?}");
            assert!(html.contains("kinsta.test"));
        }
        assert!(
            !render_share_page(&Document::from(unsafe_link))
                .unwrap()
                .contains("href=\"javascript:")
        );
    }
}
