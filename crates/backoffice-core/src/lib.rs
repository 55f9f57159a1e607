pub mod edits;
pub mod events;
pub mod models;
pub mod payments;
pub mod settings;
pub mod storage;
pub mod totals;
pub mod validation;

pub use edits::{DocumentEdit, apply_edit};
pub use events::{DocumentEvent, DocumentEventKind};
pub use models::{
    Client, ClientInput, ClientStatus, Counterparty, Document, DocumentKind, DocumentMeta,
    DocumentSummary, HostingOption, HostingProposal, Invoice, InvoiceStatus, Issuer, LineItem,
    ProviderRecord,
};
pub use payments::{
    PaymentHandle, PaymentMethodKind, PaymentMethods, PaymentOption, build_payment_link,
    payment_options,
};
pub use settings::{DocumentDefaults, SettingsProvider};
pub use storage::{
    ClientFilter, ClientStore, DocumentFilter, DocumentStore, StoreError, StoreResult,
};
pub use totals::{Totals, compute_totals, fixed_2, format_usd};
pub use validation::{
    FieldError, ValidationErrors, is_sendable, looks_like_email, validate_for_save,
    validate_for_send,
};
