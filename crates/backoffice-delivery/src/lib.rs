//! Getting documents out of the back office: persistence on demand, share links, email
//! and print, plus the editor session that sequences them.

pub mod error;
pub mod mailer;
pub mod mailto;
pub mod service;
pub mod session;

pub use error::{DeliveryError, PopupBlocked, SessionError};
pub use mailer::{DisabledMailer, HttpMailer, Mailer, OutgoingEmail, SentEmail};
pub use mailto::mailto_draft;
pub use service::{DeliveryService, SendOutcome, mark_sent, send_recipient, share_url};
pub use session::{DocumentSession, PrintSurface, SessionStatus};
