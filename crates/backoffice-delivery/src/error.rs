use backoffice_core::{StoreError, ValidationErrors};
use backoffice_render::RenderError;

#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("email delivery is not configured")]
    NotConfigured,
    #[error("email provider rejected the message ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("email provider unreachable: {0}")]
    Transport(#[from] reqwest::Error),
}

/// The print surface could not be opened, usually because the browser blocked the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("the print window was blocked; allow popups for this site and try again")]
pub struct PopupBlocked;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    #[error("save failed: {0}")]
    Store(#[from] StoreError),
    #[error(transparent)]
    Delivery(#[from] DeliveryError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    PopupBlocked(#[from] PopupBlocked),
}
