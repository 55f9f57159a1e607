use std::fmt::Display;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use backoffice_core::{Document, StoreError, ValidationErrors};
use backoffice_delivery::{DeliveryError, SessionError};
use backoffice_platform::ErrorBody;
use backoffice_render::RenderError;
use tracing::error;

/// Error returned by every JSON handler, rendered as `{message, errors?, document?}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody {
                message: message.into(),
                errors: Vec::new(),
                document: None,
            },
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn with_document(mut self, document: Document) -> Self {
        self.body.document = Some(document);
        self
    }
}

pub fn invalid_request(message: impl Into<String>) -> ApiError {
    ApiError::new(StatusCode::BAD_REQUEST, message)
}

pub fn not_found(message: impl Into<String>) -> ApiError {
    ApiError::new(StatusCode::NOT_FOUND, message)
}

pub fn internal_error<E: Display>(err: E) -> ApiError {
    error!("request failed: {err}");
    ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            body: ErrorBody {
                message: errors.summary(),
                errors: errors.errors,
                document: None,
            },
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { .. } | StoreError::KindMismatch { .. } => {
                not_found(err.to_string())
            }
            StoreError::Backend(_) | StoreError::Serialization(_) => {
                error!("save failed: {err}");
                ApiError::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "save failed; please try again",
                )
            }
        }
    }
}

impl From<RenderError> for ApiError {
    fn from(err: RenderError) -> Self {
        internal_error(err)
    }
}

impl From<DeliveryError> for ApiError {
    fn from(err: DeliveryError) -> Self {
        match err {
            DeliveryError::NotConfigured => internal_error(err),
            DeliveryError::Rejected { .. } | DeliveryError::Transport(_) => {
                error!("email delivery failed: {err}");
                ApiError::new(StatusCode::BAD_GATEWAY, err.to_string())
            }
        }
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Validation(errors) => errors.into(),
            SessionError::Store(err) => err.into(),
            SessionError::Delivery(err) => err.into(),
            SessionError::Render(err) => err.into(),
            SessionError::PopupBlocked(err) => internal_error(err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
