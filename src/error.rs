//! Handler error type.
//!
//! Range and auth outcomes are ordinary values; only genuine failures end up here.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::routing::RoutingError;
use crate::selection::SelectionError;
use crate::templates::TemplateError;

/// Failure raised by an endpoint handler.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// The client sent something the endpoint cannot interpret.
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Internal(String),

    /// Reverse construction failed: a handler referenced a route wrongly.
    #[error(transparent)]
    Routing(#[from] RoutingError),

    /// A choice set reached the selector in an invalid state.
    #[error(transparent)]
    Selection(#[from] SelectionError),

    #[error(transparent)]
    Template(#[from] TemplateError),
}

impl HandlerError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        HandlerError::BadRequest(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            HandlerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            HandlerError::Internal(_)
            | HandlerError::Routing(_)
            | HandlerError::Selection(_)
            | HandlerError::Template(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Handler failed");
        } else {
            tracing::debug!(error = %self, "Rejected request");
        }
        (status, format!("{}\n", self)).into_response()
    }
}
