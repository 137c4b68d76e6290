//! Request failures and the status each one maps to.

use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum_extra::headers::{ContentRange, HeaderMapExt};
use thiserror::Error;

use crate::headers;
use crate::range::RangeNotSatisfiable;

/// Why an `archive-url` was refused.
#[derive(Debug, Error)]
pub enum ReferenceError {
    #[error("missing `{0}` query parameter")]
    Missing(&'static str),

    #[error("malformed url: {0}")]
    Malformed(#[from] url::ParseError),

    #[error("unsupported scheme `{0}`")]
    UnsupportedScheme(String),

    #[error("path `{0}` does not end in an accepted archive suffix")]
    UnsupportedSuffix(String),

    #[error("url has no host")]
    MissingHost,

    #[error("host `{0}` is not allowed")]
    HostNotAllowed(String),
}

/// Failure talking to the origin. Both variants surface as `404`.
#[derive(Debug, Error)]
pub enum OriginError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("origin responded {0}")]
    Status(StatusCode),
}

/// Terminal error for a single proxied request.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("method {0} not allowed")]
    MethodNotAllowed(Method),

    #[error("invalid archive reference: {0}")]
    InvalidReference(#[from] ReferenceError),

    #[error("origin unreachable: {0}")]
    OriginUnreachable(#[from] OriginError),

    #[error(transparent)]
    RangeNotSatisfiable(#[from] RangeNotSatisfiable),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            ProxyError::InvalidReference(_) => StatusCode::BAD_REQUEST,
            ProxyError::OriginUnreachable(_) => StatusCode::NOT_FOUND,
            ProxyError::RangeNotSatisfiable(_) => StatusCode::RANGE_NOT_SATISFIABLE,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status();
        tracing::warn!(%status, error = %self, "request failed");

        let mut headers = headers::error_headers();
        if let ProxyError::RangeNotSatisfiable(unsatisfied) = &self {
            headers.typed_insert(ContentRange::unsatisfied_bytes(unsatisfied.complete_length));
        }
        (status, headers, ()).into_response()
    }
}
