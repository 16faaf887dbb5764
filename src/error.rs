use axum::response::{IntoResponse, Response};
use axum::Json;
use http::StatusCode;
use thiserror::Error;

use crate::models::ErrorBody;

/// Longest upstream body excerpt kept in an error (for server-side logs only).
const BODY_EXCERPT_LEN: usize = 512;

/// Failure talking to the completion service.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("upstream rejected credentials ({status}): {body}")]
    Auth { status: StatusCode, body: String },
    #[error("upstream rate limited the request: {body}")]
    RateLimited { body: String },
    #[error("upstream returned {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("upstream request timed out")]
    Timeout,
    #[error("upstream transport error: {0}")]
    Transport(String),
    #[error("malformed upstream response: {0}")]
    Malformed(String),
}

impl UpstreamError {
    /// Classify a non-success upstream status.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let body = excerpt(body);
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Self::Auth { status, body },
            StatusCode::TOO_MANY_REQUESTS => Self::RateLimited { body },
            _ => Self::Status { status, body },
        }
    }

    /// Short label used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Auth { .. } => "auth",
            Self::RateLimited { .. } => "rate_limited",
            Self::Status { .. } => "status",
            Self::Timeout => "timeout",
            Self::Transport(_) => "transport",
            Self::Malformed(_) => "malformed",
        }
    }

    /// Status returned to the caller.
    ///
    /// Timeouts are always 504. Everything else collapses to 500 unless
    /// `distinct` is set.
    pub fn status(&self, distinct: bool) -> StatusCode {
        match (self, distinct) {
            (Self::Timeout, _) => StatusCode::GATEWAY_TIMEOUT,
            (_, false) => StatusCode::INTERNAL_SERVER_ERROR,
            (Self::RateLimited { .. }, true) => StatusCode::SERVICE_UNAVAILABLE,
            (_, true) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            UpstreamError::Timeout
        } else if err.is_decode() {
            UpstreamError::Malformed(err.to_string())
        } else {
            UpstreamError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for UpstreamError {
    fn from(err: serde_json::Error) -> Self {
        UpstreamError::Malformed(err.to_string())
    }
}

fn excerpt(body: &str) -> String {
    match body.char_indices().nth(BODY_EXCERPT_LEN) {
        Some((idx, _)) => format!("{}…", &body[..idx]),
        None => body.to_string(),
    }
}

/// Error returned by a relay route.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Missing or blank request field; detected before any upstream call.
    #[error("{0}")]
    Validation(&'static str),
    /// The completion call failed. `public` is the route's generic message.
    #[error("{public}: {source}")]
    Upstream {
        public: &'static str,
        distinct_status: bool,
        #[source]
        source: UpstreamError,
    },
}

impl RelayError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Upstream {
                distinct_status,
                source,
                ..
            } => source.status(*distinct_status),
        }
    }

    /// Message safe to return to the caller. Never includes upstream detail.
    pub fn public_message(&self) -> &'static str {
        match self {
            Self::Validation(msg) => *msg,
            Self::Upstream { public, .. } => *public,
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            error: self.public_message().to_string(),
        };
        (status, Json(body)).into_response()
    }
}
