//! Request Outcome
//!
//! What a transport reports back for a completed request, before any
//! classification happens.

use thiserror::Error;

use super::request::HttpResponse;

/// Transport-level failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportErrorKind {
    /// The caller cancelled the request.
    Cancelled,
    TimedOut,
    CannotFindHost,
    DnsLookupFailed,
    CannotConnectToHost,
    NetworkConnectionLost,
    NotConnectedToInternet,
    /// TLS handshake or certificate failure.
    SecureConnectionFailed,
    Other,
}

impl TransportErrorKind {
    /// Whether this kind means the remote host could not be reached.
    pub fn is_connection_error(&self) -> bool {
        !matches!(self, Self::Cancelled | Self::Other)
    }
}

/// Error reported by the transport instead of (or alongside) a response.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind:?}: {message}")]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn cancelled() -> Self {
        Self::new(TransportErrorKind::Cancelled, "Request cancelled")
    }

    pub fn is_cancelled(&self) -> bool {
        self.kind == TransportErrorKind::Cancelled
    }

    pub fn is_connection_error(&self) -> bool {
        self.kind.is_connection_error()
    }
}

/// Raw outcome of one request attempt.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestOutcome {
    pub transport_error: Option<TransportError>,
    pub status: Option<u16>,
    pub body: Option<serde_json::Value>,
}

impl RequestOutcome {
    /// Outcome of a request that produced an HTTP response.
    ///
    /// A body that is not JSON is treated as absent.
    pub fn from_response(response: &HttpResponse) -> Self {
        let body = if response.body.trim().is_empty() {
            None
        } else {
            serde_json::from_str(&response.body).ok()
        };
        Self {
            transport_error: None,
            status: Some(response.status),
            body,
        }
    }

    /// Outcome of a request that failed below HTTP.
    pub fn from_transport_error(error: TransportError) -> Self {
        Self {
            transport_error: Some(error),
            ..Default::default()
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_transport_error(mut self, error: TransportError) -> Self {
        self.transport_error = Some(error);
        self
    }
}
