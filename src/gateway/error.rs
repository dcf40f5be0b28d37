//! Data gateway error types

use thiserror::Error;

/// Gateway error with classification
#[derive(Debug, Error)]
#[error("{message}")]
pub struct GatewayError {
    pub kind: GatewayErrorKind,
    pub message: String,
    /// HTTP status for `Http` errors
    pub status: Option<u16>,
}

impl GatewayError {
    pub fn new(kind: GatewayErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
        }
    }

    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self {
            kind: GatewayErrorKind::Http,
            message: message.into(),
            status: Some(status),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorKind::Network, message)
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorKind::Decode, message)
    }

    pub fn request(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorKind::Request, message)
    }

    /// The service answered 404 for the requested resource.
    pub fn is_not_found(&self) -> bool {
        self.kind == GatewayErrorKind::Http && self.status == Some(404)
    }
}

/// Error classification used by the conversation error hook
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayErrorKind {
    /// Non-success status from the service
    Http,
    /// Timeout or connection failure
    Network,
    /// Body could not be decoded into the expected shape
    Decode,
    /// Request could not be built (bad base URL, client setup)
    Request,
}

impl GatewayErrorKind {
    pub fn is_transient(self) -> bool {
        matches!(self, Self::Network)
    }
}
