//! Error types for request assembly and execution.
//!
//! # Design
//! Capability, serialization and URL errors are detected locally before any
//! I/O happens and are returned directly to the caller. Transport failures and
//! rejected responses are the only errors that pass through
//! `HttpContext::on_transport_failure`.

use std::fmt;

use thiserror::Error;

use crate::body::BodyKind;
use crate::method::Method;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors returned by the assembler and by `client::req`.
#[derive(Debug, Error)]
pub enum Error {
    /// The body variant is not accepted by the method's capability tag.
    #[error("{method} does not accept a {body} request body")]
    CapabilityViolation { method: Method, body: BodyKind },

    /// A JSON request body could not be encoded.
    #[error("serialization failed: {0}")]
    Serialization(#[source] serde_json::Error),

    #[error("malformed URL: {0}")]
    MalformedUrl(#[from] UrlError),

    #[error("transport failure: {0}")]
    Transport(#[from] TransportError),

    /// The response validator rejected a response.
    #[error("HTTP {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(#[source] serde_json::Error),

    /// Neither an alternate transport nor the bundled one is available.
    #[error("no transport configured")]
    NoTransport,
}

/// Reasons a URL candidate is rejected by `Url::try_parse`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlError {
    #[error("expected scheme `{expected}`, found `{found}`")]
    WrongScheme {
        expected: &'static str,
        found: String,
    },

    #[error("{0}")]
    Syntax(#[from] url::ParseError),

    #[error("empty host")]
    EmptyHost,

    #[error("invalid percent-encoding in `{0}`")]
    InvalidPercentEncoding(String),

    #[error("percent-decoded text is not UTF-8: `{0}`")]
    NotUtf8(String),
}

/// An error raised by a `Transport` implementation.
///
/// The core never inspects it beyond forwarding it to the context's failure
/// hook.
#[derive(Debug)]
pub struct TransportError {
    message: String,
    source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Some(source) => write!(f, "{}: {source}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for TransportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capability_violation_names_method_and_body() {
        let err = Error::CapabilityViolation {
            method: Method::Get,
            body: BodyKind::Json,
        };
        assert_eq!(err.to_string(), "GET does not accept a JSON request body");
    }

    #[test]
    fn transport_error_display_includes_source() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = TransportError::with_source("connect to 127.0.0.1:1", io);
        assert_eq!(err.to_string(), "connect to 127.0.0.1:1: refused");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn url_error_converts_into_error() {
        let err: Error = UrlError::EmptyHost.into();
        assert!(matches!(err, Error::MalformedUrl(UrlError::EmptyHost)));
    }
}
