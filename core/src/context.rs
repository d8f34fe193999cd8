//! The capability interface the assembler runs against.
//!
//! # Design
//! A context answers two questions: which `HttpConfig` applies to this
//! request, and what happens when the transport fails or a response is
//! rejected. `client` is generic over `HttpContext` and never asks which
//! implementation it has.

use crate::config::HttpConfig;
use crate::error::{Error, Result};
use crate::http::HttpResponse;

pub trait HttpContext {
    /// A snapshot of the configuration for one request.
    fn resolve_config(&self) -> HttpConfig;

    /// Called with every transport or validation failure. Return a response
    /// to recover, or an error to propagate.
    fn on_transport_failure(&self, error: Error) -> Result<HttpResponse> {
        tracing::warn!(error = %error, "request failed");
        Err(error)
    }
}

impl<C: HttpContext + ?Sized> HttpContext for &C {
    fn resolve_config(&self) -> HttpConfig {
        (**self).resolve_config()
    }

    fn on_transport_failure(&self, error: Error) -> Result<HttpResponse> {
        (**self).on_transport_failure(error)
    }
}

/// Default configuration, real network transport, failures propagated.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultContext;

impl HttpContext for DefaultContext {
    fn resolve_config(&self) -> HttpConfig {
        HttpConfig::default()
    }
}

/// Threads an explicit `HttpConfig`; failures are propagated the same way as
/// `DefaultContext`.
#[derive(Debug, Clone, Default)]
pub struct ConfiguredContext {
    config: HttpConfig,
}

impl ConfiguredContext {
    pub fn new(config: HttpConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &HttpConfig {
        &self.config
    }
}

impl HttpContext for ConfiguredContext {
    fn resolve_config(&self) -> HttpConfig {
        self.config.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_context_uses_default_config() {
        let config = DefaultContext.resolve_config();
        assert_eq!(config.redirect_count, 10);
        assert!(config.proxy.is_none());
    }

    #[test]
    fn configured_context_threads_its_config() {
        let ctx = ConfiguredContext::new(HttpConfig::default().with_redirect_count(0));
        assert_eq!(ctx.resolve_config().redirect_count, 0);
        assert_eq!((&ctx).resolve_config().redirect_count, 0);
    }

    #[test]
    fn default_hook_propagates() {
        let err = DefaultContext.on_transport_failure(Error::NoTransport).unwrap_err();
        assert!(matches!(err, Error::NoTransport));
    }
}
