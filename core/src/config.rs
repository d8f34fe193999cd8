//! Per-request configuration supplied by an `HttpContext`.

use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::http::{HttpResponse, Proxy, Request};
use crate::transport::Transport;

/// Redirects followed when neither the config nor an option says otherwise.
pub const DEFAULT_REDIRECT_COUNT: u32 = 10;

/// Settings read once per request.
///
/// `proxy` and `redirect_count` are defaults: a `proxy` or `redirect_count`
/// option on the request takes precedence.
#[derive(Clone)]
pub struct HttpConfig {
    pub proxy: Option<Proxy>,
    pub redirect_count: u32,
    /// Used instead of the bundled transport when set.
    pub alternate_transport: Option<Arc<dyn Transport>>,
    pub response_validator: ResponseValidator,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            proxy: None,
            redirect_count: DEFAULT_REDIRECT_COUNT,
            alternate_transport: None,
            response_validator: ResponseValidator::default(),
        }
    }
}

impl HttpConfig {
    pub fn with_proxy(mut self, proxy: Proxy) -> Self {
        self.proxy = Some(proxy);
        self
    }

    pub fn with_redirect_count(mut self, count: u32) -> Self {
        self.redirect_count = count;
        self
    }

    pub fn with_alternate_transport<T: Transport + 'static>(mut self, transport: T) -> Self {
        self.alternate_transport = Some(Arc::new(transport));
        self
    }

    pub fn with_response_validator(mut self, validator: ResponseValidator) -> Self {
        self.response_validator = validator;
        self
    }
}

impl fmt::Debug for HttpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpConfig")
            .field("proxy", &self.proxy)
            .field("redirect_count", &self.redirect_count)
            .field("alternate_transport", &self.alternate_transport.is_some())
            .field("response_validator", &self.response_validator)
            .finish()
    }
}

type ValidateFn = dyn Fn(&Request, &HttpResponse) -> Result<()> + Send + Sync;

/// Inspects every response before it is returned to the caller.
#[derive(Clone)]
pub struct ResponseValidator(Arc<ValidateFn>);

impl ResponseValidator {
    pub fn new<F>(validate: F) -> Self
    where
        F: Fn(&Request, &HttpResponse) -> Result<()> + Send + Sync + 'static,
    {
        Self(Arc::new(validate))
    }

    /// Accept every response, whatever its status.
    pub fn accept_all() -> Self {
        Self::new(|_, _| Ok(()))
    }

    pub fn validate(&self, request: &Request, response: &HttpResponse) -> Result<()> {
        (self.0)(request, response)
    }
}

/// Rejects any non-2xx status.
impl Default for ResponseValidator {
    fn default() -> Self {
        Self::new(|_, response| check_status(response))
    }
}

impl fmt::Debug for ResponseValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ResponseValidator(..)")
    }
}

fn check_status(response: &HttpResponse) -> Result<()> {
    if response.is_success() {
        return Ok(());
    }
    Err(Error::UnexpectedStatus {
        status: response.status,
        body: response.text(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    use crate::client;
    use crate::context::ConfiguredContext;
    use crate::url::http;
    use crate::{Body, Method, Opt};

    fn response(status: u16) -> HttpResponse {
        HttpResponse {
            status,
            headers: Vec::new(),
            body: Bytes::from_static(b"oops"),
        }
    }

    fn request() -> Request {
        let ctx = ConfiguredContext::new(HttpConfig::default());
        client::assemble(&ctx, Method::Get, &http("h"), Body::NoBody, &Opt::empty()).unwrap()
    }

    #[test]
    fn default_validator_rejects_non_2xx() {
        let validator = ResponseValidator::default();
        assert!(validator.validate(&request(), &response(204)).is_ok());
        let err = validator.validate(&request(), &response(503)).unwrap_err();
        assert!(matches!(err, Error::UnexpectedStatus { status: 503, ref body } if body == "oops"));
    }

    #[test]
    fn accept_all_ignores_status() {
        assert!(ResponseValidator::accept_all()
            .validate(&request(), &response(500))
            .is_ok());
    }

    #[test]
    fn builders_override_defaults() {
        let config = HttpConfig::default()
            .with_proxy(Proxy::new("proxy.local", 3128))
            .with_redirect_count(2);
        assert_eq!(config.redirect_count, 2);
        assert_eq!(config.proxy, Some(Proxy::new("proxy.local", 3128)));
        assert!(config.alternate_transport.is_none());
    }
}
