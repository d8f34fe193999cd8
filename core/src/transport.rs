//! The boundary between an assembled `Request` and the network.
//!
//! # Design
//! The core never opens a socket itself. A `Transport` executes a `Request`
//! and returns the response as data. With the `ureq` feature the crate ships
//! `UreqTransport`, used whenever the config has no alternate transport.

use std::sync::Arc;

use crate::error::TransportError;
use crate::http::{HttpResponse, Request};

pub trait Transport: Send + Sync {
    fn execute(&self, request: &Request) -> Result<HttpResponse, TransportError>;
}

impl<F> Transport for F
where
    F: Fn(&Request) -> Result<HttpResponse, TransportError> + Send + Sync,
{
    fn execute(&self, request: &Request) -> Result<HttpResponse, TransportError> {
        self(request)
    }
}

/// The transport used when the config does not name one.
pub(crate) fn default_transport() -> Option<Arc<dyn Transport>> {
    #[cfg(feature = "ureq")]
    {
        Some(Arc::new(UreqTransport))
    }
    #[cfg(not(feature = "ureq"))]
    {
        None
    }
}

#[cfg(feature = "ureq")]
pub use self::ureq_transport::UreqTransport;

#[cfg(feature = "ureq")]
mod ureq_transport {
    use bytes::Bytes;

    use super::Transport;
    use crate::error::TransportError;
    use crate::http::{HttpResponse, HttpVersion, Payload, Request};

    /// Executes requests with a `ureq` agent built for each request's
    /// redirect limit, proxy and timeout.
    ///
    /// Status codes are returned as data; `HttpConfig::response_validator`
    /// decides what counts as failure. ureq speaks HTTP/1.1 only and applies
    /// its own decompression, so `http_version` and `decompress` are logged
    /// and otherwise left to the server.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct UreqTransport;

    impl Transport for UreqTransport {
        fn execute(&self, request: &Request) -> Result<HttpResponse, TransportError> {
            let mut config = ureq::Agent::config_builder()
                .http_status_as_error(false)
                .max_redirects(request.redirect_count())
                .timeout_global(request.response_timeout());
            if let Some(proxy) = request.proxy() {
                let uri = format!("http://{}:{}", proxy.host, proxy.port);
                let proxy = ureq::Proxy::new(&uri)
                    .map_err(|e| TransportError::with_source(format!("invalid proxy {uri}"), e))?;
                config = config.proxy(Some(proxy));
            }
            let agent = config.build().new_agent();

            if request.http_version() != HttpVersion::HTTP_11 {
                tracing::debug!(version = %request.http_version(), "ureq sends HTTP/1.1");
            }
            if request.decompress().is_some() {
                tracing::debug!("ureq applies its own decompression policy");
            }

            let url = request.url();
            let mut builder = ureq::http::Request::builder()
                .method(request.method().as_str())
                .uri(url.as_str());
            for (name, value) in request.headers() {
                builder = builder.header(name.as_str(), value.as_str());
            }
            if let Some(cookies) = request.cookie_jar().and_then(|jar| jar.header_value()) {
                builder = builder.header("Cookie", cookies);
            }

            let invalid =
                |e: ureq::http::Error| TransportError::with_source(format!("invalid request {url}"), e);
            let sent = match request.payload() {
                Payload::Empty => agent.run(builder.body(()).map_err(invalid)?),
                payload => agent.run(builder.body(payload.to_vec()).map_err(invalid)?),
            };
            let mut response =
                sent.map_err(|e| TransportError::with_source(format!("{} {url}", request.method()), e))?;

            let status = response.status().as_u16();
            let headers = response
                .headers()
                .iter()
                .map(|(name, value)| {
                    (
                        name.as_str().to_string(),
                        String::from_utf8_lossy(value.as_bytes()).into_owned(),
                    )
                })
                .collect();
            let body = response
                .body_mut()
                .read_to_vec()
                .map_err(|e| TransportError::with_source(format!("reading body of {url}"), e))?;

            Ok(HttpResponse {
                status,
                headers,
                body: Bytes::from(body),
            })
        }
    }
}
