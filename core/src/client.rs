//! Request assembly and execution.
//!
//! # Design
//! `assemble` is the pure core: it checks the method/body capability, reads
//! one config snapshot from the context, builds a `Draft` from the URL and
//! body, folds the options onto it and freezes it into a `Request`. Nothing
//! half-built escapes; every error is returned before a `Request` exists.
//!
//! `req` and `send` add the I/O step: the request goes to the config's
//! alternate transport (or the bundled one), the response is checked by the
//! config's validator, and transport or validation failures are handed to
//! `HttpContext::on_transport_failure`.
//!
//! `prepare` and `req` take method and body marker types, so a forbidden
//! pair such as `GET` with `ReqBodyJson` is rejected by the compiler.
//! `assemble` and `send` take the runtime `Method` and `Body` and return
//! `Error::CapabilityViolation` instead.

use crate::body::{Body, HttpBody};
use crate::config::HttpConfig;
use crate::context::HttpContext;
use crate::draft::Draft;
use crate::error::{Error, Result};
use crate::http::{HttpResponse, Request};
use crate::method::{BodyAllowed, HttpMethod, Method};
use crate::option::Opt;
use crate::transport;
use crate::url::{Scheme, Url};

/// Build a transport-ready request without performing any I/O.
pub fn assemble<C, S>(
    ctx: &C,
    method: Method,
    url: &Url<S>,
    body: Body,
    options: &Opt<S>,
) -> Result<Request>
where
    C: HttpContext + ?Sized,
    S: Scheme,
{
    check_capability(method, &body)?;
    let config = ctx.resolve_config();
    build(&config, method, url, body, options)
}

/// Typed form of `assemble`.
pub fn prepare<C, M, B, S>(
    ctx: &C,
    _method: M,
    url: &Url<S>,
    body: B,
    options: &Opt<S>,
) -> Result<Request>
where
    C: HttpContext + ?Sized,
    M: HttpMethod,
    M::Capability: BodyAllowed<B::Provides>,
    B: HttpBody,
    S: Scheme,
{
    assemble(ctx, M::METHOD, url, body.into_body()?, options)
}

/// Assemble a request and execute it.
pub fn req<C, M, B, S>(
    ctx: &C,
    _method: M,
    url: &Url<S>,
    body: B,
    options: &Opt<S>,
) -> Result<HttpResponse>
where
    C: HttpContext + ?Sized,
    M: HttpMethod,
    M::Capability: BodyAllowed<B::Provides>,
    B: HttpBody,
    S: Scheme,
{
    send(ctx, M::METHOD, url, body.into_body()?, options)
}

/// Runtime-checked form of `req`.
pub fn send<C, S>(
    ctx: &C,
    method: Method,
    url: &Url<S>,
    body: Body,
    options: &Opt<S>,
) -> Result<HttpResponse>
where
    C: HttpContext + ?Sized,
    S: Scheme,
{
    check_capability(method, &body)?;
    let config = ctx.resolve_config();
    let request = build(&config, method, url, body, options)?;
    match dispatch(&config, &request) {
        Ok(response) => Ok(response),
        Err(error) => ctx.on_transport_failure(error),
    }
}

fn check_capability(method: Method, body: &Body) -> Result<()> {
    let kind = body.kind();
    if method.capability().permits(kind) {
        Ok(())
    } else {
        Err(Error::CapabilityViolation { method, body: kind })
    }
}

fn build<S: Scheme>(
    config: &HttpConfig,
    method: Method,
    url: &Url<S>,
    body: Body,
    options: &Opt<S>,
) -> Result<Request> {
    let mut draft = Draft::new(method, url, body)?;
    draft.apply(options.entries());
    let request = draft.finish(config);
    tracing::debug!(method = %request.method(), url = %request.url(), "assembled request");
    Ok(request)
}

fn dispatch(config: &HttpConfig, request: &Request) -> Result<HttpResponse> {
    let transport = config
        .alternate_transport
        .clone()
        .or_else(transport::default_transport)
        .ok_or(Error::NoTransport)?;
    let response = transport.execute(request)?;
    config.response_validator.validate(request, &response)?;
    Ok(response)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use bytes::Bytes;
    use serde_json::json;

    use super::*;
    use crate::body::{NoReqBody, ReqBodyJson, JSON_CONTENT_TYPE};
    use crate::config::ResponseValidator;
    use crate::context::ConfiguredContext;
    use crate::error::TransportError;
    use crate::http::{Payload, Proxy};
    use crate::method::{GET, POST};
    use crate::option::{self, basic_auth, header};
    use crate::url::{http, https};

    fn ctx() -> ConfiguredContext {
        ConfiguredContext::new(HttpConfig::default())
    }

    fn echo_status(status: u16) -> HttpConfig {
        let respond = move |_: &Request| -> Result<HttpResponse, TransportError> {
            Ok(HttpResponse {
                status,
                headers: Vec::new(),
                body: Bytes::from_static(b"body"),
            })
        };
        HttpConfig::default().with_alternate_transport(respond)
    }

    #[test]
    fn get_with_json_body_is_rejected() {
        let err = assemble(
            &ctx(),
            Method::Get,
            &https("example.com"),
            Body::JsonEncoded(json!({"a": 1})),
            &Opt::empty(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            Error::CapabilityViolation {
                method: Method::Get,
                ..
            }
        ));
    }

    #[test]
    fn capability_is_checked_before_the_config_is_read() {
        struct Unreachable;
        impl HttpContext for Unreachable {
            fn resolve_config(&self) -> HttpConfig {
                panic!("config read before capability check")
            }
        }
        let err = assemble(
            &Unreachable,
            Method::Head,
            &http("h"),
            Body::RawBytes(Bytes::from_static(b"x")),
            &Opt::empty(),
        );
        assert!(matches!(err, Err(Error::CapabilityViolation { .. })));
    }

    #[test]
    fn post_with_json_sets_payload_and_content_type() {
        let req = prepare(
            &ctx(),
            POST,
            &(https("api.example.com") / "todos"),
            ReqBodyJson(json!({"title": "Buy milk"})),
            &Opt::empty(),
        )
        .unwrap();
        assert_eq!(req.method(), Method::Post);
        assert_eq!(req.url(), "https://api.example.com/todos");
        assert_eq!(req.header("content-type"), Some(JSON_CONTENT_TYPE));
        assert_eq!(
            req.payload(),
            &Payload::Bytes(Bytes::from_static(br#"{"title":"Buy milk"}"#))
        );
    }

    #[test]
    fn explicit_content_type_beats_implied_one() {
        let req = prepare(
            &ctx(),
            POST,
            &https("h"),
            ReqBodyJson(json!(null)),
            &header("Content-Type", "application/vnd.api+json"),
        )
        .unwrap();
        assert_eq!(
            req.header_all("content-type").collect::<Vec<_>>(),
            ["application/vnd.api+json"]
        );
    }

    #[test]
    fn options_override_config_defaults() {
        let config = HttpConfig::default()
            .with_proxy(Proxy::new("config-proxy", 8080))
            .with_redirect_count(5);
        let ctx = ConfiguredContext::new(config);

        let req = prepare(&ctx, GET, &http("h"), NoReqBody, &Opt::empty()).unwrap();
        assert_eq!(req.redirect_count(), 5);
        assert_eq!(req.proxy(), Some(&Proxy::new("config-proxy", 8080)));

        let options = option::redirect_count(1) + option::proxy(Proxy::new("opt-proxy", 3128));
        let req = prepare(&ctx, GET, &http("h"), NoReqBody, &options).unwrap();
        assert_eq!(req.redirect_count(), 1);
        assert_eq!(req.proxy(), Some(&Proxy::new("opt-proxy", 3128)));
    }

    #[test]
    fn basic_auth_wins_over_manual_authorization_in_both_orders() {
        let expected = option::basic_value("user", "pass");
        for options in [
            basic_auth("user", "pass") + header("Authorization", "manual"),
            header("Authorization", "manual") + basic_auth("user", "pass"),
        ] {
            let req = prepare(&ctx(), GET, &https("h"), NoReqBody, &options).unwrap();
            assert_eq!(req.header("Authorization"), Some(expected.as_str()));
        }
    }

    #[test]
    fn send_uses_the_alternate_transport() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let recorder = Arc::clone(&seen);
        let record = move |req: &Request| -> Result<HttpResponse, TransportError> {
            recorder.lock().unwrap().push(req.url());
            Ok(HttpResponse {
                status: 200,
                headers: Vec::new(),
                body: Bytes::new(),
            })
        };
        let ctx = ConfiguredContext::new(HttpConfig::default().with_alternate_transport(record));
        let options = option::query("page", 2);
        let response = req(&ctx, GET, &(http("h") / "items"), NoReqBody, &options).unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(*seen.lock().unwrap(), ["http://h/items?page=2"]);
    }

    #[test]
    fn validator_failures_reach_the_failure_hook() {
        struct Recovering(HttpConfig);
        impl HttpContext for Recovering {
            fn resolve_config(&self) -> HttpConfig {
                self.0.clone()
            }
            fn on_transport_failure(&self, error: Error) -> Result<HttpResponse> {
                match error {
                    Error::UnexpectedStatus { status, .. } => Ok(HttpResponse {
                        status,
                        headers: Vec::new(),
                        body: Bytes::from_static(b"recovered"),
                    }),
                    other => Err(other),
                }
            }
        }

        let ctx = ConfiguredContext::new(echo_status(404));
        let err = req(&ctx, GET, &http("h"), NoReqBody, &Opt::empty()).unwrap_err();
        assert!(matches!(err, Error::UnexpectedStatus { status: 404, .. }));

        let ctx = Recovering(echo_status(404));
        let response = req(&ctx, GET, &http("h"), NoReqBody, &Opt::empty()).unwrap();
        assert_eq!(response.text(), "recovered");
    }

    #[test]
    fn custom_validator_accepts_errors() {
        let config = echo_status(500).with_response_validator(ResponseValidator::accept_all());
        let ctx = ConfiguredContext::new(config);
        let response = req(&ctx, GET, &http("h"), NoReqBody, &Opt::empty()).unwrap();
        assert_eq!(response.status, 500);
    }

    #[test]
    fn transport_errors_are_forwarded() {
        let reset = |_: &Request| -> Result<HttpResponse, TransportError> {
            Err(TransportError::new("connection reset"))
        };
        let config = HttpConfig::default().with_alternate_transport(reset);
        let ctx = ConfiguredContext::new(config);
        let err = req(&ctx, GET, &http("h"), NoReqBody, &Opt::empty()).unwrap_err();
        assert!(matches!(err, Error::Transport(ref e) if e.message() == "connection reset"));
    }
}
