//! The single-call accumulator folded from a URL, a body and options.

use std::time::Duration;

use crate::body::{encode_pairs, Body};
use crate::config::HttpConfig;
use crate::error::Result;
use crate::http::{CookieJar, DecompressPredicate, HttpVersion, Payload, Proxy, Request};
use crate::method::Method;
use crate::option::{Entry, AUTHORIZATION};
use crate::url::{Scheme, SchemeKind, Url};

/// Single-value slots start empty; `None` after folding means "use the
/// config or scheme default".
#[derive(Debug)]
pub(crate) struct Draft {
    method: Method,
    scheme: SchemeKind,
    host: String,
    path: String,
    payload: Payload,
    implied_content_type: Option<&'static str>,
    headers: Vec<(String, String)>,
    query: Vec<(String, Option<String>)>,
    authorized: bool,
    port: Option<u16>,
    redirect_count: Option<u32>,
    proxy: Option<Proxy>,
    decompress: Option<DecompressPredicate>,
    http_version: Option<HttpVersion>,
    cookie_jar: Option<CookieJar>,
    response_timeout: Option<Duration>,
}

impl Draft {
    pub(crate) fn new<S: Scheme>(method: Method, url: &Url<S>, body: Body) -> Result<Self> {
        let (payload, implied_content_type) = body.into_payload()?;
        Ok(Self {
            method,
            scheme: url.scheme(),
            host: url.host().to_string(),
            path: url.path(),
            payload,
            implied_content_type,
            headers: Vec::new(),
            query: Vec::new(),
            authorized: false,
            port: None,
            redirect_count: None,
            proxy: None,
            decompress: None,
            http_version: None,
            cookie_jar: None,
            response_timeout: None,
        })
    }

    /// Fold option entries in two phases: everything except credentials in
    /// order, then credentials in their relative order.
    pub(crate) fn apply(&mut self, entries: &[Entry]) {
        for entry in entries.iter().filter(|e| !e.is_credential()) {
            self.apply_plain(entry);
        }
        for entry in entries.iter().filter(|e| e.is_credential()) {
            if let Entry::Credential(value) = entry {
                self.apply_credential(value);
            }
        }
    }

    fn apply_plain(&mut self, entry: &Entry) {
        match entry {
            Entry::Header { name, value } => self.headers.push((name.clone(), value.clone())),
            Entry::Query { name, value } => self.query.push((name.clone(), value.clone())),
            Entry::Port(port) => first_wins(&mut self.port, port),
            Entry::RedirectCount(count) => first_wins(&mut self.redirect_count, count),
            Entry::Proxy(proxy) => first_wins(&mut self.proxy, proxy),
            Entry::Decompress(predicate) => first_wins(&mut self.decompress, predicate),
            Entry::HttpVersion(version) => first_wins(&mut self.http_version, version),
            Entry::CookieJar(jar) => first_wins(&mut self.cookie_jar, jar),
            Entry::ResponseTimeout(timeout) => first_wins(&mut self.response_timeout, timeout),
            Entry::Credential(_) => {}
        }
    }

    fn apply_credential(&mut self, value: &str) {
        if self.authorized {
            return;
        }
        self.authorized = true;

        let name = AUTHORIZATION;
        let before = self.headers.len();
        self.headers
            .retain(|(existing, _)| !existing.eq_ignore_ascii_case(name));
        if self.headers.len() != before {
            tracing::trace!(header = name, "credential option replaced a manually set header");
        }
        self.headers.push((name.to_string(), value.to_string()));
    }

    /// Fill unset slots from `config` and the scheme, then freeze.
    pub(crate) fn finish(mut self, config: &HttpConfig) -> Request {
        if let Some(content_type) = self.implied_content_type {
            let explicit = self
                .headers
                .iter()
                .any(|(name, _)| name.eq_ignore_ascii_case("content-type"));
            if !explicit {
                self.headers
                    .push(("Content-Type".to_string(), content_type.to_string()));
            }
        }

        Request {
            method: self.method,
            scheme: self.scheme,
            host: self.host,
            port: self.port.unwrap_or(self.scheme.default_port()),
            path: self.path,
            query: encode_pairs(&self.query),
            headers: self.headers,
            payload: self.payload,
            proxy: self.proxy.or_else(|| config.proxy.clone()),
            redirect_count: self.redirect_count.unwrap_or(config.redirect_count),
            response_timeout: self.response_timeout,
            http_version: self.http_version.unwrap_or_default(),
            cookie_jar: self.cookie_jar,
            decompress: self.decompress,
        }
    }
}

fn first_wins<T: Clone>(slot: &mut Option<T>, value: &T) {
    if slot.is_none() {
        *slot = Some(value.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::option::{self, Opt};
    use crate::url::{https, Https};

    fn fold(options: Opt<Https>) -> Request {
        let mut draft = Draft::new(Method::Get, &https("example.com"), Body::NoBody).unwrap();
        draft.apply(options.entries());
        draft.finish(&HttpConfig::default())
    }

    #[test]
    fn single_value_slots_keep_first_writer() {
        let req = fold(option::port(1) + option::port(2) + option::redirect_count(3));
        assert_eq!(req.port(), 1);
        assert_eq!(req.redirect_count(), 3);
    }

    #[test]
    fn unset_slots_fall_back_to_defaults() {
        let req = fold(Opt::empty());
        assert_eq!(req.port(), 443);
        assert_eq!(req.redirect_count(), 10);
        assert_eq!(req.http_version(), HttpVersion::HTTP_11);
        assert!(req.proxy().is_none());
    }

    #[test]
    fn credential_replaces_manual_header_wherever_it_appears() {
        let manual = "Bearer manual";
        let req = fold(option::header("authorization", manual) + option::oauth2_bearer("t"));
        assert_eq!(req.header_all("Authorization").collect::<Vec<_>>(), ["Bearer t"]);

        let req = fold(option::oauth2_bearer("t") + option::header("Authorization", manual));
        assert_eq!(req.header("Authorization"), Some("Bearer t"));
    }

    #[test]
    fn proxy_auth_follows_plain_header_order() {
        let derived = option::basic_value("p", "q");
        let req = fold(
            option::header("Proxy-Authorization", "manual")
                + option::basic_proxy_auth("p", "q")
                + option::oauth2_token("t"),
        );
        assert_eq!(req.header("Authorization"), Some("Token token=t"));
        assert_eq!(
            req.header_all("proxy-authorization").collect::<Vec<_>>(),
            ["manual", derived.as_str()]
        );
    }

    #[test]
    fn query_accumulates_in_order() {
        let req = fold(
            option::query_param("a", Some("1"))
                + option::query_flag("b")
                + option::query_param("a", Some("2 3")),
        );
        assert_eq!(req.query_string(), "a=1&b&a=2+3");
    }
}
