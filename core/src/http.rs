//! Transport-facing request and response values.
//!
//! # Design
//! `Request` is the immutable output of the assembler: plain data that a
//! `Transport` can execute without consulting anything else. Fields are
//! private so nothing outside the assembler can produce a half-built value.
//! `HttpResponse` is what a transport hands back; interpretation stops at
//! the small helpers below.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::method::Method;
use crate::url::SchemeKind;

/// The wire representation of a request body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Empty,
    Bytes(Bytes),
    Chunked(Vec<Bytes>),
}

impl Payload {
    pub fn len(&self) -> usize {
        match self {
            Payload::Empty => 0,
            Payload::Bytes(bytes) => bytes.len(),
            Payload::Chunked(chunks) => chunks.iter().map(Bytes::len).sum(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy the payload into one contiguous buffer.
    pub fn to_vec(&self) -> Vec<u8> {
        match self {
            Payload::Empty => Vec::new(),
            Payload::Bytes(bytes) => bytes.to_vec(),
            Payload::Chunked(chunks) => chunks.iter().flat_map(|c| c.iter().copied()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Proxy {
    pub host: String,
    pub port: u16,
}

impl Proxy {
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            host: host.to_string(),
            port,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HttpVersion {
    pub major: u8,
    pub minor: u8,
}

impl HttpVersion {
    pub const HTTP_10: HttpVersion = HttpVersion { major: 1, minor: 0 };
    pub const HTTP_11: HttpVersion = HttpVersion { major: 1, minor: 1 };
}

impl Default for HttpVersion {
    fn default() -> Self {
        Self::HTTP_11
    }
}

impl fmt::Display for HttpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP/{}.{}", self.major, self.minor)
    }
}

/// Cookies sent with a request, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieJar {
    cookies: Vec<(String, String)>,
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a cookie, replacing an earlier one with the same name.
    pub fn with(mut self, name: &str, value: &str) -> Self {
        self.cookies.retain(|(existing, _)| existing != name);
        self.cookies.push((name.to_string(), value.to_string()));
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.cookies
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    /// `name=value; name=value`, or `None` for an empty jar.
    pub fn header_value(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        let pairs: Vec<String> = self
            .cookies
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect();
        Some(pairs.join("; "))
    }
}

/// Decides from a response `Content-Type` whether the body is decompressed.
#[derive(Clone)]
pub struct DecompressPredicate(Arc<dyn Fn(&str) -> bool + Send + Sync>);

impl DecompressPredicate {
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(predicate))
    }

    pub fn should_decompress(&self, content_type: &str) -> bool {
        (self.0)(content_type)
    }
}

impl fmt::Debug for DecompressPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DecompressPredicate(..)")
    }
}

/// Two predicates are equal when they share the same closure.
impl PartialEq for DecompressPredicate {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// A fully assembled, transport-ready request.
///
/// Built only by `client::assemble` and `client::prepare`.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub(crate) method: Method,
    pub(crate) scheme: SchemeKind,
    pub(crate) host: String,
    pub(crate) port: u16,
    pub(crate) path: String,
    pub(crate) query: String,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) payload: Payload,
    pub(crate) proxy: Option<Proxy>,
    pub(crate) redirect_count: u32,
    pub(crate) response_timeout: Option<Duration>,
    pub(crate) http_version: HttpVersion,
    pub(crate) cookie_jar: Option<CookieJar>,
    pub(crate) decompress: Option<DecompressPredicate>,
}

impl Request {
    pub fn method(&self) -> Method {
        self.method
    }

    pub fn scheme(&self) -> SchemeKind {
        self.scheme
    }

    pub fn is_secure(&self) -> bool {
        self.scheme.is_secure()
    }

    /// Percent-encoded host.
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Percent-encoded path, always starting with `/`.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Encoded query string without the leading `?`; empty when there are no
    /// query parameters.
    pub fn query_string(&self) -> &str {
        &self.query
    }

    /// All headers in application order, repeated names included.
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// The first header with this name, compared ASCII case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn header_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.headers
            .iter()
            .filter(move |(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn proxy(&self) -> Option<&Proxy> {
        self.proxy.as_ref()
    }

    pub fn redirect_count(&self) -> u32 {
        self.redirect_count
    }

    pub fn response_timeout(&self) -> Option<Duration> {
        self.response_timeout
    }

    pub fn http_version(&self) -> HttpVersion {
        self.http_version
    }

    pub fn cookie_jar(&self) -> Option<&CookieJar> {
        self.cookie_jar.as_ref()
    }

    pub fn decompress(&self) -> Option<&DecompressPredicate> {
        self.decompress.as_ref()
    }

    /// `scheme://host[:port]/path[?query]`; the port is omitted when it is
    /// the scheme default.
    pub fn url(&self) -> String {
        let mut out = format!("{}{}", self.scheme.prefix(), self.host);
        if self.port != self.scheme.default_port() {
            out.push_str(&format!(":{}", self.port));
        }
        out.push_str(&self.path);
        if !self.query.is_empty() {
            out.push('?');
            out.push_str(&self.query);
        }
        out
    }
}

/// A response as returned by a `Transport`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// The body decoded as UTF-8, lossily.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(Error::Deserialization)
    }
}
