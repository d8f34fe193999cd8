//! Scheme-tagged URLs.
//!
//! # Design
//! A `Url<S>` is a host plus an ordered list of path segments, tagged with the
//! scheme marker `S` (`Http` or `Https`). The marker fixes the default port
//! and the rendered prefix, and it is shared with `Opt<S>` so options that
//! only make sense over TLS cannot be attached to a plain-HTTP URL.
//!
//! The host and every segment are normalized once, when they enter the
//! value. Hosts follow the same rules `parse` applies (lowercase, IDNA, IP
//! literals kept verbatim), so a rendered URL parses back to an equal value.
//! Segments are percent-encoded. Rendering only joins the stored pieces.

use std::fmt;
use std::marker::PhantomData;
use std::ops::Div;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::error::UrlError;
use crate::option::{self, Opt};

/// Everything except RFC 3986 unreserved characters.
const PIECE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

mod sealed {
    pub trait Sealed {}
    impl Sealed for super::Http {}
    impl Sealed for super::Https {}
}

/// Type-level scheme tag. Implemented only by `Http` and `Https`.
pub trait Scheme: sealed::Sealed + Copy + fmt::Debug + Eq + Send + Sync + 'static {
    const KIND: SchemeKind;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Http;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Https;

impl Scheme for Http {
    const KIND: SchemeKind = SchemeKind::Http;
}

impl Scheme for Https {
    const KIND: SchemeKind = SchemeKind::Https;
}

/// Runtime view of a scheme tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemeKind {
    Http,
    Https,
}

impl SchemeKind {
    pub const fn default_port(self) -> u16 {
        match self {
            SchemeKind::Http => 80,
            SchemeKind::Https => 443,
        }
    }

    pub const fn is_secure(self) -> bool {
        matches!(self, SchemeKind::Https)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            SchemeKind::Http => "http",
            SchemeKind::Https => "https",
        }
    }

    pub const fn prefix(self) -> &'static str {
        match self {
            SchemeKind::Http => "http://",
            SchemeKind::Https => "https://",
        }
    }
}

impl fmt::Display for SchemeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A location: scheme, host and percent-encoded path segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Url<S> {
    host: String,
    segments: Vec<String>,
    scheme: PhantomData<S>,
}

/// Shorthand for `Url::<Http>::new`.
pub fn http(host: &str) -> Url<Http> {
    Url::new(host)
}

/// Shorthand for `Url::<Https>::new`.
pub fn https(host: &str) -> Url<Https> {
    Url::new(host)
}

impl<S: Scheme> Url<S> {
    pub fn new(host: &str) -> Self {
        Self {
            host: normalize_host(host),
            segments: Vec::new(),
            scheme: PhantomData,
        }
    }

    /// Append one path segment, percent-encoding it.
    pub fn push(mut self, segment: &str) -> Self {
        self.segments.push(encode(segment));
        self
    }

    /// Append several segments left to right.
    pub fn push_all<I, T>(self, segments: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        segments
            .into_iter()
            .fold(self, |url, segment| url.push(segment.as_ref()))
    }

    pub fn scheme(&self) -> SchemeKind {
        S::KIND
    }

    /// The normalized host; IPv6 literals keep their brackets.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The percent-encoded path segments, in order.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The request path: `/` followed by the `/`-joined segments.
    pub fn path(&self) -> String {
        format!("/{}", self.segments.join("/"))
    }

    /// `scheme://host/seg/seg` without port or query.
    pub fn render(&self) -> String {
        let mut out = format!("{}{}", S::KIND.prefix(), self.host);
        for segment in &self.segments {
            out.push('/');
            out.push_str(segment);
        }
        out
    }

    /// Parse a URL whose scheme matches `S`, returning the location and the
    /// options implied by its port, userinfo and query string.
    ///
    /// Returns `None` on any malformed input; see `try_parse` for the reason.
    pub fn parse(candidate: &str) -> Option<(Self, Opt<S>)> {
        match Self::try_parse(candidate) {
            Ok(parsed) => Some(parsed),
            Err(err) => {
                tracing::debug!(candidate, scheme = %S::KIND, reason = %err, "rejected URL");
                None
            }
        }
    }

    pub fn try_parse(candidate: &str) -> Result<(Self, Opt<S>), UrlError> {
        if !candidate.starts_with(S::KIND.prefix()) {
            let found = candidate.split_once(':').map_or(candidate, |(scheme, _)| scheme);
            return Err(UrlError::WrongScheme {
                expected: S::KIND.as_str(),
                found: found.to_string(),
            });
        }

        // `url` would read `http:///a/b` as host `a`.
        if raw_host(&candidate[S::KIND.prefix().len()..]).is_empty() {
            return Err(UrlError::EmptyHost);
        }

        let parsed = url::Url::parse(candidate)?;
        let host = match parsed.host_str() {
            Some(host) if !host.is_empty() => host,
            _ => return Err(UrlError::EmptyHost),
        };

        let mut url = Self::new(host);
        let raw_segments: Vec<&str> = parsed
            .path_segments()
            .map(|segments| segments.collect())
            .unwrap_or_default();
        if raw_segments != [""] {
            for raw in raw_segments {
                url = url.push(&decode(raw)?);
            }
        }

        let mut options = Opt::empty();
        if let Some(port) = parsed.port() {
            options = options + option::port(port);
        }
        if !parsed.username().is_empty() || parsed.password().is_some() {
            let user = decode(parsed.username())?;
            let password = decode(parsed.password().unwrap_or_default())?;
            options = options + option::basic_auth_unsafe(&user, &password);
        }
        if let Some(query) = parsed.query() {
            options = options + parse_query(query)?;
        }

        Ok((url, options))
    }
}

impl<S: Scheme> Div<&str> for Url<S> {
    type Output = Url<S>;

    fn div(self, segment: &str) -> Url<S> {
        self.push(segment)
    }
}

impl<S: Scheme> fmt::Display for Url<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Result of `parse_any`: a URL of whichever scheme the candidate carries.
#[derive(Debug, Clone)]
pub enum ParsedUrl {
    Http(Url<Http>, Opt<Http>),
    Https(Url<Https>, Opt<Https>),
}

/// Parse a candidate with either scheme.
pub fn parse_any(candidate: &str) -> Option<ParsedUrl> {
    if candidate.starts_with(SchemeKind::Https.prefix()) {
        Url::<Https>::parse(candidate).map(|(url, opt)| ParsedUrl::Https(url, opt))
    } else {
        Url::<Http>::parse(candidate).map(|(url, opt)| ParsedUrl::Http(url, opt))
    }
}

/// The host as written between the scheme prefix and the path, without
/// userinfo or port.
fn raw_host(rest: &str) -> &str {
    let authority = rest
        .split(['/', '\\', '?', '#'])
        .next()
        .unwrap_or_default();
    let host_port = authority.rsplit_once('@').map_or(authority, |(_, host)| host);
    if host_port.starts_with('[') {
        return host_port
            .find(']')
            .map_or(host_port, |end| &host_port[..=end]);
    }
    host_port.split(':').next().unwrap_or_default()
}

/// Lowercase and IDNA-map domains, keep IP literals verbatim, and fall back
/// to percent-encoding for anything `url` would refuse as a host.
fn normalize_host(host: &str) -> String {
    match url::Host::parse(host) {
        Ok(parsed) => parsed.to_string(),
        Err(_) => encode(&host.to_ascii_lowercase()),
    }
}

fn encode(piece: &str) -> String {
    utf8_percent_encode(piece, PIECE).to_string()
}

/// Strictly decode a percent-encoded piece: every `%` must start a two-digit
/// hex escape and the result must be UTF-8.
fn decode(raw: &str) -> Result<String, UrlError> {
    check_escapes(raw)?;
    percent_decode_str(raw)
        .decode_utf8()
        .map(|text| text.into_owned())
        .map_err(|_| UrlError::NotUtf8(raw.to_string()))
}

fn check_escapes(raw: &str) -> Result<(), UrlError> {
    let bytes = raw.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let valid = bytes.len() > i + 2
                && bytes[i + 1].is_ascii_hexdigit()
                && bytes[i + 2].is_ascii_hexdigit();
            if !valid {
                return Err(UrlError::InvalidPercentEncoding(raw.to_string()));
            }
            i += 3;
        } else {
            i += 1;
        }
    }
    Ok(())
}

/// Map `k=v` pieces to `query_param` and bare `k` pieces to `query_flag`.
fn parse_query<S: Scheme>(query: &str) -> Result<Opt<S>, UrlError> {
    let mut options = Opt::empty();
    for piece in query.split('&').filter(|piece| !piece.is_empty()) {
        check_escapes(piece)?;
        let Some((name, value)) = form_urlencoded::parse(piece.as_bytes()).next() else {
            continue;
        };
        options = if piece.contains('=') {
            options + option::query_param(&name, Some(value.as_ref()))
        } else {
            options + option::query_flag(&name)
        };
    }
    Ok(options)
}
