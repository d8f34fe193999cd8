//! Composable request options.
//!
//! # Design
//! An `Opt<S>` is an ordered list of tagged mutations. `combine` concatenates
//! the lists, so it is associative with `empty` as identity; all precedence
//! rules live in `Draft::apply`, which folds the list onto a draft:
//!
//! - headers and query parameters accumulate; header lookup is first-match,
//! - single-value settings (port, proxy, redirect count, ...) keep the first
//!   value written,
//! - credential options are applied after everything else and replace any
//!   manually set `Authorization` header; among them the first one wins.
//!
//! The scheme marker `S` keeps options that leak secrets over plain HTTP off
//! `Url<Http>` requests unless the caller opts in with an `*_unsafe` variant.

use std::fmt;
use std::iter::Sum;
use std::marker::PhantomData;
use std::ops::Add;
use std::time::Duration;

use base64::prelude::BASE64_STANDARD;
use base64::Engine;

use crate::http::{CookieJar, DecompressPredicate, HttpVersion, Proxy};
use crate::url::{Https, Scheme};

/// The header every credential option sets.
pub(crate) const AUTHORIZATION: &str = "Authorization";

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Entry {
    Header { name: String, value: String },
    Query { name: String, value: Option<String> },
    /// An `Authorization` value derived from credentials.
    Credential(String),
    Port(u16),
    RedirectCount(u32),
    Proxy(Proxy),
    Decompress(DecompressPredicate),
    HttpVersion(HttpVersion),
    CookieJar(CookieJar),
    ResponseTimeout(Duration),
}

impl Entry {
    pub(crate) fn is_credential(&self) -> bool {
        matches!(self, Entry::Credential(_))
    }
}

/// A deferred, composable modification of a request.
pub struct Opt<S> {
    entries: Vec<Entry>,
    scheme: PhantomData<S>,
}

impl<S: Scheme> Opt<S> {
    /// The option that changes nothing.
    pub fn empty() -> Self {
        Self::from_entry_list(Vec::new())
    }

    /// `self` applied first, then `other`.
    pub fn combine(mut self, other: Opt<S>) -> Self {
        self.entries.extend(other.entries);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn entries(&self) -> &[Entry] {
        &self.entries
    }

    fn from_entry_list(entries: Vec<Entry>) -> Self {
        Self {
            entries,
            scheme: PhantomData,
        }
    }

    fn single(entry: Entry) -> Self {
        Self::from_entry_list(vec![entry])
    }
}

// Manual impls: derives would demand bounds on the marker type.
impl<S> Clone for Opt<S> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
            scheme: PhantomData,
        }
    }
}

impl<S> fmt::Debug for Opt<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.entries).finish()
    }
}

impl<S> PartialEq for Opt<S> {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl<S: Scheme> Default for Opt<S> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<S: Scheme> Add for Opt<S> {
    type Output = Opt<S>;

    fn add(self, other: Opt<S>) -> Opt<S> {
        self.combine(other)
    }
}

impl<S: Scheme> Sum for Opt<S> {
    fn sum<I: Iterator<Item = Opt<S>>>(iter: I) -> Self {
        iter.fold(Opt::empty(), Opt::combine)
    }
}

impl<S: Scheme> FromIterator<Opt<S>> for Opt<S> {
    fn from_iter<I: IntoIterator<Item = Opt<S>>>(iter: I) -> Self {
        iter.into_iter().sum()
    }
}

/// Append a header. Earlier headers with the same name stay in place and win
/// name lookups.
pub fn header<S: Scheme>(name: &str, value: &str) -> Opt<S> {
    Opt::single(Entry::Header {
        name: name.to_string(),
        value: value.to_string(),
    })
}

/// Append a query parameter; `None` renders the bare name.
pub fn query_param<S: Scheme>(name: &str, value: Option<&str>) -> Opt<S> {
    Opt::single(Entry::Query {
        name: name.to_string(),
        value: value.map(str::to_string),
    })
}

pub fn query_flag<S: Scheme>(name: &str) -> Opt<S> {
    query_param(name, None)
}

/// `name=value` with any displayable value.
pub fn query<S: Scheme, V: fmt::Display>(name: &str, value: V) -> Opt<S> {
    let value = value.to_string();
    query_param(name, Some(value.as_str()))
}

pub fn port<S: Scheme>(port: u16) -> Opt<S> {
    Opt::single(Entry::Port(port))
}

pub fn redirect_count<S: Scheme>(count: u32) -> Opt<S> {
    Opt::single(Entry::RedirectCount(count))
}

pub fn proxy<S: Scheme>(proxy: Proxy) -> Opt<S> {
    Opt::single(Entry::Proxy(proxy))
}

pub fn decompress<S: Scheme>(predicate: DecompressPredicate) -> Opt<S> {
    Opt::single(Entry::Decompress(predicate))
}

pub fn http_version<S: Scheme>(major: u8, minor: u8) -> Opt<S> {
    Opt::single(Entry::HttpVersion(HttpVersion { major, minor }))
}

pub fn cookie_jar<S: Scheme>(jar: CookieJar) -> Opt<S> {
    Opt::single(Entry::CookieJar(jar))
}

pub fn response_timeout<S: Scheme>(timeout: Duration) -> Opt<S> {
    Opt::single(Entry::ResponseTimeout(timeout))
}

/// Basic authentication; only over TLS.
pub fn basic_auth(user: &str, password: &str) -> Opt<Https> {
    basic_auth_unsafe(user, password)
}

/// Basic authentication on any scheme.
pub fn basic_auth_unsafe<S: Scheme>(user: &str, password: &str) -> Opt<S> {
    credential(basic_value(user, password))
}

/// Basic authentication against the proxy. This is a plain
/// `Proxy-Authorization` header and follows ordinary header order.
pub fn basic_proxy_auth<S: Scheme>(user: &str, password: &str) -> Opt<S> {
    header("Proxy-Authorization", &basic_value(user, password))
}

/// `Authorization: Bearer <token>`; only over TLS.
pub fn oauth2_bearer(token: &str) -> Opt<Https> {
    oauth2_bearer_unsafe(token)
}

pub fn oauth2_bearer_unsafe<S: Scheme>(token: &str) -> Opt<S> {
    credential(format!("Bearer {token}"))
}

/// `Authorization: Token token=<token>`; only over TLS.
pub fn oauth2_token(token: &str) -> Opt<Https> {
    oauth2_token_unsafe(token)
}

pub fn oauth2_token_unsafe<S: Scheme>(token: &str) -> Opt<S> {
    credential(format!("Token token={token}"))
}

fn credential<S: Scheme>(value: String) -> Opt<S> {
    Opt::single(Entry::Credential(value))
}

pub(crate) fn basic_value(user: &str, password: &str) -> String {
    format!("Basic {}", BASE64_STANDARD.encode(format!("{user}:{password}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::url::Http;

    #[test]
    fn basic_value_is_base64() {
        assert_eq!(basic_value("Aladdin", "open sesame"), "Basic QWxhZGRpbjpvcGVuIHNlc2FtZQ==");
    }

    #[test]
    fn combine_concatenates_in_order() {
        let a: Opt<Http> = header("a", "1");
        let b = port(8080);
        let c = query_flag("x");
        let combined = a.clone() + b.clone() + c.clone();
        assert_eq!(combined.entries().len(), 3);
        assert_eq!(combined.entries()[0], a.entries()[0]);
        assert_eq!(combined.entries()[2], c.entries()[0]);
    }

    #[test]
    fn empty_is_identity() {
        let a: Opt<Http> = header("a", "1");
        assert_eq!(Opt::empty() + a.clone(), a);
        assert_eq!(a.clone() + Opt::empty(), a);
    }

    #[test]
    fn sum_and_collect_fold_with_combine() {
        let parts: Vec<Opt<Https>> = vec![header("a", "1"), port(1), oauth2_bearer("t")];
        let summed: Opt<Https> = parts.clone().into_iter().sum();
        let collected: Opt<Https> = parts.into_iter().collect();
        assert_eq!(summed, collected);
        assert_eq!(summed.entries().len(), 3);
    }

    #[test]
    fn query_renders_display_values() {
        let opt: Opt<Http> = query("limit", 25);
        assert_eq!(
            opt.entries(),
            [Entry::Query {
                name: "limit".to_string(),
                value: Some("25".to_string())
            }]
        );
    }

    #[test]
    fn credential_options_are_classified() {
        let opt: Opt<Https> = basic_auth("u", "p") + header("Authorization", "x");
        let classes: Vec<bool> = opt.entries().iter().map(Entry::is_credential).collect();
        assert_eq!(classes, [true, false]);
    }

    #[test]
    fn proxy_auth_is_a_plain_header() {
        let opt: Opt<Http> = basic_proxy_auth("p", "q");
        assert_eq!(
            opt.entries(),
            [Entry::Header {
                name: "Proxy-Authorization".to_string(),
                value: basic_value("p", "q"),
            }]
        );
    }
}
