//! Request bodies.
//!
//! # Design
//! `Body` is the closed set of payloads the assembler understands. Each
//! variant maps to exactly one `Payload` and, for JSON and URL-encoded forms,
//! an implied `Content-Type`. The typed wrappers (`ReqBodyJson`, ...)
//! implement `HttpBody`, whose `Provides` type feeds the compile-time
//! capability check in `client::req`.

use std::fmt;

use bytes::Bytes;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::http::Payload;
use crate::method::{CanHaveBody, NoBody};

pub const JSON_CONTENT_TYPE: &str = "application/json";
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    NoBody,
    RawBytes(Bytes),
    /// A body delivered as a sequence of chunks.
    LazyBytes(Vec<Bytes>),
    JsonEncoded(serde_json::Value),
    UrlEncodedForm(FormUrlEncoded),
}

/// Fieldless mirror of `Body`, used in capability checks and errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BodyKind {
    Empty,
    Bytes,
    Lazy,
    Json,
    UrlEncoded,
}

impl fmt::Display for BodyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BodyKind::Empty => "empty",
            BodyKind::Bytes => "raw bytes",
            BodyKind::Lazy => "lazy bytes",
            BodyKind::Json => "JSON",
            BodyKind::UrlEncoded => "URL-encoded form",
        })
    }
}

impl Body {
    pub fn kind(&self) -> BodyKind {
        match self {
            Body::NoBody => BodyKind::Empty,
            Body::RawBytes(_) => BodyKind::Bytes,
            Body::LazyBytes(_) => BodyKind::Lazy,
            Body::JsonEncoded(_) => BodyKind::Json,
            Body::UrlEncodedForm(_) => BodyKind::UrlEncoded,
        }
    }

    /// Encode a serializable value as a JSON body.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        serde_json::to_value(value)
            .map(Body::JsonEncoded)
            .map_err(Error::Serialization)
    }

    pub(crate) fn into_payload(self) -> Result<(Payload, Option<&'static str>)> {
        Ok(match self {
            Body::NoBody => (Payload::Empty, None),
            Body::RawBytes(bytes) => (Payload::Bytes(bytes), None),
            Body::LazyBytes(chunks) => (Payload::Chunked(chunks), None),
            Body::JsonEncoded(value) => {
                let encoded = serde_json::to_vec(&value).map_err(Error::Serialization)?;
                (Payload::Bytes(Bytes::from(encoded)), Some(JSON_CONTENT_TYPE))
            }
            Body::UrlEncodedForm(form) => (
                Payload::Bytes(Bytes::from(form.encode())),
                Some(FORM_CONTENT_TYPE),
            ),
        })
    }
}

/// Ordered `key[=value]` pairs; repeated keys are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormUrlEncoded {
    pairs: Vec<(String, Option<String>)>,
}

impl FormUrlEncoded {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn param(mut self, key: &str, value: &str) -> Self {
        self.pairs.push((key.to_string(), Some(value.to_string())));
        self
    }

    /// A key without `=value`.
    pub fn flag(mut self, key: &str) -> Self {
        self.pairs.push((key.to_string(), None));
        self
    }

    pub fn pairs(&self) -> &[(String, Option<String>)] {
        &self.pairs
    }

    pub fn encode(&self) -> String {
        encode_pairs(&self.pairs)
    }
}

impl<K, V> FromIterator<(K, V)> for FormUrlEncoded
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            pairs: iter
                .into_iter()
                .map(|(k, v)| (k.into(), Some(v.into())))
                .collect(),
        }
    }
}

/// `application/x-www-form-urlencoded` serialization shared by form bodies
/// and query strings.
pub(crate) fn encode_pairs(pairs: &[(String, Option<String>)]) -> String {
    pairs
        .iter()
        .map(|(key, value)| {
            let key: String = form_urlencoded::byte_serialize(key.as_bytes()).collect();
            match value {
                Some(value) => {
                    let value: String = form_urlencoded::byte_serialize(value.as_bytes()).collect();
                    format!("{key}={value}")
                }
                None => key,
            }
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// A body value usable with `client::req`.
pub trait HttpBody {
    /// `NoBody` for the empty body, `CanHaveBody` otherwise.
    type Provides;

    fn into_body(self) -> Result<Body>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoReqBody;

#[derive(Debug, Clone)]
pub struct ReqBodyBytes(pub Bytes);

#[derive(Debug, Clone)]
pub struct ReqBodyLazy(pub Vec<Bytes>);

#[derive(Debug, Clone)]
pub struct ReqBodyJson<T>(pub T);

#[derive(Debug, Clone)]
pub struct ReqBodyUrlEnc(pub FormUrlEncoded);

impl HttpBody for NoReqBody {
    type Provides = NoBody;

    fn into_body(self) -> Result<Body> {
        Ok(Body::NoBody)
    }
}

impl HttpBody for ReqBodyBytes {
    type Provides = CanHaveBody;

    fn into_body(self) -> Result<Body> {
        Ok(Body::RawBytes(self.0))
    }
}

impl HttpBody for ReqBodyLazy {
    type Provides = CanHaveBody;

    fn into_body(self) -> Result<Body> {
        Ok(Body::LazyBytes(self.0))
    }
}

impl<T: Serialize> HttpBody for ReqBodyJson<T> {
    type Provides = CanHaveBody;

    fn into_body(self) -> Result<Body> {
        Body::json(&self.0)
    }
}

impl HttpBody for ReqBodyUrlEnc {
    type Provides = CanHaveBody;

    fn into_body(self) -> Result<Body> {
        Ok(Body::UrlEncodedForm(self.0))
    }
}
