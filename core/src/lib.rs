//! Request construction above a pluggable HTTP transport.
//!
//! # Overview
//! Turns a method, a scheme-tagged `Url`, a `Body` and a composition of
//! `Opt` values into an immutable `Request`, then optionally hands it to a
//! `Transport` (host-does-IO pattern: the network call is a collaborator,
//! never part of assembly).
//!
//! # Design
//! - `Url<S>` and `Opt<S>` share a scheme marker so TLS-only options cannot
//!   be attached to plain-HTTP URLs.
//! - Method/body compatibility is a trait bound on `client::req` and a
//!   runtime check in `client::assemble`.
//! - `Opt` is an ordered list of tagged mutations; `combine` is list
//!   concatenation and all precedence rules live in one fold (`draft`).
//! - An `HttpContext` supplies the `HttpConfig` and the failure hook; the
//!   assembler is generic over it.
//!
//! ```no_run
//! use reqform_core::{client, option, url, DefaultContext, NoReqBody, GET};
//!
//! let url = url::https("api.example.com") / "v1" / "items";
//! let options = option::query("page", 2) + option::oauth2_bearer("token");
//! let response = client::req(&DefaultContext, GET, &url, NoReqBody, &options)?;
//! println!("{}", response.status);
//! # Ok::<(), reqform_core::Error>(())
//! ```

pub mod body;
pub mod client;
pub mod config;
pub mod context;
mod draft;
pub mod error;
pub mod http;
pub mod method;
pub mod option;
pub mod transport;
pub mod url;

pub use body::{
    Body, BodyKind, FormUrlEncoded, HttpBody, NoReqBody, ReqBodyBytes, ReqBodyJson, ReqBodyLazy,
    ReqBodyUrlEnc,
};
pub use client::{assemble, prepare, req, send};
pub use config::{HttpConfig, ResponseValidator};
pub use context::{ConfiguredContext, DefaultContext, HttpContext};
pub use error::{Error, Result, TransportError, UrlError};
pub use http::{CookieJar, DecompressPredicate, HttpResponse, HttpVersion, Payload, Proxy, Request};
pub use method::{
    BodyAllowed, CanHaveBody, Capability, HttpMethod, Method, NoBody, CONNECT, DELETE, GET, HEAD,
    OPTIONS, PATCH, POST, PUT, TRACE,
};
pub use option::Opt;
pub use transport::Transport;
#[cfg(feature = "ureq")]
pub use transport::UreqTransport;
pub use url::{Http, Https, ParsedUrl, Scheme, SchemeKind, Url};
