//! HTTP methods and their body capability.
//!
//! # Design
//! Each method has a fixed capability tag: it either allows a request body or
//! forbids one. The tag exists twice. `Method::capability` is the runtime
//! table used by `client::assemble`, and the marker types (`GET`, `POST`, ...)
//! carry it as the associated type `HttpMethod::Capability` so `client::req`
//! can reject a forbidden method/body pair at compile time.

use std::fmt;

use crate::body::BodyKind;

/// The nine standard request methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Head,
    Put,
    Delete,
    Trace,
    Connect,
    Options,
    Patch,
}

/// Whether a method accepts a request body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    AllowsBody,
    ForbidsBody,
}

impl Method {
    pub const ALL: [Method; 9] = [
        Method::Get,
        Method::Post,
        Method::Head,
        Method::Put,
        Method::Delete,
        Method::Trace,
        Method::Connect,
        Method::Options,
        Method::Patch,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Head => "HEAD",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Trace => "TRACE",
            Method::Connect => "CONNECT",
            Method::Options => "OPTIONS",
            Method::Patch => "PATCH",
        }
    }

    pub const fn capability(self) -> Capability {
        match self {
            Method::Get | Method::Head | Method::Options => Capability::ForbidsBody,
            Method::Post
            | Method::Put
            | Method::Delete
            | Method::Trace
            | Method::Connect
            | Method::Patch => Capability::AllowsBody,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Capability {
    /// A body-forbidding method only accepts the empty body.
    pub fn permits(self, body: BodyKind) -> bool {
        match self {
            Capability::AllowsBody => true,
            Capability::ForbidsBody => body == BodyKind::Empty,
        }
    }
}

/// Type-level capability: the method may carry a body, or the body value
/// provides one.
#[derive(Debug, Clone, Copy)]
pub struct CanHaveBody;

/// Type-level capability: the method forbids a body, or the body value is
/// empty.
#[derive(Debug, Clone, Copy)]
pub struct NoBody;

/// Implemented for every (method capability, body provision) pair that may be
/// sent together.
#[diagnostic::on_unimplemented(
    message = "this method does not accept a request body",
    label = "use `NoReqBody` with this method"
)]
pub trait BodyAllowed<Provides> {}

impl<Provides> BodyAllowed<Provides> for CanHaveBody {}
impl BodyAllowed<NoBody> for NoBody {}

/// A method marker usable with `client::req`.
pub trait HttpMethod {
    type Capability;
    const METHOD: Method;
}

macro_rules! method_marker {
    ($name:ident, $variant:ident, $capability:ty) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
        pub struct $name;

        impl HttpMethod for $name {
            type Capability = $capability;
            const METHOD: Method = Method::$variant;
        }
    };
}

method_marker!(GET, Get, NoBody);
method_marker!(POST, Post, CanHaveBody);
method_marker!(HEAD, Head, NoBody);
method_marker!(PUT, Put, CanHaveBody);
method_marker!(DELETE, Delete, CanHaveBody);
method_marker!(TRACE, Trace, CanHaveBody);
method_marker!(CONNECT, Connect, CanHaveBody);
method_marker!(OPTIONS, Options, NoBody);
method_marker!(PATCH, Patch, CanHaveBody);

#[cfg(test)]
mod tests {
    use super::*;

    fn static_capability<M: HttpMethod>(_: M) -> Method {
        M::METHOD
    }

    #[test]
    fn forbidding_methods() {
        let forbidding: Vec<Method> = Method::ALL
            .into_iter()
            .filter(|m| m.capability() == Capability::ForbidsBody)
            .collect();
        assert_eq!(forbidding, [Method::Get, Method::Head, Method::Options]);
    }

    #[test]
    fn forbids_body_only_permits_empty() {
        let cap = Method::Get.capability();
        assert!(cap.permits(BodyKind::Empty));
        for kind in [BodyKind::Bytes, BodyKind::Lazy, BodyKind::Json, BodyKind::UrlEncoded] {
            assert!(!cap.permits(kind), "{kind}");
        }
    }

    #[test]
    fn allows_body_permits_everything() {
        let cap = Method::Post.capability();
        for kind in [
            BodyKind::Empty,
            BodyKind::Bytes,
            BodyKind::Lazy,
            BodyKind::Json,
            BodyKind::UrlEncoded,
        ] {
            assert!(cap.permits(kind), "{kind}");
        }
    }

    #[test]
    fn markers_map_to_runtime_methods() {
        assert_eq!(static_capability(GET), Method::Get);
        assert_eq!(static_capability(PATCH), Method::Patch);
        assert_eq!(Method::Options.to_string(), "OPTIONS");
    }
}
