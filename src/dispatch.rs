//! Composed dispatch functions and the per-verb export map.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use http::StatusCode;
use serde::Serialize;
use tracing::debug;

use crate::handler::{BoxFuture, BoxedHandler};
use crate::method::Method;
use crate::middleware::Chain;
use crate::request::Request;
use crate::response::{IntoResponse, Json, Response};

/// The single async function a host calls for one verb.
///
/// Obtained from [`Router::get_handler`](crate::Router::get_handler) or
/// [`Router::export`](crate::Router::export). Cloning is cheap; every clone
/// runs the same composed chain.
#[derive(Clone)]
pub struct Dispatch {
    kind: Kind,
}

#[derive(Clone)]
enum Kind {
    /// No middleware at all: straight to the handler.
    Handler(BoxedHandler),
    Chain(Arc<Chain>),
    NotAllowed { method: Arc<str>, allow: Arc<[Method]> },
}

impl Dispatch {
    pub(crate) fn handler(handler: BoxedHandler) -> Self {
        Self { kind: Kind::Handler(handler) }
    }

    pub(crate) fn chain(chain: Chain) -> Self {
        Self { kind: Kind::Chain(Arc::new(chain)) }
    }

    pub(crate) fn not_allowed(method: &str, allow: Arc<[Method]>) -> Self {
        Self { kind: Kind::NotAllowed { method: Arc::from(method), allow } }
    }

    /// Runs the request through the chain.
    ///
    /// Resolves to `Ok(405)` without running any middleware when this
    /// dispatch belongs to an unregistered method. Handler and middleware
    /// failures come back as `Err`, exactly as they were raised.
    pub fn call(&self, req: Request) -> BoxFuture {
        match &self.kind {
            Kind::Handler(handler) => handler.call(req),
            Kind::Chain(chain) => Chain::start(chain, req),
            Kind::NotAllowed { method, allow } => {
                debug!(method = %method, "method not allowed");
                let res = method_not_allowed(allow);
                Box::pin(async move { Ok(res) })
            }
        }
    }

    /// `false` for the 405 dispatch of an unregistered method.
    pub fn is_allowed(&self) -> bool {
        !matches!(self.kind, Kind::NotAllowed { .. })
    }
}

impl fmt::Debug for Dispatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            Kind::Handler(_) => f.write_str("Dispatch::Handler"),
            Kind::Chain(_) => f.write_str("Dispatch::Chain"),
            Kind::NotAllowed { method, .. } => write!(f, "Dispatch::NotAllowed({method})"),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
}

/// `405 Method Not Allowed` with a JSON error body. The `allow` header is
/// only sent when at least one verb is registered.
pub(crate) fn method_not_allowed(allow: &[Method]) -> Response {
    let mut res = Json(ErrorBody { error: "Method not allowed" }).into_response();
    res.set_status(StatusCode::METHOD_NOT_ALLOWED);
    if !allow.is_empty() {
        let list: Vec<&str> = allow.iter().map(|m| m.as_str()).collect();
        res.set_header("allow", &list.join(", "));
    }
    res
}

// ── Exports ───────────────────────────────────────────────────────────────────

/// One dispatch function per registered verb, and nothing else.
///
/// This is what a host mounts for an endpoint: look a verb up with
/// [`get`](Exports::get) / [`get_by_name`](Exports::get_by_name), or let
/// [`dispatch`](Exports::dispatch) pick the entry from the request method.
#[derive(Clone, Debug)]
pub struct Exports {
    handlers: BTreeMap<Method, Dispatch>,
    allow: Arc<[Method]>,
}

impl Exports {
    pub(crate) fn new(handlers: BTreeMap<Method, Dispatch>) -> Self {
        let allow = handlers.keys().copied().collect();
        Self { handlers, allow }
    }

    pub fn get(&self, method: Method) -> Option<&Dispatch> {
        self.handlers.get(&method)
    }

    /// Exact, case-sensitive lookup by verb name.
    pub fn get_by_name(&self, method: &str) -> Option<&Dispatch> {
        let method = method.parse::<Method>().ok()?;
        self.handlers.get(&method)
    }

    pub fn contains(&self, method: Method) -> bool {
        self.handlers.contains_key(&method)
    }

    /// Registered verbs in canonical order.
    pub fn methods(&self) -> impl Iterator<Item = Method> + '_ {
        self.handlers.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Method, &Dispatch)> + '_ {
        self.handlers.iter().map(|(m, d)| (*m, d))
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Routes `req` by its own method: the exported dispatch for that verb,
    /// or `405` listing the exported verbs in `allow`.
    pub fn dispatch(&self, req: Request) -> BoxFuture {
        let method = req.method().as_str();
        match self.get_by_name(method) {
            Some(dispatch) => dispatch.call(req),
            None => Dispatch::not_allowed(method, Arc::clone(&self.allow)).call(req),
        }
    }
}

impl IntoIterator for Exports {
    type Item = (Method, Dispatch);
    type IntoIter = std::collections::btree_map::IntoIter<Method, Dispatch>;

    fn into_iter(self) -> Self::IntoIter {
        self.handlers.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_allowed_body_is_json() {
        let res = method_not_allowed(&[]);
        assert_eq!(res.status_code(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(res.header("content-type"), Some("application/json"));
        assert_eq!(res.header("allow"), None);

        let body: serde_json::Value = serde_json::from_slice(res.body()).unwrap();
        assert_eq!(body["error"], "Method not allowed");
    }

    #[test]
    fn not_allowed_lists_registered_verbs() {
        let res = method_not_allowed(&[Method::Get, Method::Post]);
        assert_eq!(res.header("allow"), Some("GET, POST"));
    }
}
