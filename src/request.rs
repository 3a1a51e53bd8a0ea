//! Incoming HTTP request type.

use std::sync::Arc;

use bytes::Bytes;
use http::{Extensions, HeaderMap, Uri};

/// An incoming HTTP request.
///
/// The host builds it; the router only hands it down the chain. Method, URI,
/// headers and body sit behind an `Arc` and are read-only, so every step sees
/// the same bytes.
///
/// The [`extensions`](Request::extensions) map is the one writable part. A
/// middleware fills it on the request it forwards, through
/// [`Next::request_mut`](crate::middleware::Next::request_mut), and later
/// middleware and the handler read it back:
///
/// ```rust
/// use verbrouter::{create_router, Request, Response};
/// use verbrouter::middleware::Next;
/// use verbrouter::error::Outcome;
///
/// #[derive(Clone)]
/// struct User(String);
///
/// async fn authenticate(_req: Request, mut next: Next) -> Outcome {
///     next.request_mut().extensions_mut().insert(User("alice".into()));
///     next.run().await
/// }
///
/// async fn whoami(req: Request) -> Response {
///     let name = req.extensions().get::<User>().map_or("anonymous", |u| u.0.as_str());
///     Response::text(name.to_owned())
/// }
///
/// let mut router = create_router();
/// router.with(authenticate).get(whoami);
/// ```
///
/// Each step gets its own copy of the extensions: inserting into the `req`
/// argument of a middleware does not reach the steps after it.
#[derive(Clone, Debug)]
pub struct Request {
    inner: Arc<http::Request<Bytes>>,
    extensions: Extensions,
}

impl Request {
    /// Wraps a host request. Its extensions move into the writable map.
    pub fn new(mut req: http::Request<Bytes>) -> Self {
        let extensions = std::mem::take(req.extensions_mut());
        Self { inner: Arc::new(req), extensions }
    }

    pub fn method(&self) -> &http::Method { self.inner.method() }
    pub fn uri(&self) -> &Uri { self.inner.uri() }
    pub fn path(&self) -> &str { self.inner.uri().path() }
    pub fn headers(&self) -> &HeaderMap { self.inner.headers() }
    pub fn body(&self) -> &Bytes { self.inner.body() }
    pub fn extensions(&self) -> &Extensions { &self.extensions }
    pub fn extensions_mut(&mut self) -> &mut Extensions { &mut self.extensions }

    /// Header lookup. `HeaderMap` keys are case-insensitive; values that are
    /// not visible ASCII are skipped.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.inner.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
    }
}

impl From<http::Request<Bytes>> for Request {
    fn from(req: http::Request<Bytes>) -> Self {
        Self::new(req)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    struct Tenant(&'static str);

    #[test]
    fn clones_share_the_same_request() {
        let req = Request::new(
            http::Request::post("http://localhost:3000/api/test?x=1")
                .header("X-Token", "abc")
                .body(Bytes::from_static(b"{}"))
                .unwrap(),
        );
        let other = req.clone();

        assert_eq!(other.method(), http::Method::POST);
        assert_eq!(other.path(), "/api/test");
        assert_eq!(other.header("x-token"), Some("abc"));
        assert_eq!(other.body().as_ref(), b"{}");
        assert!(std::ptr::eq(req.body(), other.body()));
    }

    #[test]
    fn host_extensions_are_kept() {
        let req = Request::new(
            http::Request::get("/")
                .extension(Tenant("acme"))
                .body(Bytes::new())
                .unwrap(),
        );
        assert_eq!(req.extensions().get::<Tenant>(), Some(&Tenant("acme")));
    }

    #[test]
    fn extensions_are_per_copy() {
        let mut req = Request::new(http::Request::get("/").body(Bytes::new()).unwrap());
        let before = req.clone();
        req.extensions_mut().insert(Tenant("acme"));

        assert_eq!(req.extensions().get::<Tenant>(), Some(&Tenant("acme")));
        assert!(before.extensions().get::<Tenant>().is_none());
    }
}
