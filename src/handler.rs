//! Terminal handlers and how they are stored.
//!
//! A handler resolves to an [`Outcome`], not a bare response. Whatever it
//! returns is funnelled through [`IntoOutcome`]: a `Response`, a string or a
//! status becomes `Ok`, and the `Err` of a `Result` is boxed and handed back
//! as is. Nothing between the handler and the caller of
//! [`Dispatch::call`](crate::Dispatch::call) looks at that error, so a
//! `StoreDown` raised here is still a `StoreDown` when the host downcasts it,
//! and deciding which status a failure deserves stays with the host.
//!
//! ```rust
//! use verbrouter::{Request, Response};
//!
//! #[derive(Debug, thiserror::Error)]
//! #[error("store down")]
//! struct StoreDown;
//!
//! async fn load(_req: Request) -> Result<Response, StoreDown> {
//!     Err(StoreDown)
//! }
//! ```
//!
//! Storage is a type-erased `Arc<dyn ErasedHandler>`: one per registered
//! verb, shared by every dispatch built from that registration.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::Outcome;
use crate::request::Request;
use crate::response::IntoOutcome;

// ── Internal types ────────────────────────────────────────────────────────────

/// A heap-allocated, type-erased future that resolves to an [`Outcome`].
///
/// `Send + 'static` let a host move the future across threads or
/// `tokio::spawn` it.
pub type BoxFuture = Pin<Box<dyn Future<Output = Outcome> + Send + 'static>>;

/// Internal dispatch interface.
///
/// Public only because `Handler::into_boxed_handler` names it.
#[doc(hidden)]
pub trait ErasedHandler {
    fn call(&self, req: Request) -> BoxFuture;
}

#[doc(hidden)]
pub type BoxedHandler = Arc<dyn ErasedHandler + Send + Sync + 'static>;

// ── Public Handler trait ──────────────────────────────────────────────────────

/// Any async function of the request whose output converts into an
/// [`Outcome`]:
///
/// ```text
/// async fn name(req: Request) -> impl IntoOutcome
/// ```
///
/// Sealed: the blanket impl is the only one.
pub trait Handler: private::Sealed + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_handler(self) -> BoxedHandler;
}

mod private {
    pub trait Sealed {}
}

// ── Blanket implementations ───────────────────────────────────────────────────

impl<F, Fut, R> private::Sealed for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoOutcome + Send + 'static,
{
}

impl<F, Fut, R> Handler for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoOutcome + Send + 'static,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(FnHandler(self))
    }
}

// ── Concrete wrapper ──────────────────────────────────────────────────────────

struct FnHandler<F>(F);

impl<F, Fut, R> ErasedHandler for FnHandler<F>
where
    F: Fn(Request) -> Fut + Send + Sync,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoOutcome + Send + 'static,
{
    fn call(&self, req: Request) -> BoxFuture {
        let fut = (self.0)(req);
        Box::pin(async move { fut.await.into_outcome() })
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;
    use crate::response::Response;

    #[derive(Debug, thiserror::Error)]
    #[error("store down")]
    struct StoreDown;

    fn request() -> Request {
        Request::new(http::Request::get("/").body(Bytes::new()).unwrap())
    }

    #[tokio::test]
    async fn boxed_handler_keeps_the_error_type() {
        let handler = (|_req: Request| async { Err::<Response, _>(StoreDown) }).into_boxed_handler();

        let err = handler.call(request()).await.unwrap_err();

        assert!(err.downcast_ref::<StoreDown>().is_some());
    }

    #[tokio::test]
    async fn plain_values_become_ok() {
        let handler = (|_req: Request| async { "hello" }).into_boxed_handler();

        let res = handler.call(request()).await.unwrap();

        assert_eq!(res.body().as_ref(), b"hello");
    }
}
