//! Middleware layer.
//!
//! A middleware is an async function of `(Request, Next)`. It either awaits
//! [`Next::run`] to continue the chain (and may post-process the response it
//! gets back), or returns its own response without calling it, which stops
//! the chain right there:
//!
//! ```rust
//! use verbrouter::{Request, Response, StatusCode};
//! use verbrouter::middleware::Next;
//! use verbrouter::error::Outcome;
//!
//! async fn require_token(req: Request, next: Next) -> Outcome {
//!     if req.header("authorization").is_none() {
//!         return Ok(Response::status(StatusCode::UNAUTHORIZED));
//!     }
//!     let mut res = next.run().await?;
//!     res.set_header("x-authenticated", "1");
//!     Ok(res)
//! }
//! ```
//!
//! Global middleware is attached with [`Router::with`](crate::Router::with);
//! route middleware is passed as a tuple to the `*_with` registration methods.

mod next;
mod trace;

use std::future::Future;
use std::sync::Arc;

use crate::handler::BoxFuture;
use crate::request::Request;
use crate::response::IntoOutcome;

pub use next::Next;
pub(crate) use next::Chain;
pub use trace::trace;

// ── Internal types ────────────────────────────────────────────────────────────

#[doc(hidden)]
pub trait ErasedMiddleware {
    fn call(&self, req: Request, next: Next) -> BoxFuture;
}

#[doc(hidden)]
pub type BoxedMiddleware = Arc<dyn ErasedMiddleware + Send + Sync + 'static>;

// ── Public Middleware trait ───────────────────────────────────────────────────

/// Implemented for every valid middleware function:
///
/// ```text
/// async fn name(req: Request, next: Next) -> impl IntoOutcome
/// ```
///
/// Sealed, like [`Handler`](crate::Handler).
pub trait Middleware: private::Sealed + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_middleware(self) -> BoxedMiddleware;
}

mod private {
    pub trait Sealed {}
}

impl<F, Fut, R> private::Sealed for F
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoOutcome + Send + 'static,
{
}

impl<F, Fut, R> Middleware for F
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoOutcome + Send + 'static,
{
    fn into_boxed_middleware(self) -> BoxedMiddleware {
        Arc::new(FnMiddleware(self))
    }
}

struct FnMiddleware<F>(F);

impl<F, Fut, R> ErasedMiddleware for FnMiddleware<F>
where
    F: Fn(Request, Next) -> Fut + Send + Sync,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoOutcome + Send + 'static,
{
    fn call(&self, req: Request, next: Next) -> BoxFuture {
        let fut = (self.0)(req, next);
        Box::pin(async move { fut.await.into_outcome() })
    }
}

// ── Route middleware lists ────────────────────────────────────────────────────

/// An ordered list of route middleware: `()` or a tuple of up to eight
/// [`Middleware`] values. Elements run left to right.
pub trait MiddlewareList {
    #[doc(hidden)]
    fn into_boxed_list(self) -> Vec<BoxedMiddleware>;
}

impl MiddlewareList for () {
    fn into_boxed_list(self) -> Vec<BoxedMiddleware> {
        Vec::new()
    }
}

macro_rules! impl_middleware_list {
    ($($ty:ident),+) => {
        impl<$($ty: Middleware),+> MiddlewareList for ($($ty,)+) {
            #[allow(non_snake_case)]
            fn into_boxed_list(self) -> Vec<BoxedMiddleware> {
                let ($($ty,)+) = self;
                vec![$($ty.into_boxed_middleware()),+]
            }
        }
    };
}

impl_middleware_list!(M1);
impl_middleware_list!(M1, M2);
impl_middleware_list!(M1, M2, M3);
impl_middleware_list!(M1, M2, M3, M4);
impl_middleware_list!(M1, M2, M3, M4, M5);
impl_middleware_list!(M1, M2, M3, M4, M5, M6);
impl_middleware_list!(M1, M2, M3, M4, M5, M6, M7);
impl_middleware_list!(M1, M2, M3, M4, M5, M6, M7, M8);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::Response;

    async fn pass(_req: Request, next: Next) -> crate::error::Outcome {
        next.run().await
    }

    async fn deny(_req: Request, _next: Next) -> Response {
        Response::status(http::StatusCode::FORBIDDEN)
    }

    #[test]
    fn lists_keep_their_length() {
        assert_eq!(().into_boxed_list().len(), 0);
        assert_eq!((pass,).into_boxed_list().len(), 1);
        assert_eq!((pass, deny, pass).into_boxed_list().len(), 3);
    }
}
