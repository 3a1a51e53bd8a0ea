//! Per-endpoint method router.
//!
//! One handler per HTTP verb, global middleware in front of every verb, route
//! middleware in front of one. No paths: the host decides which endpoint a
//! request belongs to, the router only decides what runs for its method.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tracing::debug;

use crate::dispatch::{Dispatch, Exports};
use crate::handler::{BoxedHandler, Handler};
use crate::method::Method;
use crate::middleware::{BoxedMiddleware, Chain, Middleware, MiddlewareList};

/// Returns a new, empty [`Router`].
pub fn create_router() -> Router {
    Router::new()
}

struct Route {
    middleware: Vec<BoxedMiddleware>,
    handler: BoxedHandler,
}

/// The endpoint router.
///
/// Every registration call returns `&mut Self`, so they chain:
///
/// ```rust
/// # use verbrouter::{create_router, Request, Response, StatusCode};
/// # use verbrouter::middleware::Next;
/// # async fn log(_: Request, next: Next) -> verbrouter::error::Outcome { next.run().await }
/// # async fn auth(_: Request, next: Next) -> verbrouter::error::Outcome { next.run().await }
/// # async fn list(_: Request) -> Response { Response::text("") }
/// # async fn create(_: Request) -> StatusCode { StatusCode::CREATED }
/// let mut router = create_router();
/// router
///     .with(log)
///     .get(list)
///     .post_with(create, (auth,));
///
/// let exports = router.export();
/// assert_eq!(exports.len(), 2);
/// ```
///
/// For a request with method `M` the composed order is: global middleware in
/// insertion order, `M`'s route middleware in registration order, `M`'s
/// handler. Composition happens when a [`Dispatch`] is built, so global
/// middleware added after a verb was registered still applies to it.
pub struct Router {
    middleware: Vec<BoxedMiddleware>,
    routes: HashMap<Method, Route>,
}

macro_rules! verb {
    ($method:expr, $name:ident, $name_with:ident, $doc:literal) => {
        #[doc = concat!("Registers the `", $doc, "` handler with no route middleware.")]
        pub fn $name(&mut self, handler: impl Handler) -> &mut Self {
            self.on($method, handler)
        }

        #[doc = concat!("Registers the `", $doc, "` handler behind a tuple of route middleware.")]
        pub fn $name_with(
            &mut self,
            handler: impl Handler,
            middleware: impl MiddlewareList,
        ) -> &mut Self {
            self.on_with($method, handler, middleware)
        }
    };
}

impl Router {
    pub fn new() -> Self {
        Self { middleware: Vec::new(), routes: HashMap::new() }
    }

    /// Appends a global middleware. It runs for every verb, after the global
    /// middleware added before it and before any route middleware.
    pub fn with(&mut self, middleware: impl Middleware) -> &mut Self {
        self.middleware.push(middleware.into_boxed_middleware());
        self
    }

    /// Registers `handler` for `method`. Replaces any earlier registration.
    pub fn on(&mut self, method: Method, handler: impl Handler) -> &mut Self {
        self.on_with(method, handler, ())
    }

    /// Registers `handler` for `method` behind `middleware` (run left to
    /// right). Replaces any earlier registration, middleware included.
    pub fn on_with(
        &mut self,
        method: Method,
        handler: impl Handler,
        middleware: impl MiddlewareList,
    ) -> &mut Self {
        let route = Route {
            middleware: middleware.into_boxed_list(),
            handler: handler.into_boxed_handler(),
        };
        let count = route.middleware.len();
        match self.routes.insert(method, route) {
            Some(_) => debug!(%method, middleware = count, "route replaced"),
            None => debug!(%method, middleware = count, "route registered"),
        }
        self
    }

    verb!(Method::Get,     get,     get_with,     "GET");
    verb!(Method::Head,    head,    head_with,    "HEAD");
    verb!(Method::Post,    post,    post_with,    "POST");
    verb!(Method::Put,     put,     put_with,     "PUT");
    verb!(Method::Patch,   patch,   patch_with,   "PATCH");
    verb!(Method::Delete,  delete,  delete_with,  "DELETE");
    verb!(Method::Options, options, options_with, "OPTIONS");

    /// Returns the composed dispatch function for a method name.
    ///
    /// Matching is exact: `"get"` is not `"GET"`. Unknown or unregistered
    /// methods get a dispatch that answers `405` without running anything.
    pub fn get_handler(&self, method: &str) -> Dispatch {
        match method.parse::<Method>() {
            Ok(m) if self.routes.contains_key(&m) => self.dispatch(m),
            _ => Dispatch::not_allowed(method, self.allow()),
        }
    }

    /// Typed form of [`get_handler`](Router::get_handler).
    pub fn dispatch(&self, method: Method) -> Dispatch {
        let Some(route) = self.routes.get(&method) else {
            return Dispatch::not_allowed(method.as_str(), self.allow());
        };

        if self.middleware.is_empty() && route.middleware.is_empty() {
            return Dispatch::handler(Arc::clone(&route.handler));
        }

        let middleware = self.middleware.iter()
            .chain(&route.middleware)
            .cloned()
            .collect();
        Dispatch::chain(Chain::new(middleware, Arc::clone(&route.handler)))
    }

    /// One dispatch per registered verb. Unregistered verbs have no entry.
    pub fn export(&self) -> Exports {
        let handlers: BTreeMap<_, _> = self.routes.keys()
            .map(|&m| (m, self.dispatch(m)))
            .collect();
        Exports::new(handlers)
    }

    /// Registered verbs in canonical order.
    pub fn methods(&self) -> Vec<Method> {
        Method::ALL.into_iter()
            .filter(|m| self.routes.contains_key(m))
            .collect()
    }

    pub fn is_registered(&self, method: Method) -> bool {
        self.routes.contains_key(&method)
    }

    fn allow(&self) -> Arc<[Method]> {
        self.methods().into()
    }
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}

impl From<&Router> for Exports {
    fn from(router: &Router) -> Self {
        router.export()
    }
}
