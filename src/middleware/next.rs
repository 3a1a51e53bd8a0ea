//! The continuation handed to every middleware.

use std::fmt;
use std::sync::Arc;

use crate::handler::{BoxFuture, BoxedHandler};
use crate::middleware::BoxedMiddleware;
use crate::request::Request;

/// A composed chain: global middleware, then route middleware, then the
/// handler. Built once per dispatch and shared by every request it serves.
pub(crate) struct Chain {
    middleware: Box<[BoxedMiddleware]>,
    handler: BoxedHandler,
}

impl Chain {
    pub(crate) fn new(middleware: Vec<BoxedMiddleware>, handler: BoxedHandler) -> Self {
        Self { middleware: middleware.into_boxed_slice(), handler }
    }

    /// Starts a request at the first step of the chain.
    pub(crate) fn start(chain: &Arc<Self>, req: Request) -> BoxFuture {
        Next { chain: Arc::clone(chain), index: 0, req }.run()
    }
}

/// The rest of the chain after the current middleware.
///
/// [`run`](Next::run) consumes `self`, so a middleware can resume the chain at
/// most once. Dropping `Next` without running it short-circuits: no later
/// middleware and no handler execute.
pub struct Next {
    chain: Arc<Chain>,
    index: usize,
    req: Request,
}

impl Next {
    /// The request flowing through the chain.
    pub fn request(&self) -> &Request {
        &self.req
    }

    /// The request the rest of the chain will receive. Extensions inserted
    /// here are visible to every later middleware and to the handler.
    pub fn request_mut(&mut self) -> &mut Request {
        &mut self.req
    }

    /// Resumes the chain: the next middleware if any is left, the handler
    /// otherwise. Resolves to whatever that step and everything after it
    /// produce.
    pub fn run(self) -> BoxFuture {
        let Next { chain, index, req } = self;
        let step = chain.middleware.get(index).cloned();
        match step {
            Some(middleware) => {
                let next = Next { chain, index: index + 1, req: req.clone() };
                middleware.call(req, next)
            }
            None => chain.handler.call(req),
        }
    }
}

impl fmt::Debug for Next {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Next")
            .field("step", &self.index)
            .field("middleware", &self.chain.middleware.len())
            .finish()
    }
}
