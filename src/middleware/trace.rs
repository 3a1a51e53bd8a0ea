use std::time::Instant;

use tracing::{Instrument, info, info_span, warn};

use crate::error::Outcome;
use crate::middleware::Next;
use crate::request::Request;

/// Per-request span with method, path, status and latency.
///
/// The outcome is returned untouched, failures included; they are only
/// recorded.
///
/// ```rust
/// use verbrouter::{create_router, middleware, Request};
///
/// let mut router = create_router();
/// router.with(middleware::trace).get(|_req: Request| async { "ok" });
/// ```
pub async fn trace(req: Request, next: Next) -> Outcome {
    let span = info_span!("request", method = %req.method(), path = %req.path());

    async move {
        let started = Instant::now();
        let outcome = next.run().await;
        let latency_us = started.elapsed().as_micros() as u64;
        match &outcome {
            Ok(res) => info!(status = res.status_code().as_u16(), latency_us, "request completed"),
            Err(e) => warn!(error = %e, latency_us, "request failed"),
        }
        outcome
    }
    .instrument(span)
    .await
}
