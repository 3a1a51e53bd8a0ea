//! Minimal HTTP host for one endpoint, with graceful shutdown.
//!
//! Every request, whatever its path, goes to [`Exports::dispatch`]. Mapping
//! URL paths to endpoints is the hosting framework's job; this server exists
//! to run a single endpoint for demos and smoke tests.
//!
//! On SIGTERM or Ctrl-C the server:
//! 1. Immediately stops `listener.accept()`; no new connections are made.
//! 2. Lets every in-flight connection task run to completion.
//! 3. Returns from [`Server::serve`], which lets `main` exit cleanly.

use std::convert::Infallible;
use std::fmt;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http::StatusCode;
use http_body_util::{BodyExt, Full};
use hyper::body::{Body, Incoming};
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::dispatch::Exports;
use crate::error::Error;
use crate::request::Request;
use crate::response::Response;

/// The HTTP server.
pub struct Server {
    addr: String,
}

impl Server {
    /// Configures the server to bind to `addr` (`host:port`) when
    /// [`serve`](Server::serve) is called.
    ///
    /// ```rust,no_run
    /// use verbrouter::Server;
    /// let server = Server::bind("0.0.0.0:3000");
    /// ```
    pub fn bind(addr: impl Into<String>) -> Self {
        Self { addr: addr.into() }
    }

    /// Starts accepting connections and dispatching them through `exports`.
    ///
    /// Fails fast with [`Error::Addr`] on an unparseable address. Otherwise
    /// returns only after a full graceful shutdown.
    pub async fn serve(self, exports: impl Into<Exports>) -> Result<(), Error> {
        let addr: SocketAddr = self.addr.parse()
            .map_err(|source| Error::Addr { addr: self.addr.clone(), source })?;
        let listener = TcpListener::bind(addr).await?;
        run(listener, exports.into(), shutdown_signal()).await
    }
}

/// Accept loop. Stops accepting once `shutdown` resolves, then drains.
async fn run(
    listener: TcpListener,
    exports: Exports,
    shutdown: impl Future<Output = ()>,
) -> Result<(), Error> {
    let addr = listener.local_addr()?;
    let exports = Arc::new(exports);

    info!(%addr, methods = ?exports.methods().collect::<Vec<_>>(), "verbrouter listening");

    let mut tasks = tokio::task::JoinSet::new();

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            // Check shutdown first so a SIGTERM stops accepting at once,
            // even if more connections are queued.
            biased;

            () = &mut shutdown => {
                info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                break;
            }

            res = listener.accept() => {
                let (stream, remote_addr) = match res {
                    Ok(v) => v,
                    Err(e) => {
                        error!("accept error: {e}");
                        continue;
                    }
                };

                let exports = Arc::clone(&exports);
                let io = TokioIo::new(stream);

                tasks.spawn(async move {
                    // Called once per request on the connection.
                    let svc = service_fn(move |req: hyper::Request<Incoming>| {
                        let exports = Arc::clone(&exports);
                        async move { dispatch(exports, req).await }
                    });

                    if let Err(e) = ConnBuilder::new(TokioExecutor::new())
                        .serve_connection(io, svc)
                        .await
                    {
                        error!(peer = %remote_addr, "connection error: {e}");
                    }
                });
            }

            // Reap finished connection tasks so the JoinSet does not grow
            // without bound on long-running servers.
            Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
        }
    }

    while tasks.join_next().await.is_some() {}

    info!("verbrouter stopped");
    Ok(())
}

// ── Request dispatch ──────────────────────────────────────────────────────────

/// Buffers the body, runs the endpoint, and turns a failed outcome into a 500.
///
/// The error type is `Infallible`: hyper never sees a failure.
async fn dispatch<B>(
    exports: Arc<Exports>,
    req: hyper::Request<B>,
) -> Result<http::Response<Full<Bytes>>, Infallible>
where
    B: Body<Data = Bytes>,
    B::Error: fmt::Display,
{
    let (parts, body) = req.into_parts();
    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            warn!(error = %e, "failed to read request body");
            return Ok(Response::status(StatusCode::BAD_REQUEST).into_inner());
        }
    };

    let req = Request::new(http::Request::from_parts(parts, body));
    let response = match exports.dispatch(req).await {
        Ok(res) => res,
        Err(e) => {
            error!(error = %e, "handler failed");
            Response::status(StatusCode::INTERNAL_SERVER_ERROR)
        }
    };

    Ok(response.into_inner())
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on the first SIGTERM or SIGINT (Ctrl-C). On Windows only Ctrl-C
/// is available. A signal that cannot be installed is logged and never fires.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to install Ctrl-C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c   => {}
        () = sigterm  => {}
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::pin::Pin;
    use std::task::{Context, Poll};

    use hyper::body::Frame;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;
    use tokio::sync::oneshot;

    use super::*;
    use crate::router::create_router;

    #[derive(Debug, thiserror::Error)]
    #[error("store down")]
    struct StoreDown;

    /// A body whose connection drops before the first frame.
    struct BrokenBody;

    impl Body for BrokenBody {
        type Data = Bytes;
        type Error = io::Error;

        fn poll_frame(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
        ) -> Poll<Option<Result<Frame<Bytes>, io::Error>>> {
            Poll::Ready(Some(Err(io::Error::other("connection reset"))))
        }
    }

    fn endpoint() -> Exports {
        let mut router = create_router();
        router
            .get(|_req: Request| async { Err::<Response, _>(StoreDown) })
            .post(|req: Request| async move { Response::text(format!("{} bytes", req.body().len())) });
        router.export()
    }

    async fn send(addr: SocketAddr, raw: &str) -> String {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(raw.as_bytes()).await.unwrap();
        let mut buf = Vec::new();
        stream.read_to_end(&mut buf).await.unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[tokio::test]
    async fn invalid_address_is_rejected() {
        let router = create_router();
        let err = Server::bind("nope").serve(&router).await.unwrap_err();

        assert!(matches!(err, Error::Addr { ref addr, .. } if addr == "nope"));
        assert!(err.to_string().starts_with("invalid bind address `nope`"));
    }

    #[tokio::test]
    async fn unreadable_body_is_400() {
        let req = hyper::Request::post("/").body(BrokenBody).unwrap();
        let res = dispatch(Arc::new(endpoint()), req).await.unwrap();

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn buffered_body_reaches_the_handler() {
        let req = hyper::Request::post("/")
            .body(Full::new(Bytes::from_static(b"abcd")))
            .unwrap();
        let res = dispatch(Arc::new(endpoint()), req).await.unwrap();

        assert_eq!(res.status(), StatusCode::OK);
        let body = res.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(body.as_ref(), b"4 bytes");
    }

    #[tokio::test]
    async fn handler_failure_is_500() {
        let req = hyper::Request::get("/").body(Full::new(Bytes::new())).unwrap();
        let res = dispatch(Arc::new(endpoint()), req).await.unwrap();

        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn serves_over_tcp_until_shutdown() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (stop, stopped) = oneshot::channel::<()>();
        let server = tokio::spawn(run(listener, endpoint(), async {
            let _ = stopped.await;
        }));

        let failed = send(
            addr,
            "GET /anything HTTP/1.1\r\nhost: localhost\r\nconnection: close\r\n\r\n",
        ).await;
        assert!(failed.starts_with("HTTP/1.1 500 Internal Server Error"), "{failed}");

        let rejected = send(
            addr,
            "PUT / HTTP/1.1\r\nhost: localhost\r\ncontent-length: 0\r\nconnection: close\r\n\r\n",
        ).await;
        assert!(rejected.starts_with("HTTP/1.1 405 Method Not Allowed"), "{rejected}");
        assert!(rejected.contains("allow: GET, POST\r\n"), "{rejected}");
        assert!(rejected.ends_with(r#"{"error":"Method not allowed"}"#), "{rejected}");

        stop.send(()).unwrap();
        server.await.unwrap().unwrap();
    }
}
