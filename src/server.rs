//! HTTP server and graceful shutdown.
//!
//! The server is a thin carrier: it accepts connections, hands each request
//! to the [`Observer`] (when one is installed), and the observer calls into
//! the [`Router`] exactly once.
//!
//! ```text
//! hyper ──► Observer::observe ──► Router::lookup ──► handler
//!   ▲              │
//!   └── replayed response, then the exchange is logged
//! ```
//!
//! # Graceful shutdown
//!
//! On **SIGTERM** or **SIGINT** the server:
//! 1. Immediately stops `listener.accept()` — no new connections are made.
//! 2. Lets every in-flight connection task run to completion.
//! 3. Returns from [`Server::serve`], which lets `main` exit cleanly.

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http::StatusCode;
use http_body_util::{BodyExt, Either, Full};
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::error::{BoxError, Error};
use crate::middleware::{ObservedBody, Observer};
use crate::request::{Body, Request};
use crate::response::Response;
use crate::router::Router;

type ServedResponse = http::Response<ObservedBody<Full<Bytes>>>;

enum Bind {
    Addr(SocketAddr),
    Listener(TcpListener),
}

/// The HTTP server.
pub struct Server {
    bind: Bind,
    observer: Option<Observer>,
}

impl Server {
    /// Configures the server to bind to `addr` when [`serve`](Server::serve)
    /// is called.
    ///
    /// # Panics
    ///
    /// Panics if `addr` is not a valid `host:port` string.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use wiretap::Server;
    /// let server = Server::bind("0.0.0.0:3000");
    /// ```
    pub fn bind(addr: &str) -> Self {
        let addr: SocketAddr = addr.parse().expect("invalid socket address");
        Self { bind: Bind::Addr(addr), observer: None }
    }

    /// Serves on an already bound listener, e.g. one bound to port 0.
    pub fn from_listener(listener: TcpListener) -> Self {
        Self { bind: Bind::Listener(listener), observer: None }
    }

    /// Passes every request through `observer`.
    pub fn observe(mut self, observer: Observer) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Starts accepting connections and dispatching them through `router`.
    ///
    /// Returns only after a full graceful shutdown (SIGTERM or Ctrl-C,
    /// followed by all in-flight requests completing).
    pub async fn serve(self, router: Router) -> Result<(), Error> {
        self.serve_with_shutdown(router, shutdown_signal()).await
    }

    /// Like [`serve`](Server::serve), but stops accepting when `signal`
    /// resolves instead of waiting for a process signal.
    pub async fn serve_with_shutdown(
        self,
        router: Router,
        signal: impl Future<Output = ()>,
    ) -> Result<(), Error> {
        let listener = match self.bind {
            Bind::Addr(addr) => TcpListener::bind(addr).await?,
            Bind::Listener(listener) => listener,
        };
        let addr = listener.local_addr()?;

        let router = Arc::new(router);
        let observer = self.observer;

        info!(%addr, observed = observer.is_some(), "wiretap listening");

        let mut tasks = tokio::task::JoinSet::new();

        tokio::pin!(signal);

        loop {
            tokio::select! {
                // Check shutdown first so a signal stops accepting at once,
                // even if more connections are queued.
                biased;

                () = &mut signal => {
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

                    let router = Arc::clone(&router);
                    let observer = observer.clone();
                    let io = TokioIo::new(stream);

                    tasks.spawn(async move {
                        // Called once per request on the connection.
                        let svc = service_fn(move |req| {
                            let router = Arc::clone(&router);
                            let observer = observer.clone();
                            async move { dispatch(router, observer, req).await }
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

        info!("wiretap stopped");
        Ok(())
    }
}

// ── Request dispatch ──────────────────────────────────────────────────────────

/// Observes, routes, and answers one request.
///
/// Failures are answered here (404, 500) so hyper never sees an error. A
/// handler error is turned into a 500 only after it has passed back out of
/// the observer.
async fn dispatch(
    router: Arc<Router>,
    observer: Option<Observer>,
    req: http::Request<Incoming>,
) -> Result<ServedResponse, Infallible> {
    let outcome = match observer {
        Some(observer) => observer.observe(req, |req| route(&router, req.map(boxed))).await,
        None => route(&router, req.map(boxed)).await.map(|res| res.map(Either::Right)),
    };

    Ok(outcome.unwrap_or_else(|e| {
        error!(error = %e, "request failed");
        Response::status(StatusCode::INTERNAL_SERVER_ERROR).into_inner().map(Either::Right)
    }))
}

async fn route(router: &Router, req: http::Request<Body>) -> Result<http::Response<Full<Bytes>>, Error> {
    let Some((handler, params)) = router.lookup(req.method(), req.uri().path()) else {
        return Ok(Response::status(StatusCode::NOT_FOUND).into_inner());
    };
    let response = handler.call(Request::new(req, params)).await?;
    Ok(response.into_inner())
}

fn boxed<B>(body: B) -> Body
where
    B: hyper::body::Body<Data = Bytes> + Send + 'static,
    B::Error: Into<BoxError>,
{
    body.map_err(Into::into).boxed_unsync()
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on the first shutdown signal the process receives.
///
/// On Unix this listens for both **SIGTERM** and **SIGINT** (Ctrl-C).
/// On Windows only Ctrl-C is available.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to install Ctrl-C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    // `pending()` never resolves — on non-Unix platforms the SIGTERM arm is
    // effectively disabled.
    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c   => {}
        () = sigterm  => {}
    }
}
