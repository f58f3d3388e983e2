//! The accept loop.
//!
//! Each connection gets its own tokio task, and hyper-util's auto builder
//! negotiates HTTP/1.1 or HTTP/2 on it. Once the shutdown future resolves the
//! listener is dropped, and `serve` returns when the last open connection
//! finishes.

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use http::StatusCode;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::error::Error;
use crate::middleware::AccessLog;
use crate::request::Request;
use crate::response::Response;
use crate::router::Router;

/// Serves a [`Router`] over TCP.
///
/// ```rust,no_run
/// # async fn run(app: autoroute::Router) -> Result<(), autoroute::Error> {
/// use autoroute::{AccessLog, Server};
///
/// Server::bind("0.0.0.0:3000")
///     .access_log(AccessLog::default())
///     .serve(app)
///     .await
/// # }
/// ```
pub struct Server {
    addr: SocketAddr,
    access_log: Option<AccessLog>,
}

impl Server {
    /// # Panics
    ///
    /// Panics unless `addr` parses as a `host:port` socket address.
    pub fn bind(addr: &str) -> Self {
        match addr.parse() {
            Ok(addr) => Self { addr, access_log: None },
            Err(e) => panic!("cannot bind to `{addr}`: {e}"),
        }
    }

    /// Logs every request at `info` using `log`'s layout.
    pub fn access_log(self, log: AccessLog) -> Self {
        Self { access_log: Some(log), ..self }
    }

    /// Serves until SIGTERM or Ctrl-C, then drains open connections.
    pub async fn serve(self, router: Router) -> Result<(), Error> {
        self.serve_with_shutdown(router, shutdown_signal()).await
    }

    /// Serves until `signal` resolves, then drains open connections.
    pub async fn serve_with_shutdown(
        self,
        router: Router,
        signal: impl Future<Output = ()> + Send,
    ) -> Result<(), Error> {
        let listener = TcpListener::bind(self.addr).await?;
        // One routing table for every connection task; tasks clone the Arc.
        let app = Arc::new(App { router, access_log: self.access_log });
        // Owns every connection task so shutdown can wait for them.
        let mut connections = JoinSet::new();
        info!(addr = %self.addr, "autoroute listening");

        // `select!` polls the signal by reference across iterations, which
        // needs it pinned in place.
        tokio::pin!(signal);
        loop {
            tokio::select! {
                // Stop accepting as soon as the signal fires, even with a
                // backlog of pending connections.
                biased;

                () = &mut signal => break,

                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        connections.spawn(Arc::clone(&app).serve_connection(stream, peer));
                    }
                    Err(e) => warn!("accept failed: {e}"),
                },

                // Reap finished connections so the set stays as large as the
                // number of open ones.
                Some(_) = connections.join_next(), if !connections.is_empty() => {}
            }
        }

        drop(listener);
        info!(open = connections.len(), "shutting down, waiting for open connections");
        while connections.join_next().await.is_some() {}
        info!("autoroute stopped");
        Ok(())
    }
}

struct App {
    router: Router,
    access_log: Option<AccessLog>,
}

impl App {
    async fn serve_connection(self: Arc<Self>, stream: TcpStream, peer: SocketAddr) {
        // Called once per request, not once per connection: a keep-alive or
        // HTTP/2 connection carries many.
        let service = service_fn(move |req| {
            let app = Arc::clone(&self);
            async move { Ok::<_, Infallible>(app.respond(req, peer).await) }
        });

        // TokioIo adapts tokio's AsyncRead/AsyncWrite to hyper's IO traits;
        // the auto builder speaks whichever HTTP version the client picks.
        let served = ConnBuilder::new(TokioExecutor::new())
            .serve_connection(TokioIo::new(stream), service)
            .await;
        if let Err(e) = served {
            error!(%peer, "connection error: {e}");
        }
    }

    async fn respond(&self, req: hyper::Request<Incoming>, peer: SocketAddr) -> http::Response<Full<Bytes>> {
        let started = Instant::now();
        let (parts, incoming) = req.into_parts();
        let body = match incoming.collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(e) => {
                debug!(%peer, "request body unreadable: {e}");
                return Response::status(StatusCode::BAD_REQUEST).into_inner();
            }
        };
        let req = Request::from_parts(parts, body).with_remote_addr(peer);

        let response = match &self.access_log {
            Some(log) => {
                let summary = log.capture(&req);
                let response = self.router.call(req).await;
                info!("{}", log.render(&summary, response.status_code(), started.elapsed()));
                response
            }
            None => self.router.call(req).await,
        };
        response.into_inner()
    }
}

/// SIGTERM or Ctrl-C, whichever arrives first. A signal whose handler cannot
/// be installed is logged and never fires.
async fn shutdown_signal() {
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("cannot listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("cannot listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = interrupt => info!("received Ctrl-C"),
        () = terminate => info!("received SIGTERM"),
    }
}
