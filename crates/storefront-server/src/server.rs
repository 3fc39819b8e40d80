//! HTTP/1 server loop.
//!
//! Each accepted connection is served on its own task. Request bodies are
//! buffered up to the configured limit before routing; a 204 answer is sent
//! without a body.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http::StatusCode;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use storefront_config::ServerConfig;
use storefront_middleware::{envelope, MiddlewareContext, Request, Response};
use storefront_telemetry::InFlightGuard;
use tokio::net::{TcpListener, TcpStream};

use crate::error::ServerError;
use crate::routes::{stamp_request_id, App};
use crate::shutdown::{ConnectionTracker, ShutdownSignal};

/// Serves an [`App`] over TCP.
#[derive(Debug)]
pub struct Server {
    app: Arc<App>,
    config: ServerConfig,
}

impl Server {
    /// Creates a server for `app`.
    pub fn new(app: App, config: ServerConfig) -> Self {
        Self {
            app: Arc::new(app),
            config,
        }
    }

    /// Binds the configured address and serves until SIGTERM or Ctrl-C.
    ///
    /// # Errors
    ///
    /// Fails when the address is invalid or cannot be bound.
    pub async fn run(self) -> Result<(), ServerError> {
        self.run_with_shutdown(ShutdownSignal::from_os_signals()).await
    }

    /// Binds the configured address and serves until `shutdown` triggers.
    ///
    /// # Errors
    ///
    /// Fails when the address is invalid or cannot be bound.
    pub async fn run_with_shutdown(self, shutdown: ShutdownSignal) -> Result<(), ServerError> {
        let addr = self.config.socket_addr()?;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;
        self.serve(listener, shutdown).await
    }

    /// Serves connections from an already bound listener.
    ///
    /// After `shutdown` triggers, open connections get up to the
    /// configured grace period to finish.
    ///
    /// # Errors
    ///
    /// Fails only if the listener's local address cannot be read.
    pub async fn serve(self, listener: TcpListener, shutdown: ShutdownSignal) -> Result<(), ServerError> {
        let local = listener.local_addr()?;
        tracing::info!(addr = %local, "storefront listening");

        let tracker = ConnectionTracker::new();
        let this = Arc::new(self);

        loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((stream, remote)) => {
                        let guard = tracker.track();
                        let server = Arc::clone(&this);
                        let shutdown = shutdown.clone();
                        tokio::spawn(async move {
                            server.serve_connection(stream, remote, shutdown).await;
                            drop(guard);
                        });
                    }
                    Err(err) => tracing::warn!(error = %err, "failed to accept connection"),
                },
                () = shutdown.wait() => break,
            }
        }

        let grace = this.config.shutdown_timeout();
        tracing::info!(active = tracker.active(), ?grace, "draining connections");
        if tokio::time::timeout(grace, tracker.drained()).await.is_err() {
            tracing::warn!(active = tracker.active(), "grace period over, dropping connections");
        }
        tracing::info!("storefront stopped");
        Ok(())
    }

    async fn serve_connection(self: Arc<Self>, stream: TcpStream, remote: SocketAddr, shutdown: ShutdownSignal) {
        let server = Arc::clone(&self);
        let service = service_fn(move |request: http::Request<Incoming>| {
            let server = Arc::clone(&server);
            async move { Ok::<_, Infallible>(server.handle(request).await) }
        });

        let connection = http1::Builder::new().serve_connection(TokioIo::new(stream), service);
        tokio::pin!(connection);

        tokio::select! {
            result = connection.as_mut() => {
                if let Err(err) = result {
                    tracing::debug!(%remote, error = %err, "connection error");
                }
            }
            () = shutdown.wait() => {
                connection.as_mut().graceful_shutdown();
                if let Err(err) = connection.await {
                    tracing::debug!(%remote, error = %err, "connection error during shutdown");
                }
            }
        }
    }

    async fn handle(&self, request: http::Request<Incoming>) -> Response {
        let _in_flight = InFlightGuard::new();
        let mut ctx = MiddlewareContext::new();
        let method = request.method().clone();
        let path = request.uri().path().to_string();

        let mut response = match buffer(request, self.config.max_body_bytes).await {
            Ok(request) => self.app.handle_with(&mut ctx, request).await,
            Err(mut response) => {
                stamp_request_id(&mut response, ctx.request_id());
                response
            }
        };

        if response.status() == StatusCode::NO_CONTENT {
            *response.body_mut() = Full::new(Bytes::new());
        }

        tracing::debug!(
            request_id = %ctx.request_id(),
            %method,
            %path,
            status = response.status().as_u16(),
            elapsed_ms = ctx.elapsed().as_millis(),
            "request served"
        );
        response
    }
}

/// Reads the whole body, refusing more than `limit` bytes.
async fn buffer(request: http::Request<Incoming>, limit: usize) -> Result<Request, Response> {
    let (parts, body) = request.into_parts();
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(Request::from_parts(parts, Full::new(collected.to_bytes()))),
        Err(err) if err.downcast_ref::<LengthLimitError>().is_some() => Err(envelope::error(
            StatusCode::PAYLOAD_TOO_LARGE,
            &format!("request body exceeds {limit} bytes"),
        )),
        Err(err) => {
            tracing::debug!(error = %err, "failed to read request body");
            Err(envelope::error(StatusCode::BAD_REQUEST, "failed to read request body"))
        }
    }
}
