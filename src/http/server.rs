//! HTTP server hosting an application.
//!
//! # Responsibilities
//! - Wrap an `AppHandler` as a tower service
//! - Wire up the tracing layer
//! - Serve a bound listener until shutdown
//!
//! # Design Decisions
//! - axum only provides the connection loop; every request goes to the
//!   application through one fallback service
//! - Graceful shutdown: stop accepting, let in-flight requests finish

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::extract::Request;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::service_fn;
use tower_http::trace::TraceLayer;

use crate::app::AppHandler;

/// A bound listener paired with the application it serves.
pub struct Server<S> {
    listener: TcpListener,
    handler: AppHandler<S>,
}

impl<S: Default + Send + 'static> Server<S> {
    pub fn new(listener: TcpListener, handler: AppHandler<S>) -> Self {
        Self { listener, handler }
    }

    /// The address actually bound (after port probing).
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Build the axum router forwarding every request to the application.
    fn build_router(handler: AppHandler<S>) -> Router {
        let service = service_fn(move |request: Request| {
            let handler = handler.clone();
            async move { Ok::<_, Infallible>(handler.call(request).await) }
        });

        Router::new()
            .fallback_service(service)
            .layer(TraceLayer::new_for_http())
    }

    /// Serve until `shutdown` fires (or its sender is dropped).
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) -> std::io::Result<()> {
        let addr = self.listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let router = Self::build_router(self.handler);
        axum::serve(self.listener, router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!(address = %addr, "HTTP server stopped");
        Ok(())
    }
}
