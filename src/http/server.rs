//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Wrap the loaded dispatcher in an Axum Router
//! - Wire up middleware (tracing, timeout, request ID)
//! - Bind server to listener
//! - Shut down gracefully on Ctrl+C

use std::io;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::routing::Dispatcher;

/// HTTP server serving a loaded route configuration.
pub struct HttpServer {
    router: Router,
    config: ServerConfig,
}

impl HttpServer {
    pub fn new(dispatcher: Dispatcher, config: ServerConfig) -> Self {
        let router = Self::build_router(dispatcher, &config);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(dispatcher: Dispatcher, config: &ServerConfig) -> Router {
        dispatcher
            .with_body_limit(config.body_limit_bytes)
            .into_router()
            .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The fully layered router, e.g. for driving requests in tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Bind the configured address and serve until shutdown.
    pub async fn bind_and_run(self) -> io::Result<()> {
        let listener = TcpListener::bind(&self.config.bind_address).await?;
        self.run(listener).await
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener) -> io::Result<()> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            request_timeout_secs = self.config.request_timeout_secs,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown signal received"),
        Err(e) => tracing::error!(error = %e, "Failed to listen for Ctrl+C"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::context::{handler_fn, Flow};
    use crate::routing::{HttpVerb, Registrar};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::json;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_request_id_is_set_and_propagated() {
        let mut dispatcher = Dispatcher::new();
        dispatcher.route(
            HttpVerb::Get,
            "/ping",
            vec![handler_fn(|ctx| {
                ctx.respond(StatusCode::OK, Some(json!("pong")));
                Ok(Flow::Next)
            })],
        );
        let server = HttpServer::new(dispatcher, ServerConfig::default());

        let response = server
            .router()
            .oneshot(Request::builder().uri("/ping").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_body_limit_applies() {
        let mut dispatcher = Dispatcher::new();
        dispatcher.route(
            HttpVerb::Post,
            "/upload",
            vec![handler_fn(|ctx| {
                ctx.respond(StatusCode::CREATED, None);
                Ok(Flow::Next)
            })],
        );
        let config = ServerConfig {
            body_limit_bytes: 8,
            ..ServerConfig::default()
        };
        let server = HttpServer::new(dispatcher, config);

        let response = server
            .router()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/upload")
                    .body(Body::from(r#"{"payload": "far too large"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
