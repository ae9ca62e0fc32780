//! Route registration and dispatch.
//!
//! # Responsibilities
//! - Define the registration contract the tree loads into ([`Registrar`])
//! - Store registrations as an ordered layer stack
//! - Run matching layers for each request and render the outcome
//!
//! # Design Decisions
//! - Registration order is dispatch order
//! - Mount layers run on every request under their prefix, before and after routes
//! - First matching route wins; later routes are skipped once a response is staged
//! - A handler error ends dispatch and is rendered as a JSON error body
//! - No response staged means 404

use std::fmt;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{Method, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Router;
use serde_json::{Map, Value};

use crate::http::context::{Flow, Handler, RequestContext};
use crate::http::response::RouteError;
use crate::routing::matcher::PathPattern;

/// Default request body limit (1 MiB).
pub const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

/// HTTP verbs a method node may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpVerb {
    /// Matches every request method.
    All,
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl HttpVerb {
    pub const SUPPORTED: [HttpVerb; 8] = [
        HttpVerb::All,
        HttpVerb::Get,
        HttpVerb::Post,
        HttpVerb::Put,
        HttpVerb::Patch,
        HttpVerb::Delete,
        HttpVerb::Head,
        HttpVerb::Options,
    ];

    /// Case-insensitive lookup; `None` for verbs the router does not provide.
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::SUPPORTED
            .into_iter()
            .find(|verb| verb.as_str().eq_ignore_ascii_case(name))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpVerb::All => "ALL",
            HttpVerb::Get => "GET",
            HttpVerb::Post => "POST",
            HttpVerb::Put => "PUT",
            HttpVerb::Patch => "PATCH",
            HttpVerb::Delete => "DELETE",
            HttpVerb::Head => "HEAD",
            HttpVerb::Options => "OPTIONS",
        }
    }

    pub fn matches(&self, method: &Method) -> bool {
        match self {
            HttpVerb::All => true,
            verb => verb.as_str() == method.as_str(),
        }
    }
}

impl fmt::Display for HttpVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Router contract used by the load phase.
pub trait Registrar: Send {
    /// Run `handler` for every request whose path starts with `path`.
    fn mount(&mut self, path: &str, handler: Arc<dyn Handler>);

    /// Run `handlers` in order for requests matching `verb` and exactly `path`.
    fn route(&mut self, verb: HttpVerb, path: &str, handlers: Vec<Arc<dyn Handler>>);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LayerKind {
    Mount,
    Route(HttpVerb),
}

struct Layer {
    kind: LayerKind,
    pattern: PathPattern,
    handlers: Vec<Arc<dyn Handler>>,
}

impl Layer {
    /// Captured path params if this layer applies to the request.
    fn applies_to(&self, ctx: &RequestContext) -> Option<Map<String, Value>> {
        match self.kind {
            LayerKind::Mount => self.pattern.match_prefix(ctx.path()),
            LayerKind::Route(_) if ctx.is_responded() => None,
            LayerKind::Route(verb) if verb.matches(ctx.method()) => {
                self.pattern.match_exact(ctx.path())
            }
            LayerKind::Route(_) => None,
        }
    }
}

/// Ordered layer stack implementing [`Registrar`].
pub struct Dispatcher {
    layers: Vec<Layer>,
    body_limit: usize,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self {
            layers: Vec::new(),
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("layers", &self.layers.len())
            .field("body_limit", &self.body_limit)
            .finish()
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_body_limit(mut self, limit: usize) -> Self {
        self.body_limit = limit;
        self
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Registered routes in dispatch order.
    pub fn routes(&self) -> Vec<(HttpVerb, String)> {
        self.layers
            .iter()
            .filter_map(|layer| match layer.kind {
                LayerKind::Route(verb) => Some((verb, layer.pattern.to_string())),
                LayerKind::Mount => None,
            })
            .collect()
    }

    /// Run every applicable layer against `ctx`.
    pub async fn dispatch(&self, ctx: &mut RequestContext) -> Result<(), RouteError> {
        for layer in &self.layers {
            let Some(params) = layer.applies_to(ctx) else {
                continue;
            };
            ctx.params = params;
            for handler in &layer.handlers {
                if handler.handle(ctx).await? == Flow::Halt {
                    tracing::debug!(path = %layer.pattern, "Dispatch halted");
                    return Ok(());
                }
            }
        }
        Ok(())
    }

    /// Dispatch and render the final response.
    pub async fn handle(&self, mut ctx: RequestContext) -> Response {
        match self.dispatch(&mut ctx).await {
            Err(e) => e.into_response(),
            Ok(()) => match ctx.take_response() {
                Some(staged) => staged.into_response(),
                None => RouteError::new(
                    StatusCode::NOT_FOUND,
                    format!("Cannot {} {}", ctx.method(), ctx.path()),
                )
                .into_response(),
            },
        }
    }

    /// Serve this dispatcher as the fallback of an axum router.
    pub fn into_router(self) -> Router {
        Router::new()
            .fallback(dispatch_request)
            .with_state(Arc::new(self))
    }
}

impl Registrar for Dispatcher {
    fn mount(&mut self, path: &str, handler: Arc<dyn Handler>) {
        tracing::debug!(path = path, "Mounting middleware");
        self.layers.push(Layer {
            kind: LayerKind::Mount,
            pattern: PathPattern::parse(path),
            handlers: vec![handler],
        });
    }

    fn route(&mut self, verb: HttpVerb, path: &str, handlers: Vec<Arc<dyn Handler>>) {
        tracing::debug!(verb = %verb, path = path, handlers = handlers.len(), "Registering route");
        self.layers.push(Layer {
            kind: LayerKind::Route(verb),
            pattern: PathPattern::parse(path),
            handlers,
        });
    }
}

async fn dispatch_request(
    State(dispatcher): State<Arc<Dispatcher>>,
    request: Request<Body>,
) -> Response {
    match read_request(request, dispatcher.body_limit).await {
        Ok(ctx) => dispatcher.handle(ctx).await,
        Err(e) => e.into_response(),
    }
}

/// Buffer the body and decode query and JSON payload.
async fn read_request(request: Request<Body>, limit: usize) -> Result<RequestContext, RouteError> {
    let (parts, body) = request.into_parts();

    let query = match parts.uri.query() {
        Some(_) => {
            let Query(query) = Query::<Map<String, Value>>::try_from_uri(&parts.uri)
                .map_err(|e| RouteError::new(StatusCode::BAD_REQUEST, e.body_text()))?;
            query
        }
        None => Map::new(),
    };

    let bytes = axum::body::to_bytes(body, limit)
        .await
        .map_err(|e| RouteError::InvalidBody(e.to_string()))?;
    let body = if bytes.iter().all(u8::is_ascii_whitespace) {
        Value::Object(Map::new())
    } else {
        serde_json::from_slice(&bytes).map_err(|e| RouteError::InvalidBody(e.to_string()))?
    };

    let mut ctx = RequestContext::new(parts.method, parts.uri.path()).with_body(body);
    ctx.query = query;
    ctx.headers = parts.headers;
    Ok(ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::context::handler_fn;
    use serde_json::json;
    use tower::ServiceExt;

    fn responder(status: StatusCode, body: Value) -> Arc<dyn Handler> {
        handler_fn(move |ctx| {
            ctx.respond(status, Some(body.clone()));
            Ok(Flow::Next)
        })
    }

    #[test]
    fn test_verb_parse() {
        assert_eq!(HttpVerb::parse("get"), Some(HttpVerb::Get));
        assert_eq!(HttpVerb::parse(" Post "), Some(HttpVerb::Post));
        assert_eq!(HttpVerb::parse("all"), Some(HttpVerb::All));
        assert_eq!(HttpVerb::parse("WRONG"), None);
        assert!(HttpVerb::All.matches(&Method::DELETE));
        assert!(!HttpVerb::Get.matches(&Method::POST));
    }

    #[tokio::test]
    async fn test_first_route_wins() {
        let mut dispatcher = Dispatcher::new();
        dispatcher.route(HttpVerb::Get, "/a", vec![responder(StatusCode::OK, json!(1))]);
        dispatcher.route(HttpVerb::Get, "/a", vec![responder(StatusCode::OK, json!(2))]);

        let mut ctx = RequestContext::new(Method::GET, "/a");
        dispatcher.dispatch(&mut ctx).await.unwrap();
        assert_eq!(ctx.response().unwrap().body, Some(json!(1)));
    }

    #[tokio::test]
    async fn test_mounts_run_around_routes() {
        let mut dispatcher = Dispatcher::new();
        dispatcher.mount(
            "/api",
            handler_fn(|ctx| {
                ctx.custom_args_mut().insert("pre".into(), json!(true));
                Ok(Flow::Next)
            }),
        );
        dispatcher.route(HttpVerb::Get, "/api/x", vec![responder(StatusCode::OK, json!({}))]);
        dispatcher.mount(
            "/api",
            handler_fn(|ctx| {
                if let Some(response) = ctx.response_mut() {
                    response.status = StatusCode::ACCEPTED;
                }
                Ok(Flow::Next)
            }),
        );

        let mut ctx = RequestContext::new(Method::GET, "/api/x");
        dispatcher.dispatch(&mut ctx).await.unwrap();
        assert_eq!(ctx.custom_args().get("pre"), Some(&json!(true)));
        assert_eq!(ctx.response().unwrap().status, StatusCode::ACCEPTED);
    }

    #[tokio::test]
    async fn test_halt_skips_remaining_layers() {
        let mut dispatcher = Dispatcher::new();
        dispatcher.mount(
            "/",
            handler_fn(|ctx| {
                ctx.respond(StatusCode::UNAUTHORIZED, None);
                Ok(Flow::Halt)
            }),
        );
        dispatcher.route(HttpVerb::All, "/x", vec![responder(StatusCode::OK, json!({}))]);

        let mut ctx = RequestContext::new(Method::GET, "/x");
        dispatcher.dispatch(&mut ctx).await.unwrap();
        assert_eq!(ctx.response().unwrap().status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_router_not_found_and_bad_json() {
        let mut dispatcher = Dispatcher::new();
        dispatcher.route(HttpVerb::Post, "/x", vec![responder(StatusCode::OK, json!({}))]);
        let app = dispatcher.into_router();

        let response = app
            .clone()
            .oneshot(Request::builder().uri("/missing").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/x")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_route_params_and_query_reach_handlers() {
        let mut dispatcher = Dispatcher::new();
        dispatcher.route(
            HttpVerb::Get,
            "/users/:id",
            vec![handler_fn(|ctx| {
                let body = json!({ "id": ctx.params.get("id"), "q": ctx.query.get("q") });
                ctx.respond(StatusCode::OK, Some(body));
                Ok(Flow::Next)
            })],
        );
        let response = dispatcher
            .into_router()
            .oneshot(Request::builder().uri("/users/9?q=tea").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, json!({ "id": "9", "q": "tea" }));
    }
}
