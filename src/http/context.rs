//! Per-request state shared by every handler in a dispatch.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Extensions, HeaderMap, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::http::response::RouteError;

/// What the dispatcher does after a handler returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Continue with the next handler or layer.
    Next,
    /// Stop dispatching and send the staged response.
    Halt,
}

/// A request-processing step: middlewares and method handlers alike.
///
/// Returning `Err` is how a handler forwards a failure to the dispatcher's
/// error pipeline; it must not panic.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn handle(&self, ctx: &mut RequestContext) -> Result<Flow, RouteError>;
}

/// Adapts a synchronous closure into a [`Handler`].
pub struct FnHandler<F>(F);

#[async_trait]
impl<F> Handler for FnHandler<F>
where
    F: Fn(&mut RequestContext) -> Result<Flow, RouteError> + Send + Sync + 'static,
{
    async fn handle(&self, ctx: &mut RequestContext) -> Result<Flow, RouteError> {
        (self.0)(ctx)
    }
}

/// Wrap a synchronous closure as a shareable handler (typically a middleware).
pub fn handler_fn<F>(f: F) -> Arc<dyn Handler>
where
    F: Fn(&mut RequestContext) -> Result<Flow, RouteError> + Send + Sync + 'static,
{
    Arc::new(FnHandler(f))
}

/// Bag of extra controller arguments populated by upstream middlewares.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CustomArgs(pub Map<String, Value>);

/// Installs a fresh [`CustomArgs`] bag on every request.
#[derive(Debug, Default)]
pub struct ContextInitializer;

#[async_trait]
impl Handler for ContextInitializer {
    async fn handle(&self, ctx: &mut RequestContext) -> Result<Flow, RouteError> {
        ctx.extensions.insert(CustomArgs::default());
        Ok(Flow::Next)
    }
}

/// Response produced by a handler, sent once dispatch ends.
#[derive(Debug, Clone, PartialEq)]
pub struct StagedResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// `None` sends an empty body.
    pub body: Option<Value>,
}

impl IntoResponse for StagedResponse {
    fn into_response(self) -> Response {
        let mut response = match self.body {
            Some(body) => (self.status, Json(body)).into_response(),
            None => {
                let mut empty = Response::new(Body::empty());
                *empty.status_mut() = self.status;
                empty
            }
        };
        response.headers_mut().extend(self.headers);
        response
    }
}

/// Request data as seen by handlers.
#[derive(Debug)]
pub struct RequestContext {
    method: Method,
    path: String,
    pub headers: HeaderMap,
    /// Path parameters of the layer currently running.
    pub params: Map<String, Value>,
    pub query: Map<String, Value>,
    pub body: Value,
    pub extensions: Extensions,
    response: Option<StagedResponse>,
}

impl RequestContext {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HeaderMap::new(),
            params: Map::new(),
            query: Map::new(),
            body: Value::Null,
            extensions: Extensions::new(),
            response: None,
        }
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = body;
        self
    }

    pub fn with_param(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.params.insert(name.to_string(), value.into());
        self
    }

    pub fn with_query(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.query.insert(name.to_string(), value.into());
        self
    }

    pub fn with_header(mut self, name: header::HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Stage the response; a later call replaces it.
    pub fn respond(&mut self, status: StatusCode, body: Option<Value>) {
        self.response = Some(StagedResponse {
            status,
            headers: HeaderMap::new(),
            body,
        });
    }

    pub fn response(&self) -> Option<&StagedResponse> {
        self.response.as_ref()
    }

    pub fn response_mut(&mut self) -> Option<&mut StagedResponse> {
        self.response.as_mut()
    }

    pub fn is_responded(&self) -> bool {
        self.response.is_some()
    }

    pub fn take_response(&mut self) -> Option<StagedResponse> {
        self.response.take()
    }

    /// Extra controller arguments; empty when no initializer ran.
    pub fn custom_args(&self) -> Map<String, Value> {
        self.extensions
            .get::<CustomArgs>()
            .map(|args| args.0.clone())
            .unwrap_or_default()
    }

    pub fn custom_args_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.extensions.get_or_insert_default::<CustomArgs>().0
    }
}
