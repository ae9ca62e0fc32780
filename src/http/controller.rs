//! Controller interface: what a configured `controller:` name resolves to.

use std::future::Future;
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::http::{HeaderMap, StatusCode};
use serde_json::{Map, Value};

use crate::http::response::RouteError;

/// Result of a controller call; `None` (or JSON null) sends an empty body.
pub type ControllerResult = Result<Option<Value>, RouteError>;

/// User code invoked once per request, after parameter validation.
#[async_trait]
pub trait Controller: Send + Sync {
    async fn call(&self, input: ControllerInput) -> ControllerResult;
}

/// Validated request data handed to a controller.
#[derive(Debug, Clone)]
pub struct ControllerInput {
    pub body: Map<String, Value>,
    pub headers: HeaderMap,
    pub params: Map<String, Value>,
    pub query: Map<String, Value>,
    /// Overrides the configured response code.
    pub status: StatusSetter,
    /// Custom arguments set by upstream middlewares.
    pub extra: Map<String, Value>,
}

/// Shared handle on the response status of the current call.
#[derive(Debug, Clone)]
pub struct StatusSetter(Arc<AtomicU16>);

impl StatusSetter {
    pub fn new(initial: StatusCode) -> Self {
        Self(Arc::new(AtomicU16::new(initial.as_u16())))
    }

    pub fn set(&self, code: u16) -> Result<(), RouteError> {
        let status = StatusCode::from_u16(code).map_err(|_| RouteError::InvalidStatus(code))?;
        self.0.store(status.as_u16(), Ordering::Relaxed);
        Ok(())
    }

    pub fn get(&self) -> StatusCode {
        StatusCode::from_u16(self.0.load(Ordering::Relaxed)).unwrap_or(StatusCode::OK)
    }
}

/// Adapts an async closure into a [`Controller`].
pub struct FnController<F>(F);

#[async_trait]
impl<F, Fut> Controller for FnController<F>
where
    F: Fn(ControllerInput) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ControllerResult> + Send + 'static,
{
    async fn call(&self, input: ControllerInput) -> ControllerResult {
        (self.0)(input).await
    }
}

/// Wrap an async closure as a shareable controller.
pub fn controller_fn<F, Fut>(f: F) -> Arc<dyn Controller>
where
    F: Fn(ControllerInput) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ControllerResult> + Send + 'static,
{
    Arc::new(FnController(f))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_setter() {
        let status = StatusSetter::new(StatusCode::OK);
        let shared = status.clone();
        shared.set(201).unwrap();
        assert_eq!(status.get(), StatusCode::CREATED);

        assert!(matches!(shared.set(7), Err(RouteError::InvalidStatus(7))));
        assert_eq!(status.get(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_controller_fn() {
        let controller = controller_fn(|input: ControllerInput| async move {
            Ok(Some(json!({ "id": input.params.get("id").cloned() })))
        });
        let mut params = Map::new();
        params.insert("id".into(), json!(3));
        let input = ControllerInput {
            body: Map::new(),
            headers: HeaderMap::new(),
            params,
            query: Map::new(),
            status: StatusSetter::new(StatusCode::OK),
            extra: Map::new(),
        };
        let out = controller.call(input).await.unwrap();
        assert_eq!(out, Some(json!({ "id": 3 })));
    }
}
