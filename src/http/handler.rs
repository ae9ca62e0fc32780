//! The request handler built for each configured method.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use axum::http::StatusCode;
use serde_json::{Map, Value};

use crate::http::context::{Flow, Handler, RequestContext};
use crate::http::controller::{Controller, ControllerInput, StatusSetter};
use crate::http::response::{RouteError, ValidationData};
use crate::tree::parameter::Parameter;

/// Validates path and body parameters, then calls the controller once.
pub struct MethodHandler {
    controller: Arc<dyn Controller>,
    status: StatusCode,
    params: Vec<Parameter>,
    body: Vec<Parameter>,
}

impl MethodHandler {
    pub fn new(
        controller: Arc<dyn Controller>,
        status: StatusCode,
        params: Vec<Parameter>,
        body: Vec<Parameter>,
    ) -> Self {
        Self {
            controller,
            status,
            params,
            body,
        }
    }

    /// Validate each declared parameter against `source`, stopping at the first failure.
    ///
    /// Only declared names are kept; anything else in `source` is dropped.
    fn validate_all(
        declared: &[Parameter],
        source: &Map<String, Value>,
    ) -> Result<Map<String, Value>, ValidationData> {
        let mut validated = Map::new();
        for param in declared {
            let value = param.validate(source.get(param.name()))?;
            validated.insert(param.name().to_string(), value);
        }
        Ok(validated)
    }
}

/// `null`, `false`, `""` and zero are sent as an empty response.
fn is_empty_result(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => true,
        Value::String(s) => s.is_empty(),
        Value::Number(n) => n.as_f64() == Some(0.0),
        _ => false,
    }
}

impl fmt::Debug for MethodHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodHandler")
            .field("status", &self.status)
            .field("params", &self.params)
            .field("body", &self.body)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Handler for MethodHandler {
    async fn handle(&self, ctx: &mut RequestContext) -> Result<Flow, RouteError> {
        let params = Self::validate_all(&self.params, &ctx.params)?;

        let empty = Map::new();
        let raw_body = match &ctx.body {
            Value::Object(map) => map,
            _ => &empty,
        };
        let body = Self::validate_all(&self.body, raw_body)?;

        let status = StatusSetter::new(self.status);
        let input = ControllerInput {
            body,
            headers: ctx.headers.clone(),
            params,
            query: ctx.query.clone(),
            status: status.clone(),
            extra: ctx.custom_args(),
        };
        let result = self.controller.call(input).await?;
        tracing::trace!(
            path = ctx.path(),
            status = status.get().as_u16(),
            "Controller returned"
        );

        ctx.respond(status.get(), result.filter(|value| !is_empty_result(value)));
        Ok(Flow::Next)
    }
}
