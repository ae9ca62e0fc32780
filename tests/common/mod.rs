//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::fs;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{HeaderValue, StatusCode};
use axum::response::Response;
use serde_json::{json, Value};
use tempfile::TempDir;

use config_router::http::{
    controller_fn, handler_fn, Controller, ControllerInput, Flow, Handler, RequestContext,
    RouteError,
};
use config_router::routing::{HttpVerb, Registrar};
use config_router::{ModuleRegistry, ParserConfig};

/// What a registration targeted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Mount,
    Route(HttpVerb),
}

pub struct Registration {
    pub kind: Kind,
    pub path: String,
    pub handlers: Vec<Arc<dyn Handler>>,
}

/// Router double recording every registration in order.
#[derive(Default)]
pub struct RecordingRegistrar {
    pub registrations: Vec<Registration>,
}

impl RecordingRegistrar {
    pub fn routes(&self) -> Vec<(HttpVerb, String)> {
        self.registrations
            .iter()
            .filter_map(|r| match r.kind {
                Kind::Route(verb) => Some((verb, r.path.clone())),
                Kind::Mount => None,
            })
            .collect()
    }

    pub fn mounts(&self) -> Vec<String> {
        self.registrations
            .iter()
            .filter(|r| r.kind == Kind::Mount)
            .map(|r| r.path.clone())
            .collect()
    }

    /// Run the handler chain of the route registered for `verb` at `path`.
    pub async fn invoke(
        &self,
        verb: HttpVerb,
        path: &str,
        ctx: &mut RequestContext,
    ) -> Result<(), RouteError> {
        let registration = self
            .registrations
            .iter()
            .find(|r| r.kind == Kind::Route(verb) && r.path == path)
            .unwrap_or_else(|| panic!("no {verb} route at {path}"));
        for handler in &registration.handlers {
            if handler.handle(ctx).await? == Flow::Halt {
                break;
            }
        }
        Ok(())
    }
}

impl Registrar for RecordingRegistrar {
    fn mount(&mut self, path: &str, handler: Arc<dyn Handler>) {
        self.registrations.push(Registration {
            kind: Kind::Mount,
            path: path.to_string(),
            handlers: vec![handler],
        });
    }

    fn route(&mut self, verb: HttpVerb, path: &str, handlers: Vec<Arc<dyn Handler>>) {
        self.registrations.push(Registration {
            kind: Kind::Route(verb),
            path: path.to_string(),
            handlers,
        });
    }
}

/// Controllers under `controller/`.
pub fn controllers() -> ModuleRegistry<dyn Controller> {
    let mut registry: ModuleRegistry<dyn Controller> = ModuleRegistry::new();
    registry
        .register(
            "controller/getTeapot",
            controller_fn(|_input: ControllerInput| async move { Ok(None) }),
        )
        .register(
            "controller/getUser",
            controller_fn(|input: ControllerInput| async move {
                Ok(Some(json!({ "params": input.params, "query": input.query })))
            }),
        )
        .register(
            "controller/createUser",
            controller_fn(|input: ControllerInput| async move {
                Ok(Some(json!({ "created": input.body, "by": input.extra.get("user") })))
            }),
        )
        .register_export(
            "controller/users",
            "remove",
            controller_fn(|input: ControllerInput| async move {
                input.status.set(204)?;
                Ok(None)
            }),
        )
        .register(
            "controller/fail",
            controller_fn(|_input: ControllerInput| async move {
                Err(RouteError::new(StatusCode::CONFLICT, "already exists"))
            }),
        );
    registry
}

/// Middlewares under `middleware/`, plus plain handlers under `controller/`.
pub fn middlewares() -> ModuleRegistry<dyn Handler> {
    let mut registry: ModuleRegistry<dyn Handler> = ModuleRegistry::new();
    registry
        .register(
            "middleware/auth",
            handler_fn(|ctx| {
                let user = ctx
                    .headers
                    .get("x-user")
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string);
                match user {
                    Some(user) => {
                        ctx.custom_args_mut().insert("user".into(), Value::String(user));
                        Ok(Flow::Next)
                    }
                    None => {
                        let body = json!({ "error": "login required" });
                        ctx.respond(StatusCode::UNAUTHORIZED, Some(body));
                        Ok(Flow::Halt)
                    }
                }
            }),
        )
        .register(
            "middleware/stamp",
            handler_fn(|ctx| {
                if let Some(response) = ctx.response_mut() {
                    response
                        .headers
                        .insert("x-stamped", HeaderValue::from_static("yes"));
                }
                Ok(Flow::Next)
            }),
        )
        .register(
            "controller/ping",
            handler_fn(|ctx| {
                let raw_id = ctx.params.get("id").cloned();
                ctx.respond(StatusCode::ACCEPTED, Some(json!({ "pong": raw_id })));
                Ok(Flow::Next)
            }),
        );
    registry
}

/// A temporary `config_dir` holding `files`.
pub fn config_dir(files: &[(&str, &str)]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (name, content) in files {
        fs::write(dir.path().join(name), content).unwrap();
    }
    dir
}

pub fn parser_config(dir: &TempDir) -> ParserConfig {
    ParserConfig {
        config_dir: dir.path().to_path_buf(),
        ..ParserConfig::default()
    }
}

pub async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    }
}

pub fn empty() -> Body {
    Body::empty()
}
