//! One HTTP verb under a route.

use std::fmt;
use std::sync::Arc;

use axum::http::StatusCode;
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::http::context::Handler;
use crate::http::controller::Controller;
use crate::http::handler::MethodHandler;
use crate::routing::{HttpVerb, Registrar};
use crate::tree::element::{
    parse_middlewares, parse_params, require_config, type_name, warn_unused_keys, NodeKind,
};
use crate::tree::middleware::{resolve_all, Middleware};
use crate::tree::parameter::Parameter;
use crate::tree::{BuildContext, LoadContext};

const RECOGNIZED_KEYS: &[&str] = &[
    "controller",
    "response_code",
    "abstract",
    "body",
    "pre_middlewares",
    "post_middlewares",
];

/// A verb bound to a controller, with its declared status and body parameters.
///
/// Abstract methods (the default) wrap their controller in a [`MethodHandler`].
/// A non-abstract method registers its controller as a plain [`Handler`].
#[derive(Debug)]
pub struct Method {
    verb: HttpVerb,
    controller_name: String,
    response_code: StatusCode,
    is_abstract: bool,
    params: Vec<Parameter>,
    body: Vec<Parameter>,
    pre: Vec<Middleware>,
    post: Vec<Middleware>,
}

impl Method {
    /// `config` is either a mapping or a bare controller name.
    pub fn new(
        verb: &str,
        config: Option<&Value>,
        params: &[Parameter],
        ctx: &BuildContext<'_>,
    ) -> Result<Self> {
        let parsed_verb = HttpVerb::parse(verb)
            .ok_or_else(|| Error::invalid(format!("Router does not provide \"{verb}\" method")))?;

        let config = match require_config(NodeKind::Method, verb, config)? {
            Value::String(controller) => {
                let mut map = Map::new();
                map.insert("controller".into(), Value::String(controller.clone()));
                map
            }
            Value::Object(map) => map.clone(),
            other => {
                return Err(Error::invalid(format!(
                    "RouteMethod \"{verb}\" configuration must be a mapping or a controller name, \
                     got {}",
                    type_name(other)
                )))
            }
        };
        warn_unused_keys(ctx.diagnostics, NodeKind::Method, verb, &config, RECOGNIZED_KEYS);

        let controller_name = match config.get("controller") {
            Some(Value::String(name)) if !name.trim().is_empty() => name.clone(),
            _ => {
                return Err(Error::invalid(format!(
                    "RouteMethod \"{verb}\": controller must be a non-empty string"
                )))
            }
        };

        let response_code = Self::parse_response_code(verb, config.get("response_code"), ctx)?;
        let is_abstract = Self::parse_abstract(config.get("abstract"));

        let body = match config.get("body") {
            None | Some(Value::Null) => Vec::new(),
            Some(decls @ Value::Object(_)) => {
                parse_params(NodeKind::Method, verb, "body", Some(decls), ctx.diagnostics)?
            }
            Some(other) => {
                return Err(Error::invalid(format!(
                    "RouteMethod \"{verb}\": body must be a mapping, got {}",
                    type_name(other)
                )))
            }
        };

        let pre = parse_middlewares(
            NodeKind::Method,
            verb,
            "pre_middlewares",
            config.get("pre_middlewares"),
        )?;
        let post = parse_middlewares(
            NodeKind::Method,
            verb,
            "post_middlewares",
            config.get("post_middlewares"),
        )?;

        Ok(Self {
            verb: parsed_verb,
            controller_name,
            response_code,
            is_abstract,
            params: params.to_vec(),
            body,
            pre,
            post,
        })
    }

    fn parse_response_code(
        verb: &str,
        value: Option<&Value>,
        ctx: &BuildContext<'_>,
    ) -> Result<StatusCode> {
        let invalid = |code: &dyn fmt::Display| {
            Error::invalid(format!(
                "RouteMethod \"{verb}\": \"{code}\" is not a valid HTTP response code"
            ))
        };
        let code = match value {
            None | Some(Value::Null) => ctx.config.http_default_response_code,
            Some(Value::Number(n)) => n
                .as_u64()
                .and_then(|n| u16::try_from(n).ok())
                .ok_or_else(|| invalid(n))?,
            Some(other) => {
                return Err(Error::invalid(format!(
                    "RouteMethod \"{verb}\": response_code must be a number, got {}",
                    type_name(other)
                )))
            }
        };
        if !ctx.config.allows(code) {
            return Err(Error::invalid(format!(
                "RouteMethod \"{verb}\": \"{code}\" is not an allowed response code"
            )));
        }
        StatusCode::from_u16(code).map_err(|_| invalid(&code))
    }

    /// `false` or `"no"` turn the flag off; anything else keeps the default.
    fn parse_abstract(value: Option<&Value>) -> bool {
        match value {
            Some(Value::Bool(flag)) => *flag,
            Some(Value::String(s)) => s != "no",
            _ => true,
        }
    }

    pub fn verb(&self) -> HttpVerb {
        self.verb
    }

    pub fn controller_name(&self) -> &str {
        &self.controller_name
    }

    pub fn response_code(&self) -> StatusCode {
        self.response_code
    }

    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    pub fn params(&self) -> &[Parameter] {
        &self.params
    }

    pub fn body(&self) -> &[Parameter] {
        &self.body
    }

    /// Handler validating this method's parameters before calling `controller`.
    pub fn build_handler(
        &self,
        controller: Arc<dyn Controller>,
        status: StatusCode,
    ) -> MethodHandler {
        MethodHandler::new(controller, status, self.params.clone(), self.body.clone())
    }

    /// The route handler: the wrapped controller, or the controller itself when not abstract.
    async fn resolve_handler(&self, ctx: &LoadContext<'_>) -> Result<Arc<dyn Handler>> {
        let dir = &ctx.config.controller_dir;
        let not_found = |e: Error| Error::ControllerNotFound {
            name: self.controller_name.clone(),
            path: e
                .module_path()
                .map(str::to_string)
                .unwrap_or_else(|| e.to_string()),
        };
        if !self.is_abstract {
            return ctx
                .middlewares
                .resolve(&self.controller_name, dir)
                .await
                .map_err(not_found);
        }
        let controller = ctx
            .controllers
            .resolve(&self.controller_name, dir)
            .await
            .map_err(not_found)?;
        Ok(Arc::new(self.build_handler(controller, self.response_code)))
    }

    /// Resolve the controller and register
    /// `inherited_pre + pre + handler + post + inherited_post`.
    pub async fn load(
        &mut self,
        router: &mut dyn Registrar,
        mount_path: &str,
        ctx: &LoadContext<'_>,
        inherited_pre: &[Arc<dyn Handler>],
        inherited_post: &[Arc<dyn Handler>],
    ) -> Result<()> {
        let handler = self.resolve_handler(ctx).await?;
        let pre = resolve_all(&mut self.pre, ctx).await?;
        let post = resolve_all(&mut self.post, ctx).await?;

        let chain: Vec<Arc<dyn Handler>> = inherited_pre
            .iter()
            .chain(&pre)
            .cloned()
            .chain(std::iter::once(handler))
            .chain(post.iter().chain(inherited_post).cloned())
            .collect();

        tracing::debug!(
            verb = %self.verb,
            path = mount_path,
            controller = %self.controller_name,
            handlers = chain.len(),
            "Method loaded"
        );
        router.route(self.verb, mount_path, chain);
        Ok(())
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {} ({})",
            self.verb,
            self.controller_name,
            self.response_code.as_u16()
        )?;
        if !self.is_abstract {
            f.write_str(" raw")?;
        }
        if !self.body.is_empty() {
            let body: Vec<String> = self.body.iter().map(ToString::to_string).collect();
            write!(f, " body {{ {} }}", body.join(", "))?;
        }
        Ok(())
    }
}
