//! A single URL path and its methods.

use std::fmt;

use serde_json::Value;

use crate::error::{Error, Result};
use crate::routing::{join_paths, Registrar};
use crate::tree::element::{
    indent, merge_params, parse_middlewares, parse_params, parse_path, require_mapping, type_name,
    warn_unused_keys, NodeKind,
};
use crate::tree::method::Method;
use crate::tree::middleware::{load_all, Middleware};
use crate::tree::parameter::Parameter;
use crate::tree::{BuildContext, LoadContext, RouteEntry};

const RECOGNIZED_KEYS: &[&str] = &[
    "path",
    "params",
    "methods",
    "pre_middlewares",
    "post_middlewares",
];

#[derive(Debug)]
pub struct Route {
    name: String,
    path: String,
    params: Vec<Parameter>,
    methods: Vec<Method>,
    pre: Vec<Middleware>,
    post: Vec<Middleware>,
}

impl Route {
    pub fn new(
        name: &str,
        config: Option<&Value>,
        inherited: &[Parameter],
        ctx: &BuildContext<'_>,
    ) -> Result<Self> {
        let config = require_mapping(NodeKind::Route, name, config)?;
        warn_unused_keys(ctx.diagnostics, NodeKind::Route, name, config, RECOGNIZED_KEYS);
        let middlewares = |field: &str| {
            parse_middlewares(NodeKind::Route, name, field, config.get(field))
        };
        let pre = middlewares("pre_middlewares")?;
        let post = middlewares("post_middlewares")?;

        let path = parse_path(NodeKind::Route, name, "path", config.get("path"))?;
        let local = parse_params(
            NodeKind::Route,
            name,
            "params",
            config.get("params"),
            ctx.diagnostics,
        )?;
        let params = merge_params(NodeKind::Route, name, inherited, local)?;

        let methods = match config.get("methods") {
            None | Some(Value::Null) => return Err(Error::EmptyMethods(name.to_string())),
            Some(Value::Object(methods)) if methods.is_empty() => {
                return Err(Error::EmptyMethods(name.to_string()))
            }
            Some(Value::Object(methods)) => methods
                .iter()
                .map(|(verb, method)| Method::new(verb, Some(method), &params, ctx))
                .collect::<Result<Vec<_>>>()?,
            Some(other) => {
                return Err(Error::invalid(format!(
                    "Route \"{name}\": methods must be a mapping, got {}",
                    type_name(other)
                )))
            }
        };

        Ok(Self {
            name: name.to_string(),
            path,
            params,
            methods,
            pre,
            post,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Declared and inherited parameters.
    pub fn params(&self) -> &[Parameter] {
        &self.params
    }

    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    pub async fn load(
        &mut self,
        router: &mut dyn Registrar,
        mount_path: &str,
        ctx: &LoadContext<'_>,
    ) -> Result<()> {
        let full_path = join_paths(mount_path, &self.path);
        load_all(&mut self.pre, router, &full_path, ctx).await?;
        for method in self.methods.iter_mut() {
            method.load(router, &full_path, ctx, &[], &[]).await?;
        }
        load_all(&mut self.post, router, &full_path, ctx).await?;
        tracing::debug!(
            route = %self.name,
            path = %full_path,
            methods = self.methods.len(),
            "Route loaded"
        );
        Ok(())
    }

    pub fn routes(&self, mount_path: &str) -> Vec<RouteEntry> {
        let full_path = join_paths(mount_path, &self.path);
        self.methods
            .iter()
            .map(|method| RouteEntry {
                verb: method.verb(),
                path: full_path.clone(),
                controller: method.controller_name().to_string(),
            })
            .collect()
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Route \"{}\" {}", self.name, self.path)?;
        if !self.params.is_empty() {
            let params: Vec<String> = self.params.iter().map(ToString::to_string).collect();
            write!(f, " {{ {} }}", params.join(", "))?;
        }
        let body: Vec<String> = self
            .pre
            .iter()
            .map(ToString::to_string)
            .chain(self.methods.iter().map(ToString::to_string))
            .chain(self.post.iter().map(ToString::to_string))
            .collect();
        write!(f, "\n{}", indent(&body.join("\n")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParserConfig;
    use crate::routing::HttpVerb;
    use crate::tree::element::CollectingDiagnostics;
    use serde_json::json;

    fn build(config: Value, inherited: &[Parameter]) -> Result<Route> {
        let settings = ParserConfig::default();
        let diagnostics = CollectingDiagnostics::new();
        let ctx = BuildContext::new(&settings, &diagnostics);
        Route::new("users", Some(&config), inherited, &ctx)
    }

    #[test]
    fn test_methods_required() {
        assert!(matches!(
            build(json!({ "path": "/users", "methods": {} }), &[]),
            Err(Error::EmptyMethods(_))
        ));
        assert!(matches!(build(json!({ "path": "/users" }), &[]), Err(Error::EmptyMethods(_))));
        assert!(matches!(
            build(json!({ "path": "/users", "methods": ["get"] }), &[]),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_invalid_path() {
        assert!(matches!(
            build(json!({ "path": "ii", "methods": { "get": "c" } }), &[]),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_methods_receive_merged_params() {
        let inherited =
            vec![Parameter::new("org", &json!("string"), &CollectingDiagnostics::new()).unwrap()];
        let route = build(
            json!({
                "path": "/users/:id",
                "params": { "id": "number" },
                "methods": { "get": "getUser", "delete": { "controller": "removeUser" } },
            }),
            &inherited,
        )
        .unwrap();

        let names: Vec<&str> = route.params().iter().map(Parameter::name).collect();
        assert_eq!(names, vec!["org", "id"]);
        assert_eq!(route.methods().len(), 2);
        assert_eq!(route.methods()[0].params().len(), 2);

        let entries = route.routes("/api");
        assert_eq!(entries[0].verb, HttpVerb::Get);
        assert_eq!(entries[0].path, "/api/users/:id");
        assert_eq!(entries[1].controller, "removeUser");
    }

    #[test]
    fn test_unknown_keys_warn_only() {
        let settings = ParserConfig::default();
        let diagnostics = CollectingDiagnostics::new();
        let ctx = BuildContext::new(&settings, &diagnostics);
        let config = json!({ "path": "/users", "query": {}, "methods": { "get": "c" } });
        assert!(Route::new("users", Some(&config), &[], &ctx).is_ok());
        assert_eq!(
            diagnostics.warnings(),
            vec!["Route \"users\": unused key \"query\"".to_string()]
        );
    }
}
