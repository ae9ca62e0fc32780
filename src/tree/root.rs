//! Path-prefix groups.

use std::fmt;

use serde_json::Value;

use crate::error::{Error, Result};
use crate::routing::{join_paths, Registrar};
use crate::tree::element::{
    indent, merge_params, parse_middlewares, parse_params, parse_path, require_mapping, type_name,
    warn_unused_keys, NodeKind,
};
use crate::tree::middleware::{load_all, Middleware};
use crate::tree::parameter::Parameter;
use crate::tree::{
    compile_elements, load_elements, BuildContext, LoadContext, RouteElement, RouteEntry,
};

const RECOGNIZED_KEYS: &[&str] = &[
    "root",
    "params",
    "routes",
    "pre_middlewares",
    "post_middlewares",
];

/// A prefix under which nested roots, routes and imports are mounted.
///
/// Middlewares declared here are mounted at the prefix, so they run for every
/// request beneath it. Parameters declared here reach every descendant.
#[derive(Debug)]
pub struct Root {
    name: String,
    root: String,
    params: Vec<Parameter>,
    children: Vec<RouteElement>,
    pre: Vec<Middleware>,
    post: Vec<Middleware>,
}

impl Root {
    pub fn new(
        name: &str,
        config: Option<&Value>,
        inherited: &[Parameter],
        ctx: &BuildContext<'_>,
    ) -> Result<Self> {
        let config = require_mapping(NodeKind::Root, name, config)?;
        warn_unused_keys(ctx.diagnostics, NodeKind::Root, name, config, RECOGNIZED_KEYS);
        let middlewares = |field: &str| {
            parse_middlewares(NodeKind::Root, name, field, config.get(field))
        };
        let pre = middlewares("pre_middlewares")?;
        let post = middlewares("post_middlewares")?;

        let root = parse_path(NodeKind::Root, name, "root", config.get("root"))?;
        let local = parse_params(
            NodeKind::Root,
            name,
            "params",
            config.get("params"),
            ctx.diagnostics,
        )?;
        let params = merge_params(NodeKind::Root, name, inherited, local)?;

        let children = match config.get("routes") {
            None | Some(Value::Null) => return Err(Error::EmptyRoutes(name.to_string())),
            Some(Value::Object(routes)) if routes.is_empty() => {
                return Err(Error::EmptyRoutes(name.to_string()))
            }
            Some(Value::Object(routes)) => compile_elements(routes, &params, ctx)?,
            Some(other) => {
                return Err(Error::invalid(format!(
                    "Root \"{name}\": routes must be a mapping, got {}",
                    type_name(other)
                )))
            }
        };

        Ok(Self {
            name: name.to_string(),
            root,
            params,
            children,
            pre,
            post,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn params(&self) -> &[Parameter] {
        &self.params
    }

    pub fn children(&self) -> &[RouteElement] {
        &self.children
    }

    pub async fn load(
        &mut self,
        router: &mut dyn Registrar,
        mount_path: &str,
        ctx: &LoadContext<'_>,
    ) -> Result<()> {
        let full_path = join_paths(mount_path, &self.root);
        load_all(&mut self.pre, router, &full_path, ctx).await?;
        load_elements(&mut self.children, router, &full_path, ctx).await?;
        load_all(&mut self.post, router, &full_path, ctx).await?;
        tracing::debug!(
            root = %self.name,
            path = %full_path,
            children = self.children.len(),
            "Root loaded"
        );
        Ok(())
    }

    pub fn routes(&self, mount_path: &str) -> Vec<RouteEntry> {
        let full_path = join_paths(mount_path, &self.root);
        self.children
            .iter()
            .flat_map(|child| child.routes(&full_path))
            .collect()
    }
}

impl fmt::Display for Root {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Root \"{}\" {}", self.name, self.root)?;
        if !self.params.is_empty() {
            let params: Vec<String> = self.params.iter().map(ToString::to_string).collect();
            write!(f, " {{ {} }}", params.join(", "))?;
        }
        let body: Vec<String> = self
            .pre
            .iter()
            .map(ToString::to_string)
            .chain(self.children.iter().map(ToString::to_string))
            .chain(self.post.iter().map(ToString::to_string))
            .collect();
        write!(f, "\n{}", indent(&body.join("\n")))
    }
}
