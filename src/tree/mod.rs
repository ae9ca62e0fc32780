//! Configuration tree subsystem.
//!
//! # Data Flow
//! ```text
//! Construction (synchronous, top-down):
//!     top-level mapping
//!     → classify each entry (import | root | path | error)
//!     → root.rs / route.rs / import.rs validate themselves
//!     → children built with inherited parameters passed down
//!     → method.rs / parameter.rs / middleware.rs leaves
//!
//! Load (async, depth-first, in declaration order):
//!     Root  → pre middlewares → children → post middlewares
//!     Route → pre middlewares → methods → post middlewares
//!     Method → resolve controller → Registrar::route(verb, path, chain)
//! ```
//!
//! # Design Decisions
//! - Nodes form a closed sum type; classification is total
//! - Parameters are additive: a child sees every ancestor's declarations
//! - First construction error aborts the whole tree
//! - Siblings load sequentially since registration order is match order
//! - A failed load keeps earlier registrations (no rollback)

use std::cell::RefCell;
use std::fmt;
use std::path::{Path, PathBuf};

use futures_util::future::BoxFuture;
use serde_json::{Map, Value};

use crate::config::ParserConfig;
use crate::error::{Error, Result};
use crate::http::context::Handler;
use crate::http::controller::Controller;
use crate::resolver::{normalize, Resolve};
use crate::routing::{HttpVerb, Registrar};

pub mod element;
pub mod import;
pub mod method;
pub mod middleware;
pub mod parameter;
pub mod root;
pub mod route;

pub use element::{CollectingDiagnostics, Diagnostics, NodeKind, TracingDiagnostics};
pub use import::Import;
pub use method::Method;
pub use middleware::Middleware;
pub use parameter::Parameter;
pub use root::Root;
pub use route::Route;

/// State shared by every node while the tree is constructed.
pub struct BuildContext<'a> {
    pub config: &'a ParserConfig,
    pub diagnostics: &'a dyn Diagnostics,
    /// Files currently being imported, outermost first.
    imports: RefCell<Vec<PathBuf>>,
}

impl<'a> BuildContext<'a> {
    pub fn new(config: &'a ParserConfig, diagnostics: &'a dyn Diagnostics) -> Self {
        Self {
            config,
            diagnostics,
            imports: RefCell::new(Vec::new()),
        }
    }

    /// Run `build` with `file` on the import stack; a file already on the stack is a cycle.
    pub(crate) fn with_import<T>(
        &self,
        file: &Path,
        build: impl FnOnce() -> Result<T>,
    ) -> Result<T> {
        let file = normalize(file);
        if self.imports.borrow().contains(&file) {
            let chain: Vec<String> = self
                .imports
                .borrow()
                .iter()
                .chain(std::iter::once(&file))
                .map(|p| p.display().to_string())
                .collect();
            return Err(Error::invalid(format!("import cycle: {}", chain.join(" -> "))));
        }
        self.imports.borrow_mut().push(file);
        let result = build();
        self.imports.borrow_mut().pop();
        result
    }
}

/// Collaborators used while loading the tree into a router.
pub struct LoadContext<'a> {
    pub config: &'a ParserConfig,
    pub controllers: &'a dyn Resolve<dyn Controller>,
    /// Handler modules: middlewares, and the controllers of non-abstract methods.
    pub middlewares: &'a dyn Resolve<dyn Handler>,
}

/// Shape of a configuration entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Root,
    Route,
    Import,
}

/// Decide what a configuration entry is.
///
/// `import` keys are imports; otherwise a non-null `root` makes a Root and a
/// non-null `path` makes a Route.
pub fn classify(key: &str, value: &Value) -> Result<ElementKind> {
    if key == "import" {
        return Ok(ElementKind::Import);
    }
    let present = |field: &str| value.get(field).is_some_and(|v| !v.is_null());
    match value {
        Value::Null => Err(Error::ConfigurationMissing(format!("element \"{key}\""))),
        Value::Object(_) if present("root") => Ok(ElementKind::Root),
        Value::Object(_) if present("path") => Ok(ElementKind::Route),
        _ => Err(Error::InvalidRouteElement(key.to_string())),
    }
}

/// A node under a root (or at the top level).
#[derive(Debug)]
pub enum RouteElement {
    Root(Root),
    Route(Route),
    Import(Import),
}

impl RouteElement {
    pub fn build(
        key: &str,
        value: &Value,
        inherited: &[Parameter],
        ctx: &BuildContext<'_>,
    ) -> Result<Self> {
        let config = Some(value);
        Ok(match classify(key, value)? {
            ElementKind::Root => RouteElement::Root(Root::new(key, config, inherited, ctx)?),
            ElementKind::Route => RouteElement::Route(Route::new(key, config, inherited, ctx)?),
            ElementKind::Import => RouteElement::Import(Import::new(config, inherited, ctx)?),
        })
    }

    pub fn kind(&self) -> ElementKind {
        match self {
            RouteElement::Root(_) => ElementKind::Root,
            RouteElement::Route(_) => ElementKind::Route,
            RouteElement::Import(_) => ElementKind::Import,
        }
    }

    pub fn load<'a>(
        &'a mut self,
        router: &'a mut dyn Registrar,
        mount_path: &'a str,
        ctx: &'a LoadContext<'a>,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            match self {
                RouteElement::Root(root) => root.load(router, mount_path, ctx).await,
                RouteElement::Route(route) => route.load(router, mount_path, ctx).await,
                RouteElement::Import(import) => import.load(router, mount_path, ctx).await,
            }
        })
    }

    /// Registrations this element produces under `mount_path`, in order.
    pub fn routes(&self, mount_path: &str) -> Vec<RouteEntry> {
        match self {
            RouteElement::Root(root) => root.routes(mount_path),
            RouteElement::Route(route) => route.routes(mount_path),
            RouteElement::Import(import) => import.routes(mount_path),
        }
    }
}

impl fmt::Display for RouteElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteElement::Root(root) => root.fmt(f),
            RouteElement::Route(route) => route.fmt(f),
            RouteElement::Import(import) => import.fmt(f),
        }
    }
}

/// Build every entry of a mapping, in declaration order.
pub fn compile_elements(
    entries: &Map<String, Value>,
    inherited: &[Parameter],
    ctx: &BuildContext<'_>,
) -> Result<Vec<RouteElement>> {
    entries
        .iter()
        .map(|(key, value)| RouteElement::build(key, value, inherited, ctx))
        .collect()
}

/// Load elements one after the other.
pub(crate) async fn load_elements(
    elements: &mut [RouteElement],
    router: &mut dyn Registrar,
    mount_path: &str,
    ctx: &LoadContext<'_>,
) -> Result<()> {
    for element in elements.iter_mut() {
        element.load(router, mount_path, ctx).await?;
    }
    Ok(())
}

/// One route registration, as listed by [`RouteElement::routes`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEntry {
    pub verb: HttpVerb,
    pub path: String,
    pub controller: String,
}

impl fmt::Display for RouteEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<7} {} -> {}", self.verb.as_str(), self.path, self.controller)
    }
}
