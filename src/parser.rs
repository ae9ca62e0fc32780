//! Tree compiler: the entry point from route configuration to a loaded router.
//!
//! # Responsibilities
//! - Read route configuration from a file, a string, or an already parsed value
//! - Compile the top-level mapping into [`RouteElement`]s
//! - Load the tree into a [`Registrar`], resolving controllers and middlewares
//!
//! # Design Decisions
//! - Files are resolved against `config_dir`, like imports
//! - The top-level mapping behaves like the `routes` of an implicit root at `/`
//! - Load registers a per-request context initializer at `/` before anything else
//! - A failed load keeps whatever was registered before the failure

use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::config::ParserConfig;
use crate::error::{Error, Result};
use crate::http::context::{ContextInitializer, Handler};
use crate::http::controller::Controller;
use crate::resolver::{ModuleRegistry, Resolve};
use crate::routing::Registrar;
use crate::tree::element::type_name;
use crate::tree::{
    compile_elements, load_elements, BuildContext, Diagnostics, LoadContext, RouteElement,
    RouteEntry, TracingDiagnostics,
};

/// Where the parser is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserState {
    /// No configuration compiled yet.
    Empty,
    /// A tree is compiled and ready to load.
    Constructed,
    /// The tree has been loaded into the router.
    Loaded,
}

/// Compiles route configuration and loads it into a router.
pub struct Parser<R: Registrar> {
    router: R,
    config: ParserConfig,
    controllers: Arc<dyn Resolve<dyn Controller>>,
    middlewares: Arc<dyn Resolve<dyn Handler>>,
    diagnostics: Arc<dyn Diagnostics>,
    elements: Vec<RouteElement>,
    state: ParserState,
}

impl<R: Registrar> Parser<R> {
    pub fn new(router: R, config: ParserConfig) -> Self {
        Self {
            router,
            config,
            controllers: Arc::new(ModuleRegistry::<dyn Controller>::new()),
            middlewares: Arc::new(ModuleRegistry::<dyn Handler>::new()),
            diagnostics: Arc::new(TracingDiagnostics),
            elements: Vec::new(),
            state: ParserState::Empty,
        }
    }

    pub fn with_controllers(mut self, controllers: impl Resolve<dyn Controller> + 'static) -> Self {
        self.controllers = Arc::new(controllers);
        self
    }

    pub fn with_middlewares(mut self, middlewares: impl Resolve<dyn Handler> + 'static) -> Self {
        self.middlewares = Arc::new(middlewares);
        self
    }

    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn Diagnostics>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    pub fn state(&self) -> ParserState {
        self.state
    }

    pub fn elements(&self) -> &[RouteElement] {
        &self.elements
    }

    pub fn router(&self) -> &R {
        &self.router
    }

    pub fn into_router(self) -> R {
        self.router
    }

    /// Compile the file at `config_dir/<file>`.
    pub fn parse_from_file(&mut self, file: impl AsRef<Path>) -> Result<()> {
        let path = self.config.config_dir.join(file);
        tracing::info!(file = %path.display(), "Parsing route configuration");
        let document = read_document(&path)?;
        self.parse_config(&document)
    }

    pub fn parse_from_string(&mut self, text: &str) -> Result<()> {
        let document = parse_document(text)?;
        self.parse_config(&document)
    }

    /// Compile an already parsed configuration; replaces any previous tree.
    pub fn parse_config(&mut self, config: &Value) -> Result<()> {
        let entries = top_level_mapping(config)?;
        if entries.is_empty() {
            return Err(Error::EmptyRoutes("/".to_string()));
        }
        let ctx = BuildContext::new(&self.config, self.diagnostics.as_ref());
        self.elements = compile_elements(entries, &[], &ctx)?;
        self.state = ParserState::Constructed;
        tracing::debug!(elements = self.elements.len(), "Route configuration compiled");
        Ok(())
    }

    /// Register everything the compiled tree declares, in declaration order.
    pub async fn load(&mut self) -> Result<()> {
        match self.state {
            ParserState::Empty => {
                return Err(Error::invalid("no route configuration has been parsed"))
            }
            ParserState::Loaded => {
                return Err(Error::invalid("route configuration is already loaded"))
            }
            ParserState::Constructed => {}
        }

        self.router.mount("/", Arc::new(ContextInitializer));
        let ctx = LoadContext {
            config: &self.config,
            controllers: self.controllers.as_ref(),
            middlewares: self.middlewares.as_ref(),
        };
        load_elements(&mut self.elements, &mut self.router, "/", &ctx).await?;
        self.state = ParserState::Loaded;

        tracing::info!(routes = self.routes().len(), "Route configuration loaded");
        Ok(())
    }

    /// Route registrations the compiled tree produces.
    pub fn routes(&self) -> Vec<RouteEntry> {
        self.elements
            .iter()
            .flat_map(|element| element.routes("/"))
            .collect()
    }
}

impl<R: Registrar> fmt::Display for Parser<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let elements: Vec<String> = self.elements.iter().map(ToString::to_string).collect();
        f.write_str(&elements.join("\n"))
    }
}

impl<R: Registrar + fmt::Debug> fmt::Debug for Parser<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parser")
            .field("router", &self.router)
            .field("config", &self.config)
            .field("elements", &self.elements)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

/// Read and parse a YAML file; missing files and directories are `FileNotFound`.
pub(crate) fn read_document(path: &Path) -> Result<Value> {
    if !path.is_file() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }
    let text = fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_document(&text)
}

pub(crate) fn parse_document(text: &str) -> Result<Value> {
    if text.trim().is_empty() {
        return Err(Error::EmptyConfigFile);
    }
    match serde_yaml::from_str::<Value>(text)? {
        Value::Null => Err(Error::EmptyConfigFile),
        document => Ok(document),
    }
}

pub(crate) fn top_level_mapping(document: &Value) -> Result<&Map<String, Value>> {
    match document {
        Value::Object(entries) => Ok(entries),
        Value::Null => Err(Error::EmptyConfigFile),
        other => Err(Error::invalid(format!(
            "top-level configuration must be a mapping, got {}",
            type_name(other)
        ))),
    }
}
