//! Declarative route configuration for Axum services.
//!
//! A YAML document describes roots, routes, methods, parameters and
//! middlewares; [`Parser`] compiles it into a typed tree and loads it into a
//! [`routing::Registrar`], resolving controllers and middlewares by name.

pub mod config;
pub mod error;
pub mod http;
pub mod observability;
pub mod parser;
pub mod resolver;
pub mod routing;
pub mod tree;
pub mod validation;

pub use config::{ParserConfig, Settings};
pub use error::{Error, Result};
pub use http::HttpServer;
pub use parser::Parser;
pub use resolver::ModuleRegistry;
pub use routing::Dispatcher;
