//! Errors raised while compiling a route configuration and loading it into a router.
//!
//! Construction errors are fatal and synchronous: the first violation aborts the
//! whole tree. Load errors fail `Parser::load` and leave earlier registrations in
//! place. Per-request failures live in [`crate::http::RouteError`] instead.

use std::path::PathBuf;

use thiserror::Error;

/// Crate-level result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Error kinds produced by the tree compiler and the load phase.
#[derive(Debug, Error)]
pub enum Error {
    /// A node's configuration is null or absent.
    #[error("{0} configuration is undefined")]
    ConfigurationMissing(String),

    /// A configuration field is malformed (path syntax, verb, middleware list, type name...).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A root declares no routes.
    #[error("root \"{0}\" does not provide routes")]
    EmptyRoutes(String),

    /// A route declares no methods.
    #[error("route \"{0}\" does not provide methods")]
    EmptyMethods(String),

    /// A configuration entry is neither a root nor a route.
    #[error("\"{0}\" is not recognized as a root or as a route")]
    InvalidRouteElement(String),

    /// Configuration file is missing or is a directory.
    #[error("configuration file \"{}\" not found", .0.display())]
    FileNotFound(PathBuf),

    /// Configuration input is blank.
    #[error("configuration is empty")]
    EmptyConfigFile,

    /// Configuration file could not be read.
    #[error("failed to read \"{}\": {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML syntax error, passed through from the YAML parser.
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    /// No unit (or no matching export) exists at the attempted path.
    #[error("\"{path}\" is not a valid module path, or does not provide (default) export")]
    ModuleNotFound { path: String },

    /// Controller resolution failed.
    #[error("controller \"{name}\" not found (looked up \"{path}\")")]
    ControllerNotFound { name: String, path: String },

    /// Middleware resolution failed.
    #[error("middleware \"{name}\" not found (looked up \"{path}\")")]
    MiddlewareNotFound { name: String, path: String },
}

impl Error {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Error::InvalidArgument(message.into())
    }

    /// Attempted module path carried by resolution failures.
    pub fn module_path(&self) -> Option<&str> {
        match self {
            Error::ModuleNotFound { path }
            | Error::ControllerNotFound { path, .. }
            | Error::MiddlewareNotFound { path, .. } => Some(path),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_offender() {
        let err = Error::InvalidRouteElement("teapot".into());
        assert_eq!(
            err.to_string(),
            "\"teapot\" is not recognized as a root or as a route"
        );

        let err = Error::FileNotFound(PathBuf::from("config/missing.yaml"));
        assert!(err.to_string().contains("config/missing.yaml"));
    }

    #[test]
    fn test_module_path() {
        let err = Error::ControllerNotFound {
            name: "getUser".into(),
            path: "controller/getUser".into(),
        };
        assert_eq!(err.module_path(), Some("controller/getUser"));
        assert_eq!(Error::EmptyConfigFile.module_path(), None);
    }
}
