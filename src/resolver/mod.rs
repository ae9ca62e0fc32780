//! Named-module resolution subsystem.
//!
//! # Data Flow
//! ```text
//! "users:getById" + base dir "controller"
//!     → ModuleName::parse  (file = "users", export = Some("getById"))
//!     → unit path "controller/users"
//!     → registry.rs lookup (unit → named export or default export)
//!     → Arc<T> callable, or Error::ModuleNotFound { path }
//! ```
//!
//! # Design Decisions
//! - Units are registered up front; nothing is loaded from disk at runtime
//! - Resolution is async so a resolver backed by slow storage fits the same seam
//! - Every failure kind (no unit, no export, no default) reports the attempted path

pub mod registry;

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;

use crate::error::Result;

pub use registry::ModuleRegistry;

/// Resolves a module name under a base directory to a callable.
#[async_trait]
pub trait Resolve<T: ?Sized + Send + Sync>: Send + Sync {
    async fn resolve(&self, name: &str, base_dir: &Path) -> Result<std::sync::Arc<T>>;
}

/// A parsed `file[:export]` reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleName<'a> {
    pub file: &'a str,
    pub export: Option<&'a str>,
}

impl<'a> ModuleName<'a> {
    pub fn parse(name: &'a str) -> Self {
        match name.split_once(':') {
            Some((file, export)) if !export.is_empty() => Self {
                file,
                export: Some(export),
            },
            Some((file, _)) => Self { file, export: None },
            None => Self {
                file: name,
                export: None,
            },
        }
    }

    /// Path of the unit under `base_dir`.
    pub fn unit_path(&self, base_dir: &Path) -> PathBuf {
        normalize(&base_dir.join(self.file))
    }

    /// Path as reported in errors, export selector included.
    pub fn display_path(&self, base_dir: &Path) -> String {
        let unit = self.unit_path(base_dir);
        match self.export {
            Some(export) => format!("{}:{}", unit.display(), export),
            None => unit.display().to_string(),
        }
    }
}

/// Lexically normalize a unit path: drops `.` and resolves `..` against preceding segments.
pub(crate) fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
