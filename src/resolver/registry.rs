//! In-memory module registry.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::resolver::{normalize, ModuleName, Resolve};

/// One registered unit: an optional default export plus named exports.
struct Unit<T: ?Sized> {
    default: Option<Arc<T>>,
    exports: HashMap<String, Arc<T>>,
}

impl<T: ?Sized> Default for Unit<T> {
    fn default() -> Self {
        Self {
            default: None,
            exports: HashMap::new(),
        }
    }
}

/// Registry mapping unit paths (`<dir>/<file>`) to callables.
pub struct ModuleRegistry<T: ?Sized> {
    units: HashMap<PathBuf, Unit<T>>,
}

impl<T: ?Sized> Default for ModuleRegistry<T> {
    fn default() -> Self {
        Self {
            units: HashMap::new(),
        }
    }
}

impl<T: ?Sized> fmt::Debug for ModuleRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut units: Vec<_> = self.units.keys().collect();
        units.sort();
        f.debug_struct("ModuleRegistry").field("units", &units).finish()
    }
}

impl<T: ?Sized> ModuleRegistry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the default export of the unit at `path` (e.g. `controller/getUser`).
    pub fn register(&mut self, path: impl AsRef<Path>, item: Arc<T>) -> &mut Self {
        self.unit_mut(path.as_ref()).default = Some(item);
        self
    }

    /// Register a named export of the unit at `path`.
    pub fn register_export(
        &mut self,
        path: impl AsRef<Path>,
        export: &str,
        item: Arc<T>,
    ) -> &mut Self {
        self.unit_mut(path.as_ref())
            .exports
            .insert(export.to_string(), item);
        self
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Synchronous lookup behind [`Resolve::resolve`].
    pub fn lookup(&self, name: &str, base_dir: &Path) -> Result<Arc<T>> {
        let module = ModuleName::parse(name);
        let not_found = || Error::ModuleNotFound {
            path: module.display_path(base_dir),
        };
        let unit = self
            .units
            .get(&module.unit_path(base_dir))
            .ok_or_else(not_found)?;
        let item = match module.export {
            Some(export) => unit.exports.get(export),
            None => unit.default.as_ref(),
        };
        item.cloned().ok_or_else(not_found)
    }

    fn unit_mut(&mut self, path: &Path) -> &mut Unit<T> {
        self.units.entry(normalize(path)).or_default()
    }
}

#[async_trait]
impl<T: ?Sized + Send + Sync> Resolve<T> for ModuleRegistry<T> {
    async fn resolve(&self, name: &str, base_dir: &Path) -> Result<Arc<T>> {
        let resolved = self.lookup(name, base_dir);
        match &resolved {
            Ok(_) => tracing::trace!(
                module = name,
                base_dir = %base_dir.display(),
                "Module resolved"
            ),
            Err(e) => tracing::debug!(module = name, error = %e, "Module resolution failed"),
        }
        resolved
    }
}
