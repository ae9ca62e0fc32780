//! `import` directives: routes pulled in from other configuration files.

use std::fmt;
use std::path::PathBuf;

use serde_json::Value;

use crate::error::{Error, Result};
use crate::parser::{read_document, top_level_mapping};
use crate::routing::Registrar;
use crate::tree::element::{indent, require_config, type_name, NodeKind};
use crate::tree::parameter::Parameter;
use crate::tree::{
    compile_elements, load_elements, BuildContext, LoadContext, RouteElement, RouteEntry,
};

/// Elements compiled from external files, mounted where the directive appears.
///
/// Files are resolved against the configured `config_dir` and compiled
/// eagerly, with the parameters of the enclosing root.
#[derive(Debug)]
pub struct Import {
    sources: Vec<PathBuf>,
    children: Vec<RouteElement>,
}

impl Import {
    /// `config` is a file name or a list of file names.
    pub fn new(
        config: Option<&Value>,
        inherited: &[Parameter],
        ctx: &BuildContext<'_>,
    ) -> Result<Self> {
        let files = match require_config(NodeKind::Import, "import", config)? {
            Value::String(file) => vec![file.as_str()],
            Value::Array(items) if !items.is_empty() => items
                .iter()
                .map(|item| match item {
                    Value::String(file) if !file.trim().is_empty() => Ok(file.as_str()),
                    _ => Err(Error::invalid("import must only list non-empty file names")),
                })
                .collect::<Result<Vec<_>>>()?,
            Value::Array(_) => return Err(Error::invalid("import must list at least one file")),
            other => {
                return Err(Error::invalid(format!(
                    "import must be a file name or a list of file names, got {}",
                    type_name(other)
                )))
            }
        };

        let mut sources = Vec::with_capacity(files.len());
        let mut children = Vec::new();
        for file in files {
            let path = ctx.config.config_dir.join(file);
            let compiled = ctx.with_import(&path, || {
                let document = read_document(&path)?;
                compile_elements(top_level_mapping(&document)?, inherited, ctx)
            })?;
            tracing::debug!(
                file = %path.display(),
                elements = compiled.len(),
                "Configuration imported"
            );
            children.extend(compiled);
            sources.push(path);
        }

        Ok(Self { sources, children })
    }

    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
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
        load_elements(&mut self.children, router, mount_path, ctx).await
    }

    pub fn routes(&self, mount_path: &str) -> Vec<RouteEntry> {
        self.children
            .iter()
            .flat_map(|child| child.routes(mount_path))
            .collect()
    }
}

impl fmt::Display for Import {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sources: Vec<String> = self
            .sources
            .iter()
            .map(|p| p.display().to_string())
            .collect();
        write!(f, "Import [{}]", sources.join(", "))?;
        let body: Vec<String> = self.children.iter().map(ToString::to_string).collect();
        if !body.is_empty() {
            write!(f, "\n{}", indent(&body.join("\n")))?;
        }
        Ok(())
    }
}
