//! Middleware references.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::error::{Error, Result};
use crate::http::context::Handler;
use crate::routing::Registrar;
use crate::tree::LoadContext;

/// A named middleware, resolved against the middleware directory during load.
#[derive(Clone)]
pub struct Middleware {
    name: String,
    resolved: Option<Arc<dyn Handler>>,
}

impl Middleware {
    pub fn new(name: &Value) -> Result<Self> {
        match name {
            Value::String(name) if !name.trim().is_empty() => Ok(Self {
                name: name.clone(),
                resolved: None,
            }),
            other => Err(Error::invalid(format!(
                "middleware name must be a non-empty string, got {other}"
            ))),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved.is_some()
    }

    /// Resolve once; later calls reuse the cached handler.
    pub async fn resolve(&mut self, ctx: &LoadContext<'_>) -> Result<Arc<dyn Handler>> {
        if let Some(handler) = &self.resolved {
            return Ok(Arc::clone(handler));
        }
        let dir = &ctx.config.middleware_dir;
        let handler = ctx
            .middlewares
            .resolve(&self.name, dir)
            .await
            .map_err(|e| Error::MiddlewareNotFound {
                name: self.name.clone(),
                path: e.module_path().map(str::to_string).unwrap_or_else(|| e.to_string()),
            })?;
        self.resolved = Some(Arc::clone(&handler));
        Ok(handler)
    }

    /// Resolve and mount at `mount_path`.
    pub async fn load(
        &mut self,
        router: &mut dyn Registrar,
        mount_path: &str,
        ctx: &LoadContext<'_>,
    ) -> Result<()> {
        let handler = self.resolve(ctx).await?;
        tracing::debug!(middleware = %self.name, path = mount_path, "Middleware loaded");
        router.mount(mount_path, handler);
        Ok(())
    }
}

impl fmt::Debug for Middleware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Middleware")
            .field("name", &self.name)
            .field("resolved", &self.is_resolved())
            .finish()
    }
}

impl fmt::Display for Middleware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Middleware name=\"{}\">", self.name)
    }
}

/// Resolve every middleware of a list, in order.
pub(crate) async fn resolve_all(
    middlewares: &mut [Middleware],
    ctx: &LoadContext<'_>,
) -> Result<Vec<Arc<dyn Handler>>> {
    let mut handlers = Vec::with_capacity(middlewares.len());
    for middleware in middlewares.iter_mut() {
        handlers.push(middleware.resolve(ctx).await?);
    }
    Ok(handlers)
}

/// Mount every middleware of a list at `mount_path`, in order.
pub(crate) async fn load_all(
    middlewares: &mut [Middleware],
    router: &mut dyn Registrar,
    mount_path: &str,
    ctx: &LoadContext<'_>,
) -> Result<()> {
    for middleware in middlewares.iter_mut() {
        middleware.load(router, mount_path, ctx).await?;
    }
    Ok(())
}
