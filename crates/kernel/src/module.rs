use async_trait::async_trait;
use axum::Router;

/// Context provided to modules during initialization
pub struct InitCtx<'a> {
    pub settings: &'a crate::settings::Settings,
}

/// Core module trait that all bookshelf modules implement
#[async_trait]
pub trait Module: Sync + Send {
    /// Unique name for this module
    fn name(&self) -> &'static str;

    /// Initialize the module with the provided context.
    /// Called once during startup, before the HTTP listener binds.
    async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Return the Axum router for this module's routes.
    /// Routes are merged at the server root, so paths are absolute.
    fn routes(&self) -> Router {
        Router::new()
    }

    /// Return an OpenAPI fragment (`paths` and `components`) as JSON.
    /// Fragments of all modules are merged into one document.
    fn openapi(&self) -> Option<serde_json::Value> {
        None
    }

    /// Release resources. Called during shutdown after the server drains.
    async fn stop(&self) -> anyhow::Result<()> {
        Ok(())
    }
}
