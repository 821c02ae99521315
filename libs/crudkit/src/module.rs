use async_trait::async_trait;
use axum::Router;
use sea_orm::DatabaseConnection;

/// Lifecycle of a domain module as driven by the server: migrations first,
/// then route registration.
#[async_trait]
pub trait Module: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    /// Creates or upgrades the module's tables. Runs before any route is served.
    async fn migrate(&self, db: &DatabaseConnection) -> anyhow::Result<()>;

    /// Routes that require an authenticated caller.
    fn register_rest(&self, router: Router) -> anyhow::Result<Router>;

    /// Routes served without authentication.
    fn register_public(&self, router: Router) -> anyhow::Result<Router> {
        Ok(router)
    }
}
