use async_trait::async_trait;
use axum::Router;
use crudkit::Module;
use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use tracing::info;

use crate::api::rest::{auth::Authenticator, routes};
use crate::config::AccountsConfig;
use crate::infra::storage::migrations::Migrator;

/// Users, login tokens and bearer authentication.
pub struct Accounts {
    db: DatabaseConnection,
    config: AccountsConfig,
}

impl Accounts {
    pub fn new(db: DatabaseConnection, config: AccountsConfig) -> Self {
        Self { db, config }
    }

    /// State for [`crate::require_bearer`].
    pub fn authenticator(&self) -> Authenticator {
        Authenticator::new(self.db.clone())
    }
}

#[async_trait]
impl Module for Accounts {
    fn name(&self) -> &'static str {
        "accounts"
    }

    async fn migrate(&self, db: &DatabaseConnection) -> anyhow::Result<()> {
        info!("Running accounts database migrations");
        Migrator::up(db, None).await?;
        Ok(())
    }

    fn register_rest(&self, router: Router) -> anyhow::Result<Router> {
        routes::register_routes(router, self.db.clone())
    }

    fn register_public(&self, router: Router) -> anyhow::Result<Router> {
        routes::register_public_routes(router, self.db.clone(), self.config.token_bytes)
    }
}
