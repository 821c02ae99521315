use async_trait::async_trait;
use axum::Router;
use crudkit::Module;
use notifications::Notifier;
use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use tracing::info;

use crate::api::rest::routes;
use crate::infra::storage::migrations::Migrator;

/// Customers, vehicles, invoices and the payment summary.
pub struct Fleet {
    db: DatabaseConnection,
    notifier: Notifier,
}

impl Fleet {
    pub fn new(db: DatabaseConnection, notifier: Notifier) -> Self {
        Self { db, notifier }
    }
}

#[async_trait]
impl Module for Fleet {
    fn name(&self) -> &'static str {
        "fleet"
    }

    async fn migrate(&self, db: &DatabaseConnection) -> anyhow::Result<()> {
        info!("Running fleet database migrations");
        Migrator::up(db, None).await?;
        Ok(())
    }

    fn register_rest(&self, router: Router) -> anyhow::Result<Router> {
        routes::register_routes(router, self.db.clone(), self.notifier.clone())
    }
}
