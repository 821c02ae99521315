use async_trait::async_trait;
use axum::Router;
use crudkit::Module;
use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use tracing::info;

use crate::api::rest::routes;
use crate::infra::storage::migrations::Migrator;
use crate::notifier::Notifier;

pub struct Notifications {
    db: DatabaseConnection,
}

impl Notifications {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub fn notifier(&self) -> Notifier {
        Notifier::new(self.db.clone())
    }
}

#[async_trait]
impl Module for Notifications {
    fn name(&self) -> &'static str {
        "notifications"
    }

    async fn migrate(&self, db: &DatabaseConnection) -> anyhow::Result<()> {
        info!("Running notifications database migrations");
        Migrator::up(db, None).await?;
        Ok(())
    }

    fn register_rest(&self, router: Router) -> anyhow::Result<Router> {
        routes::register_routes(router, self.db.clone())
    }
}
