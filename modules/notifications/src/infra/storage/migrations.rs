use sea_orm::Schema;
use sea_orm_migration::prelude::*;

use super::entity::{notification, user_notification};

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(m20250901_000003_create_notifications::Migration)]
    }

    fn migration_table_name() -> DynIden {
        Alias::new("notifications_migrations").into_iden()
    }
}

mod m20250901_000003_create_notifications {
    use super::*;

    #[derive(DeriveMigrationName)]
    pub struct Migration;

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            let schema = Schema::new(manager.get_database_backend());

            manager
                .create_table(
                    schema
                        .create_table_from_entity(notification::Entity)
                        .if_not_exists()
                        .to_owned(),
                )
                .await?;
            manager
                .create_table(
                    schema
                        .create_table_from_entity(user_notification::Entity)
                        .if_not_exists()
                        .to_owned(),
                )
                .await?;
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_user_notification_user_read")
                        .table(user_notification::Entity)
                        .col(user_notification::Column::UserId)
                        .col(user_notification::Column::IsRead)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(
                    Table::drop()
                        .table(user_notification::Entity)
                        .if_exists()
                        .to_owned(),
                )
                .await?;
            manager
                .drop_table(Table::drop().table(notification::Entity).if_exists().to_owned())
                .await
        }
    }
}
