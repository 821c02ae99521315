use sea_orm::Schema;
use sea_orm_migration::prelude::*;

use super::entity::{token, user};

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(m20250901_000001_create_accounts::Migration)]
    }

    fn migration_table_name() -> DynIden {
        Alias::new("accounts_migrations").into_iden()
    }
}

mod m20250901_000001_create_accounts {
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
                        .create_table_from_entity(user::Entity)
                        .if_not_exists()
                        .to_owned(),
                )
                .await?;
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_auth_users_email")
                        .table(user::Entity)
                        .col(user::Column::Email)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    schema
                        .create_table_from_entity(token::Entity)
                        .if_not_exists()
                        .to_owned(),
                )
                .await?;
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_token_user_id")
                        .table(token::Entity)
                        .col(token::Column::UserId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(token::Entity).if_exists().to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(user::Entity).if_exists().to_owned())
                .await
        }
    }
}
