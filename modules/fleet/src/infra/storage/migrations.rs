use sea_orm::Schema;
use sea_orm_migration::prelude::*;

use super::entity::{customer, invoice, vehicle};

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(m20250901_000002_create_fleet::Migration)]
    }

    fn migration_table_name() -> DynIden {
        Alias::new("fleet_migrations").into_iden()
    }
}

mod m20250901_000002_create_fleet {
    use super::*;

    #[derive(DeriveMigrationName)]
    pub struct Migration;

    async fn index(
        manager: &SchemaManager<'_>,
        name: &str,
        table: impl IntoTableRef,
        col: impl IntoIden,
    ) -> Result<(), DbErr> {
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name(name)
                    .table(table)
                    .col(col)
                    .to_owned(),
            )
            .await
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            let schema = Schema::new(manager.get_database_backend());

            for mut stmt in [
                schema.create_table_from_entity(customer::Entity),
                schema.create_table_from_entity(vehicle::Entity),
                schema.create_table_from_entity(invoice::Entity),
            ] {
                manager.create_table(stmt.if_not_exists().to_owned()).await?;
            }

            // Non-unique: email and vehicle number are unique among live rows only.
            index(manager, "idx_customer_email", customer::Entity, customer::Column::Email).await?;
            index(
                manager,
                "idx_vehicle_number",
                vehicle::Entity,
                vehicle::Column::VehicleNumber,
            )
            .await?;
            index(
                manager,
                "idx_invoice_customer_id",
                invoice::Entity,
                invoice::Column::CustomerId,
            )
            .await?;
            index(
                manager,
                "idx_invoice_vehicle_id",
                invoice::Entity,
                invoice::Column::VehicleId,
            )
            .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(invoice::Entity).if_exists().to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(vehicle::Entity).if_exists().to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(customer::Entity).if_exists().to_owned())
                .await
        }
    }
}
