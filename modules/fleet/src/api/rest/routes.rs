use axum::Router;
use crudkit::{crud_routes, ResourceRouter};
use notifications::Notifier;
use sea_orm::DatabaseConnection;

use super::customers::Customers;
use super::invoices::Invoices;
use super::payments::Payments;
use super::vehicles::Vehicles;

pub fn register_routes(
    router: Router,
    db: DatabaseConnection,
    notifier: Notifier,
) -> anyhow::Result<Router> {
    let payments = ResourceRouter::new(Payments::new(db.clone()))
        .list()
        .into_router("/payment");

    Ok(router
        .merge(crud_routes("/customer", Customers::new(db.clone())))
        .merge(crud_routes("/vehicle", Vehicles::new(db.clone())))
        .merge(crud_routes("/invoice", Invoices::new(db, notifier)))
        .merge(payments))
}
