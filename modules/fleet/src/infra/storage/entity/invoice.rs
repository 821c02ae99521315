use std::sync::OnceLock;

use crudkit_db::{FieldKind, FieldMap, ManagedEntity};
use rust_decimal::prelude::ToPrimitive;
use sea_orm::entity::prelude::*;
use serde::Serialize;

pub const INVOICE_STATUSES: &[&str] = &["PENDING", "PAID", "UNPAID"];
pub const PAID: &str = "PAID";

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "invoice")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub invoice_id: String,
    pub invoice_number: String,
    pub customer_id: String,
    pub vehicle_id: String,
    pub date: Date,
    pub loading_address: String,
    pub delivery_address: String,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub weight: Decimal,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub rate: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub total: Decimal,
    pub status: String,
    pub is_active: bool,
    pub is_deleted: bool,
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
    pub created_dtm: DateTimeUtc,
    pub updated_dtm: DateTimeUtc,
    pub deleted_dtm: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl ManagedEntity for Entity {
    type Active = ActiveModel;
    const PRIMARY_KEY: &'static str = "invoice_id";

    fn field_map() -> &'static FieldMap<Self> {
        static MAP: OnceLock<FieldMap<Entity>> = OnceLock::new();
        MAP.get_or_init(|| {
            FieldMap::new()
                .insert("invoice_id", Column::InvoiceId, FieldKind::String)
                .insert("invoice_number", Column::InvoiceNumber, FieldKind::String)
                .insert("customer_id", Column::CustomerId, FieldKind::String)
                .insert("vehicle_id", Column::VehicleId, FieldKind::String)
                .insert("date", Column::Date, FieldKind::Date)
                .insert("loading_address", Column::LoadingAddress, FieldKind::String)
                .insert("delivery_address", Column::DeliveryAddress, FieldKind::String)
                .insert("weight", Column::Weight, FieldKind::Decimal)
                .insert("rate", Column::Rate, FieldKind::Decimal)
                .insert("total", Column::Total, FieldKind::Decimal)
                .insert("status", Column::Status, FieldKind::String)
                .insert("is_active", Column::IsActive, FieldKind::Bool)
                .insert("is_deleted", Column::IsDeleted, FieldKind::Bool)
                .insert_nullable("created_by", Column::CreatedBy, FieldKind::String)
                .insert_nullable("updated_by", Column::UpdatedBy, FieldKind::String)
                .insert("created_dtm", Column::CreatedDtm, FieldKind::DateTimeUtc)
                .insert("updated_dtm", Column::UpdatedDtm, FieldKind::DateTimeUtc)
                .insert_nullable("deleted_dtm", Column::DeletedDtm, FieldKind::DateTimeUtc)
        })
    }
}

/// Amounts leave the API as JSON numbers.
pub fn amount(d: &Decimal) -> f64 {
    d.to_f64().unwrap_or_default()
}

impl Model {
    pub fn is_paid(&self) -> bool {
        self.status == PAID
    }

    pub fn to_dict(&self) -> serde_json::Value {
        serde_json::json!({
            "invoice_id": self.invoice_id,
            "invoice_number": self.invoice_number,
            "customer_id": self.customer_id,
            "vehicle_id": self.vehicle_id,
            "date": self.date,
            "loading_address": self.loading_address,
            "delivery_address": self.delivery_address,
            "weight": amount(&self.weight),
            "rate": amount(&self.rate),
            "total": amount(&self.total),
            "status": self.status,
        })
    }
}
