use std::sync::OnceLock;

use crudkit::full_name;
use crudkit_db::{FieldKind, FieldMap, ManagedEntity};
use sea_orm::entity::prelude::*;
use serde::Serialize;

pub const CUSTOMER_TYPES: &[&str] = &["BUSINESS", "INDIVIDUAL"];

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "customer")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub customer_id: String,
    pub customer_type: String,
    pub company_name: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub mobile_number: String,
    pub email: String,
    pub address: String,
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
    const PRIMARY_KEY: &'static str = "customer_id";

    fn field_map() -> &'static FieldMap<Self> {
        static MAP: OnceLock<FieldMap<Entity>> = OnceLock::new();
        MAP.get_or_init(|| {
            FieldMap::new()
                .insert("customer_id", Column::CustomerId, FieldKind::String)
                .insert("customer_type", Column::CustomerType, FieldKind::String)
                .insert("company_name", Column::CompanyName, FieldKind::String)
                .insert_nullable("first_name", Column::FirstName, FieldKind::String)
                .insert_nullable("last_name", Column::LastName, FieldKind::String)
                .insert("mobile_number", Column::MobileNumber, FieldKind::String)
                .insert("email", Column::Email, FieldKind::String)
                .insert("address", Column::Address, FieldKind::String)
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

impl Model {
    pub fn full_name(&self) -> String {
        full_name(self.first_name.as_deref(), self.last_name.as_deref())
    }

    pub fn to_dict(&self) -> serde_json::Value {
        serde_json::json!({
            "customer_id": self.customer_id,
            "customer_type": self.customer_type,
            "company_name": self.company_name,
            "first_name": self.first_name,
            "last_name": self.last_name,
            "full_name": self.full_name(),
            "mobile_number": self.mobile_number,
            "email": self.email,
            "address": self.address,
        })
    }
}
