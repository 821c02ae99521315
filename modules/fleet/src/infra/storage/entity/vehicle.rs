use std::sync::OnceLock;

use crudkit_db::{FieldKind, FieldMap, ManagedEntity};
use sea_orm::entity::prelude::*;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "vehicle")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub vehicle_id: String,
    pub vehicle_name: String,
    pub vehicle_type: String,
    pub vehicle_number: String,
    pub vehicle_model: String,
    pub vehicle_color: String,
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
    const PRIMARY_KEY: &'static str = "vehicle_id";

    fn field_map() -> &'static FieldMap<Self> {
        static MAP: OnceLock<FieldMap<Entity>> = OnceLock::new();
        MAP.get_or_init(|| {
            FieldMap::new()
                .insert("vehicle_id", Column::VehicleId, FieldKind::String)
                .insert("vehicle_name", Column::VehicleName, FieldKind::String)
                .insert("vehicle_type", Column::VehicleType, FieldKind::String)
                .insert("vehicle_number", Column::VehicleNumber, FieldKind::String)
                .insert("vehicle_model", Column::VehicleModel, FieldKind::String)
                .insert("vehicle_color", Column::VehicleColor, FieldKind::String)
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
    pub fn to_dict(&self) -> serde_json::Value {
        serde_json::json!({
            "vehicle_id": self.vehicle_id,
            "vehicle_name": self.vehicle_name,
            "vehicle_type": self.vehicle_type,
            "vehicle_number": self.vehicle_number,
            "vehicle_model": self.vehicle_model,
            "vehicle_color": self.vehicle_color,
        })
    }
}
