use std::sync::OnceLock;

use crudkit_db::{FieldKind, FieldMap, ManagedEntity};
use sea_orm::entity::prelude::*;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "notification")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub notification_id: String,
    pub title: Option<String>,
    pub message: Option<String>,
    pub notification_data: Option<Json>,
    /// One of [`NotificationType`].
    pub notification_type: String,
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
    const PRIMARY_KEY: &'static str = "notification_id";

    fn field_map() -> &'static FieldMap<Self> {
        static MAP: OnceLock<FieldMap<Entity>> = OnceLock::new();
        MAP.get_or_init(|| {
            FieldMap::new()
                .insert("notification_id", Column::NotificationId, FieldKind::String)
                .insert_nullable("title", Column::Title, FieldKind::String)
                .insert_nullable("message", Column::Message, FieldKind::String)
                .insert_nullable("notification_data", Column::NotificationData, FieldKind::Json)
                .insert("notification_type", Column::NotificationType, FieldKind::String)
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

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationType {
    Invoice,
    Payment,
}

impl NotificationType {
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationType::Invoice => "INVOICE",
            NotificationType::Payment => "PAYMENT",
        }
    }
}

impl Model {
    pub fn to_dict(&self) -> serde_json::Value {
        serde_json::json!({
            "title": self.title,
            "message": self.message,
            "notification_id": self.notification_id,
            "notification_data": self.notification_data,
            "notification_type": self.notification_type,
        })
    }
}
