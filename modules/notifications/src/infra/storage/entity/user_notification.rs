use std::sync::OnceLock;

use crudkit_db::{FieldKind, FieldMap, ManagedEntity};
use sea_orm::entity::prelude::*;
use serde::Serialize;

/// Delivery of one notification to one user.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "user_notification_mapping")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_notification_id: String,
    pub user_id: String,
    pub notification_id: String,
    pub is_read: bool,
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
    const PRIMARY_KEY: &'static str = "user_notification_id";

    fn field_map() -> &'static FieldMap<Self> {
        static MAP: OnceLock<FieldMap<Entity>> = OnceLock::new();
        MAP.get_or_init(|| {
            FieldMap::new()
                .insert("user_notification_id", Column::UserNotificationId, FieldKind::String)
                .insert("user_id", Column::UserId, FieldKind::String)
                .insert("notification_id", Column::NotificationId, FieldKind::String)
                .insert("is_read", Column::IsRead, FieldKind::Bool)
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
            "user_id": self.user_id,
            "is_read": self.is_read,
            "notification_id": self.notification_id,
            "user_notification_id": self.user_notification_id,
        })
    }
}
