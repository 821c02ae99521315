use std::sync::OnceLock;

use crudkit::{full_name, title_case};
use crudkit_db::{FieldKind, FieldMap, ManagedEntity};
use sea_orm::entity::prelude::*;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "auth_users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub profile_photo: Option<String>,
    /// Argon2 PHC string.
    #[serde(skip_serializing)]
    pub password: Option<String>,
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
    const PRIMARY_KEY: &'static str = "user_id";

    fn field_map() -> &'static FieldMap<Self> {
        static MAP: OnceLock<FieldMap<Entity>> = OnceLock::new();
        MAP.get_or_init(|| {
            FieldMap::new()
                .insert("user_id", Column::UserId, FieldKind::String)
                .insert("email", Column::Email, FieldKind::String)
                .insert_nullable("first_name", Column::FirstName, FieldKind::String)
                .insert_nullable("last_name", Column::LastName, FieldKind::String)
                .insert_nullable("phone_number", Column::PhoneNumber, FieldKind::String)
                .insert_nullable("profile_photo", Column::ProfilePhoto, FieldKind::String)
                .insert_nullable("password", Column::Password, FieldKind::String)
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
            "email": self.email,
            "user_id": self.user_id,
            "phone_number": self.phone_number,
            "profile_photo": self.profile_photo,
            "first_name": title_case(self.first_name.as_deref().unwrap_or_default()),
            "last_name": title_case(self.last_name.as_deref().unwrap_or_default()),
            "full_name": self.full_name(),
        })
    }
}
