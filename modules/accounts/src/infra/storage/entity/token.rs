use std::sync::OnceLock;

use crudkit_db::{FieldKind, FieldMap, ManagedEntity};
use sea_orm::entity::prelude::*;
use serde::Serialize;

/// Login session token. Rows are removed on logout and on the next login.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "token")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub token: String,
    pub user_id: String,
    pub created_dtm: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl ManagedEntity for Entity {
    type Active = ActiveModel;
    const PRIMARY_KEY: &'static str = "token";
    const TRACKS_SOFT_DELETE: bool = false;

    fn field_map() -> &'static FieldMap<Self> {
        static MAP: OnceLock<FieldMap<Entity>> = OnceLock::new();
        MAP.get_or_init(|| {
            FieldMap::new()
                .insert("token", Column::Token, FieldKind::String)
                .insert("user_id", Column::UserId, FieldKind::String)
                .insert("created_dtm", Column::CreatedDtm, FieldKind::DateTimeUtc)
        })
    }
}

impl Model {
    pub fn to_dict(&self) -> serde_json::Value {
        serde_json::json!({
            "token": self.token,
            "created_dtm": self.created_dtm,
        })
    }
}
